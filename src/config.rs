//! Configuration management for Gridpilot
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files.

use crate::error::{GridpilotError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tibber API configuration for hourly price data
    pub tibber: TibberConfig,

    /// Home Assistant connection and entity mapping
    pub home_assistant: HomeAssistantConfig,

    /// Charging policy configuration
    pub charging: ChargingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Control loop tick interval in seconds
    pub cycle_interval_secs: u64,
}

/// Tibber API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TibberConfig {
    /// Tibber API access token
    pub access_token: String,

    /// GraphQL endpoint URL
    pub api_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Home Assistant connection parameters and entity identities
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeAssistantConfig {
    /// Base URL of the Home Assistant instance
    pub base_url: String,

    /// Long-lived access token
    pub token: String,

    /// PV power sensor entity id (Watts)
    pub pv_sensor: String,

    /// Battery state-of-charge sensor entity id (percent)
    pub battery_soc_sensor: String,

    /// Work mode select entity id
    pub work_mode_selector: String,

    /// Export limit switch entity id
    pub export_limit_switch: String,
}

/// Charging policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargingConfig {
    /// How many of the cheapest hours in the price window count as chargeable
    pub charge_hours: u32,

    /// PV output at or below this level counts as negligible (Watts)
    pub pv_threshold_watts: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Path to log file (or directory for daily rotation)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Default for TibberConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            api_url: "https://api.tibber.com/v1-beta/gql".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for HomeAssistantConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8123".to_string(),
            token: String::new(),
            pv_sensor: "sensor.pv_power".to_string(),
            battery_soc_sensor: "sensor.battery_state_of_charge".to_string(),
            work_mode_selector: "select.inverter_work_mode".to_string(),
            export_limit_switch: "switch.grid_export_limit".to_string(),
        }
    }
}

impl Default for ChargingConfig {
    fn default() -> Self {
        Self {
            charge_hours: 3,
            pv_threshold_watts: 50,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/gridpilot.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tibber: TibberConfig::default(),
            home_assistant: HomeAssistantConfig::default(),
            charging: ChargingConfig::default(),
            logging: LoggingConfig::default(),
            cycle_interval_secs: 60,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default locations
    pub fn load() -> Result<Self> {
        let default_paths = [
            "gridpilot_config.yaml",
            "/data/gridpilot_config.yaml",
            "/etc/gridpilot/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    ///
    /// A failure here is fatal at startup; the control loop must not start
    /// with unresolvable collaborator identities.
    pub fn validate(&self) -> Result<()> {
        if self.tibber.access_token.trim().is_empty() {
            return Err(GridpilotError::validation(
                "tibber.access_token",
                "Access token cannot be empty",
            ));
        }

        if self.home_assistant.base_url.is_empty() {
            return Err(GridpilotError::validation(
                "home_assistant.base_url",
                "Base URL cannot be empty",
            ));
        }

        for (field, value) in [
            ("home_assistant.pv_sensor", &self.home_assistant.pv_sensor),
            (
                "home_assistant.battery_soc_sensor",
                &self.home_assistant.battery_soc_sensor,
            ),
            (
                "home_assistant.work_mode_selector",
                &self.home_assistant.work_mode_selector,
            ),
            (
                "home_assistant.export_limit_switch",
                &self.home_assistant.export_limit_switch,
            ),
        ] {
            if value.is_empty() {
                return Err(GridpilotError::validation(
                    field,
                    "Entity id cannot be empty",
                ));
            }
        }

        if self.charging.charge_hours == 0 {
            return Err(GridpilotError::validation(
                "charging.charge_hours",
                "Must be greater than 0",
            ));
        }

        if self.cycle_interval_secs == 0 {
            return Err(GridpilotError::validation(
                "cycle_interval_secs",
                "Must be greater than 0",
            ));
        }

        Ok(())
    }
}
