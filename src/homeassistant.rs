//! Home Assistant REST API client
//!
//! The inverter is reached through a Home Assistant instance: sensor
//! entities expose PV power and battery SoC, a select entity carries the
//! work mode and a switch entity the export limit. This module implements
//! the device-facing collaborator traits on top of that REST surface.

use crate::collaborators::{DeviceStateReader, ExportLimitCommander, WorkModeCommander};
use crate::config::HomeAssistantConfig;
use crate::engine::{DeviceSnapshot, WorkMode};
use crate::error::{GridpilotError, Result};
use crate::logging::get_logger;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

/// Home Assistant REST API client
#[derive(Clone)]
pub struct HaClient {
    base_url: String,
    token: String,
    entities: EntityIds,
    client: reqwest::Client,
    logger: crate::logging::StructuredLogger,
}

#[derive(Debug, Clone)]
struct EntityIds {
    pv_sensor: String,
    battery_soc_sensor: String,
    work_mode_selector: String,
    export_limit_switch: String,
}

#[derive(Debug, Deserialize)]
struct EntityState {
    state: String,
}

impl HaClient {
    /// Create a new client from configuration
    pub fn new(config: &HomeAssistantConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            entities: EntityIds {
                pv_sensor: config.pv_sensor.clone(),
                battery_soc_sensor: config.battery_soc_sensor.clone(),
                work_mode_selector: config.work_mode_selector.clone(),
                export_limit_switch: config.export_limit_switch.clone(),
            },
            client,
            logger: get_logger("homeassistant"),
        })
    }

    /// Read a raw entity state string; `None` when the entity is missing,
    /// unreachable or reports itself unavailable.
    async fn entity_state(&self, entity_id: &str) -> Option<String> {
        let url = format!("{}/api/states/{}", self.base_url, entity_id);
        let response = match self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                self.logger
                    .warn(&format!("Failed to read {}: {}", entity_id, e));
                return None;
            }
        };

        match response.status() {
            StatusCode::OK => match response.json::<EntityState>().await {
                Ok(entity) if is_available(&entity.state) => Some(entity.state),
                Ok(_) => None,
                Err(e) => {
                    self.logger
                        .warn(&format!("Bad state payload for {}: {}", entity_id, e));
                    None
                }
            },
            status => {
                self.logger
                    .warn(&format!("Entity {} returned status {}", entity_id, status));
                None
            }
        }
    }

    /// Invoke a Home Assistant service call with a JSON payload
    async fn call_service(
        &self,
        domain: &str,
        service: &str,
        payload: serde_json::Value,
    ) -> Result<()> {
        let url = format!("{}/api/services/{}/{}", self.base_url, domain, service);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GridpilotError::command(format!(
                "{}.{} returned status {}",
                domain,
                service,
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceStateReader for HaClient {
    async fn read_state(&self) -> Result<DeviceSnapshot> {
        let pv = self.entity_state(&self.entities.pv_sensor).await;
        let soc = self.entity_state(&self.entities.battery_soc_sensor).await;
        let mode = self.entity_state(&self.entities.work_mode_selector).await;
        let export = self.entity_state(&self.entities.export_limit_switch).await;

        Ok(DeviceSnapshot {
            pv_power_w: parse_watts(pv.as_deref()),
            battery_soc: parse_soc(soc.as_deref()),
            work_mode: mode.as_deref().and_then(WorkMode::from_label),
            export_limit_active: export.as_deref() == Some("on"),
        })
    }
}

#[async_trait]
impl WorkModeCommander for HaClient {
    async fn set_work_mode(&self, mode: WorkMode) -> Result<()> {
        self.logger
            .info(&format!("Setting work mode to '{}'", mode.as_str()));
        self.call_service(
            "select",
            "select_option",
            serde_json::json!({
                "entity_id": self.entities.work_mode_selector,
                "option": mode.as_str(),
            }),
        )
        .await
    }
}

#[async_trait]
impl ExportLimitCommander for HaClient {
    async fn set_export_limit(&self, active: bool) -> Result<()> {
        let service = if active { "turn_on" } else { "turn_off" };
        self.logger.info(&format!(
            "{} export limit",
            if active { "Activating" } else { "Deactivating" }
        ));
        self.call_service(
            "switch",
            service,
            serde_json::json!({ "entity_id": self.entities.export_limit_switch }),
        )
        .await
    }
}

fn is_available(state: &str) -> bool {
    !matches!(state, "unavailable" | "unknown")
}

/// PV power sensor value; unavailable maps to 0 W (treated as idle PV)
fn parse_watts(state: Option<&str>) -> u32 {
    state
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|w| w.is_finite() && *w >= 0.0)
        .map_or(0, |w| w.round() as u32)
}

/// Battery SoC sensor value; unavailable maps to 100 % (treated as full)
fn parse_soc(state: Option<&str>) -> u8 {
    state
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|p| p.is_finite())
        .map_or(100, |p| p.clamp(0.0, 100.0).round() as u8)
}
