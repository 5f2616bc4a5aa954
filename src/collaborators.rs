//! Collaborator interfaces for the control loop
//!
//! The driver talks to the outside world through these four traits so every
//! external dependency can be mocked independently in tests: the pricing
//! API, the device state sensors, and the two command surfaces.

use crate::engine::{DeviceSnapshot, WorkMode};
use crate::error::Result;
use crate::prices::PriceForecast;
use async_trait::async_trait;

/// Source of hourly price forecasts
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch today's (and, when published, tomorrow's) hourly prices.
    ///
    /// Transport and malformed-response failures are returned as errors;
    /// both are non-fatal to the driver, which keeps its previous forecast.
    async fn fetch_prices(&self) -> Result<PriceForecast>;
}

/// Reader for the current device state
#[async_trait]
pub trait DeviceStateReader: Send + Sync {
    /// Read a fresh snapshot of PV power, battery SoC, work mode and the
    /// export limit switch. Unavailable sensors map to the snapshot
    /// defaults, not to errors.
    async fn read_state(&self) -> Result<DeviceSnapshot>;
}

/// Command surface for the inverter work mode
#[async_trait]
pub trait WorkModeCommander: Send + Sync {
    async fn set_work_mode(&self, mode: WorkMode) -> Result<()>;
}

/// Command surface for the grid export limit switch
#[async_trait]
pub trait ExportLimitCommander: Send + Sync {
    async fn set_export_limit(&self, active: bool) -> Result<()>;
}
