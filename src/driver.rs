//! Control loop driver for Gridpilot
//!
//! Owns the once-per-minute cycle: refresh prices on the hour, read the
//! device state, run the decision engine and issue commands only where the
//! device differs from the target.

use crate::collaborators::{
    DeviceStateReader, ExportLimitCommander, PriceSource, WorkModeCommander,
};
use crate::config::Config;
use crate::engine;
use crate::error::Result;
use crate::logging::get_logger;
use crate::prices::{PriceForecast, PriceWindow};
use chrono::{Local, NaiveDateTime, Timelike};
use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior, interval};

/// Wall-clock minute at which the hourly price refresh runs
const REFRESH_MINUTE: u32 = 1;

/// Handle for requesting a driver shutdown from another task
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: mpsc::UnboundedSender<()>,
}

impl ShutdownHandle {
    /// Request shutdown; safe to call more than once. A cycle already in
    /// flight finishes before the loop exits.
    pub fn request_shutdown(&self) {
        self.tx.send(()).ok();
    }
}

/// Main control loop driver
pub struct ChargeDriver {
    config: Config,
    price_source: Box<dyn PriceSource>,
    device_state: Box<dyn DeviceStateReader>,
    work_mode: Box<dyn WorkModeCommander>,
    export_limit: Box<dyn ExportLimitCommander>,

    /// Last successfully fetched forecast; kept across failed refreshes
    forecast: Option<PriceForecast>,

    logger: crate::logging::StructuredLogger,
    shutdown_tx: mpsc::UnboundedSender<()>,
    shutdown_rx: mpsc::UnboundedReceiver<()>,
}

impl ChargeDriver {
    /// Create a new driver over the given collaborators
    pub fn new(
        config: Config,
        price_source: Box<dyn PriceSource>,
        device_state: Box<dyn DeviceStateReader>,
        work_mode: Box<dyn WorkModeCommander>,
        export_limit: Box<dyn ExportLimitCommander>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();
        Self {
            config,
            price_source,
            device_state,
            work_mode,
            export_limit,
            forecast: None,
            logger: get_logger("driver"),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Handle for requesting shutdown from another task
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Configuration reference
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The currently retained forecast, if any fetch has ever succeeded
    pub fn forecast(&self) -> Option<&PriceForecast> {
        self.forecast.as_ref()
    }

    /// Run the control loop until shutdown is requested.
    ///
    /// The first tick fires immediately (the startup cycle always refreshes
    /// prices); afterwards the loop ticks at the configured interval. Cycles
    /// never overlap: a tick is only processed after the previous cycle has
    /// completed.
    pub async fn run(&mut self) -> Result<()> {
        self.logger.info("Starting control loop");

        let mut ticker = interval(Duration::from_secs(self.config.cycle_interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut startup = true;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let now = Local::now().naive_local();
                    self.cycle(startup, now).await;
                    startup = false;
                }
                _ = self.shutdown_rx.recv() => {
                    self.logger.info("Shutdown signal received");
                    break;
                }
            }
        }

        self.logger.info("Control loop stopped");
        Ok(())
    }

    /// Execute one control cycle at the given instant.
    ///
    /// No error is fatal here: a failed price refresh keeps the previous
    /// forecast, a cycle without any forecast is a no-op, and command
    /// failures are logged and re-evaluated fresh next cycle.
    pub async fn cycle(&mut self, startup: bool, now: NaiveDateTime) {
        if should_refresh(startup, now.minute()) {
            match self.price_source.fetch_prices().await {
                Ok(forecast) => {
                    self.logger.info(&format!(
                        "Price forecast updated: {} today, {} tomorrow",
                        forecast.today.len(),
                        forecast.tomorrow.len()
                    ));
                    self.forecast = Some(forecast);
                }
                Err(e) => {
                    self.logger.warn(&format!(
                        "Price refresh failed, keeping previous forecast: {}",
                        e
                    ));
                }
            }
        }

        let Some(forecast) = &self.forecast else {
            self.logger
                .warn("No price data available yet, skipping cycle");
            return;
        };

        let snapshot = match self.device_state.read_state().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.logger
                    .error(&format!("Failed to read device state: {}", e));
                return;
            }
        };

        let window = PriceWindow::normalize(forecast, now);
        let is_cheap = window.is_cheap_hour(now, self.config.charging.charge_hours);
        let target = engine::decide(is_cheap, &snapshot, self.config.charging.pv_threshold_watts);
        let plan = engine::plan(target, &snapshot);

        self.logger.debug(&format!(
            "cheap={} soc={} pv={}W mode={:?} export={} -> target mode={} export={}",
            is_cheap,
            snapshot.battery_soc,
            snapshot.pv_power_w,
            snapshot.work_mode,
            snapshot.export_limit_active,
            target.work_mode.as_str(),
            target.export_limit,
        ));

        if let Some(mode) = plan.set_mode
            && let Err(e) = self.work_mode.set_work_mode(mode).await
        {
            self.logger
                .error(&format!("Failed to set work mode: {}", e));
        }

        if let Some(active) = plan.set_export_limit
            && let Err(e) = self.export_limit.set_export_limit(active).await
        {
            self.logger
                .error(&format!("Failed to set export limit: {}", e));
        }
    }
}

/// Whether this cycle should refresh the price forecast: always at startup,
/// otherwise only at the fixed refresh minute of each hour.
fn should_refresh(startup: bool, minute: u32) -> bool {
    startup || minute == REFRESH_MINUTE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_on_startup_and_refresh_minute_only() {
        assert!(should_refresh(true, 30));
        assert!(should_refresh(false, 1));
        assert!(!should_refresh(false, 0));
        assert!(!should_refresh(false, 2));
        assert!(!should_refresh(false, 59));
    }
}
