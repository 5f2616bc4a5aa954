//! # Gridpilot - cheap-hour grid charging for home battery inverters
//!
//! A control daemon that charges a home battery from the grid during the
//! cheapest hours of the rolling two-day electricity price window, and
//! blocks or allows surplus export to the grid depending on battery state
//! and PV output.
//!
//! ## Architecture
//!
//! The application follows a modular architecture with clear separation of
//! concerns:
//!
//! - `config`: Configuration management and validation
//! - `logging`: Structured logging and tracing
//! - `prices`: Price series normalization and cheapest-hour selection
//! - `engine`: Pure charge/export decision logic
//! - `collaborators`: Trait seams for the pricing API and device surfaces
//! - `tibber`: Tibber GraphQL price source
//! - `homeassistant`: Home Assistant REST client for sensors and commands
//! - `driver`: The once-per-minute control loop

pub mod collaborators;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod homeassistant;
pub mod logging;
pub mod prices;
pub mod tibber;

// Re-export commonly used types
pub use config::Config;
pub use driver::ChargeDriver;
pub use error::{GridpilotError, Result};
