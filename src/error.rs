//! Error types and handling for Gridpilot
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Result type alias for Gridpilot operations
pub type Result<T> = std::result::Result<T, GridpilotError>;

/// Main error type for Gridpilot
#[derive(Debug, Error)]
pub enum GridpilotError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Network-related errors (pricing API unreachable, timed out)
    #[error("Network error: {message}")]
    Network { message: String },

    /// API integration errors (response parsed but lacks expected fields)
    #[error("API error: {message}")]
    Api { message: String },

    /// Device command errors (a collaborator reported failure)
    #[error("Command error: {message}")]
    Command { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Timeout errors
    #[error("Timeout error: {message}")]
    Timeout { message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl GridpilotError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        GridpilotError::Config {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        GridpilotError::Network {
            message: message.into(),
        }
    }

    /// Create a new API error
    pub fn api<S: Into<String>>(message: S) -> Self {
        GridpilotError::Api {
            message: message.into(),
        }
    }

    /// Create a new command error
    pub fn command<S: Into<String>>(message: S) -> Self {
        GridpilotError::Command {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        GridpilotError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        GridpilotError::Io {
            message: message.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        GridpilotError::Timeout {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        GridpilotError::Generic {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for GridpilotError {
    fn from(err: std::io::Error) -> Self {
        GridpilotError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for GridpilotError {
    fn from(err: serde_yaml::Error) -> Self {
        GridpilotError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for GridpilotError {
    fn from(err: serde_json::Error) -> Self {
        GridpilotError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for GridpilotError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            GridpilotError::timeout(err.to_string())
        } else {
            GridpilotError::network(err.to_string())
        }
    }
}

impl From<chrono::ParseError> for GridpilotError {
    fn from(err: chrono::ParseError) -> Self {
        GridpilotError::validation("datetime", &err.to_string())
    }
}
