//! Link-specific error types.
//!
//! Transport-level failures are kept separate from protocol-level failures
//! (`SwitchError`) so the session layer can decide what is retriable.

use thiserror::Error;

/// Errors that can occur on the serial transport.
#[derive(Debug, Error)]
pub enum LinkError {
    /// The configured serial device was not found on the system.
    #[error("Serial device not found: {0}")]
    NotFound(String),

    /// An I/O error occurred while reading or writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The device could not be opened with the requested parameters.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl LinkError {
    /// Create a NotFound error from a device path.
    pub fn not_found(device: impl Into<String>) -> Self {
        Self::NotFound(device.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
