//! Core trait for the serial transport.
//!
//! Defines the `SerialLink` trait that allows the real device and mock
//! implementations to be used interchangeably by `SwitchSession`.

use super::error::LinkError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Parameters for opening the serial link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Per-read timeout. The protocol layer polls for available bytes, so
    /// this only bounds individual read calls, not a whole exchange.
    pub read_timeout: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            baud_rate: 38_400,
            read_timeout: Duration::from_millis(100),
        }
    }
}

/// Trait for the byte-level operations the switch protocol needs.
///
/// This deliberately covers only what the device vocabulary requires; it is
/// not a general-purpose serial abstraction.
pub trait SerialLink: Send + std::fmt::Debug {
    /// Write bytes to the device. Returns the number of bytes written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, LinkError>;

    /// Read bytes from the device into the provided buffer.
    ///
    /// Returns the number of bytes actually read.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, LinkError>;

    /// Number of bytes currently buffered from the device.
    ///
    /// This is the poll the protocol layer spins on between bursts, so a
    /// transport failure here (device unplugged mid-exchange) must surface
    /// as an error, not as "no data yet".
    fn bytes_to_read(&self) -> Result<usize, LinkError>;

    /// Discard any unread bytes buffered from the device.
    ///
    /// The protocol drains stale input before every exchange; output is
    /// never cleared.
    fn clear_input(&mut self) -> Result<(), LinkError>;

    /// The device path or identifier of this link.
    fn name(&self) -> &str;
}
