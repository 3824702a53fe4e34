//! Production serial link backed by the `serialport` crate.

use super::error::LinkError;
use super::traits::{LinkConfig, SerialLink};
use std::io::{Read, Write};

/// Serial link wrapping `serialport::SerialPort`.
pub struct SerialPortLink {
    /// The underlying serial port implementation.
    port: Box<dyn serialport::SerialPort>,
    /// The device path, kept for identification and logging.
    name: String,
}

impl SerialPortLink {
    /// Open the serial device with the given configuration.
    ///
    /// # Arguments
    /// * `device` - The system path to the device (e.g., "/dev/ttyUSB0" or "COM6")
    /// * `config` - Baud rate and read timeout
    pub fn open(device: &str, config: &LinkConfig) -> Result<Self, LinkError> {
        let port = serialport::new(device, config.baud_rate)
            .timeout(config.read_timeout)
            .open()
            .map_err(|e| match e.kind() {
                serialport::ErrorKind::NoDevice => LinkError::not_found(device),
                serialport::ErrorKind::InvalidInput => LinkError::config(e.to_string()),
                _ => LinkError::Serial(e),
            })?;

        Ok(Self {
            port,
            name: device.to_string(),
        })
    }
}

impl SerialLink for SerialPortLink {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, LinkError> {
        self.port.write(data).map_err(LinkError::Io)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, LinkError> {
        self.port.read(buffer).map_err(LinkError::Io)
    }

    fn bytes_to_read(&self) -> Result<usize, LinkError> {
        self.port
            .bytes_to_read()
            .map(|n| n as usize)
            .map_err(LinkError::Serial)
    }

    fn clear_input(&mut self) -> Result<(), LinkError> {
        self.port
            .clear(serialport::ClearBuffer::Input)
            .map_err(LinkError::Serial)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for SerialPortLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortLink")
            .field("name", &self.name)
            .field("baud_rate", &self.port.baud_rate())
            .finish()
    }
}
