//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! All sections are defined here with appropriate defaults; a missing file
//! yields a fully usable default configuration.

use crate::link::LinkConfig;
use crate::protocol::PortId;
use crate::session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Serial link configuration
    pub serial: SerialConfig,
    /// Switch protocol configuration
    pub switch: SwitchConfig,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port number for the HTTP server
    pub port: u16,
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            log_level: "info".to_string(),
        }
    }
}

/// Serial link configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path (e.g., "/dev/ttyUSB0" or "COM6")
    pub device: String,
    /// Baud rate
    pub baud: u32,
    /// Per-read timeout in milliseconds
    pub read_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            baud: 38_400,
            read_timeout_ms: 100,
        }
    }
}

impl SerialConfig {
    /// Link parameters derived from this section.
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            baud_rate: self.baud,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
        }
    }
}

/// Switch protocol configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchConfig {
    /// Valid port identifiers, in display order
    pub ports: Vec<String>,
    /// Sleep between response polls, in milliseconds
    pub poll_interval_ms: u64,
    /// Pause after a switch command before the confirming query, in ms
    pub settle_delay_ms: u64,
    /// Overall per-exchange deadline in ms; absent means wait indefinitely
    pub response_deadline_ms: Option<u64>,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            ports: ["01", "02", "03", "04"]
                .into_iter()
                .map(String::from)
                .collect(),
            poll_interval_ms: 10,
            settle_delay_ms: 100,
            response_deadline_ms: None,
        }
    }
}

impl SwitchConfig {
    /// Session parameters derived from this section.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            ports: self.ports.iter().map(|p| PortId::new(p.clone())).collect(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            response_deadline: self.response_deadline_ms.map(Duration::from_millis),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.serial.baud, 38_400);
        assert_eq!(config.switch.ports, vec!["01", "02", "03", "04"]);
        assert_eq!(config.switch.response_deadline_ms, None);
    }

    #[test]
    fn test_session_config_conversion() {
        let mut switch = SwitchConfig::default();
        switch.response_deadline_ms = Some(5000);

        let session = switch.session_config();
        assert_eq!(session.poll_interval, Duration::from_millis(10));
        assert_eq!(session.settle_delay, Duration::from_millis(100));
        assert_eq!(session.response_deadline, Some(Duration::from_secs(5)));
        assert_eq!(session.ports.len(), 4);
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [serial]
            device = "COM6"

            [switch]
            ports = ["01", "02"]
            "#,
        )
        .unwrap();

        assert_eq!(config.serial.device, "COM6");
        assert_eq!(config.serial.baud, 38_400);
        assert_eq!(config.switch.ports, vec!["01", "02"]);
        assert_eq!(config.server.port, 5000);
    }
}
