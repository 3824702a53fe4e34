//! Configuration module for usbswitchd.
//!
//! TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `USBSWITCHD_CONFIG` environment variable (explicit path)
//! 2. `./usbswitchd.toml` (current directory)
//! 3. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! Scalar values can be overridden via environment variables with the
//! pattern `USBSWITCHD_<SECTION>_<KEY>`:
//! - `USBSWITCHD_SERVER_PORT=8080`
//! - `USBSWITCHD_SERIAL_DEVICE=/dev/ttyUSB1`
//! - `USBSWITCHD_SWITCH_RESPONSE_DEADLINE_MS=5000`

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{resolve_config_path, ConfigLoader};
pub use schema::{Config, SerialConfig, ServerConfig, SwitchConfig};
