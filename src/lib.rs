//! usbswitchd library
//!
//! Controls a multi-port USB switch over a serial link and exposes its
//! state through a small web interface. The protocol core is
//! [`SwitchSession`]: a single shared serial session that serializes
//! concurrent access, issues line-oriented commands, and parses the
//! device's asynchronous responses.
//!
//! # Modules
//!
//! - `config`: TOML configuration with environment overrides
//! - `link`: serial transport abstraction (real device + mock)
//! - `protocol`: command vocabulary and response parsing
//! - `session`: the shared switch session (the protocol state machine)
//! - `rest_api`: axum handlers and the HTML control page
//! - `error`: HTTP-facing error handling

pub mod config;
pub mod error;
pub mod link;
pub mod protocol;
pub mod rest_api;
pub mod session;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
pub use error::{AppError, AppResult};
pub use link::{LinkConfig, LinkError, MockLink, SerialLink, SerialPortLink};
pub use protocol::PortId;
pub use session::{SessionConfig, SwitchError, SwitchSession};
