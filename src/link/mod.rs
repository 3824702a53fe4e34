//! Serial transport layer.
//!
//! `SwitchSession` talks to the device exclusively through the
//! [`SerialLink`] trait, so the protocol logic can be exercised against
//! [`MockLink`] without hardware.

mod error;
mod mock;
mod serial;
mod traits;

pub use error::LinkError;
pub use mock::MockLink;
pub use serial::SerialPortLink;
pub use traits::{LinkConfig, SerialLink};
