//! The switch session: exclusive owner of the serial link and sole
//! implementer of the device protocol.
//!
//! All concurrent callers funnel through one mutex. Each protocol
//! operation holds the lock for its entire write-then-read exchange, so
//! no two exchanges ever interleave bytes on the wire. The lock is never
//! held across separate operations or during HTTP-layer work.

use crate::link::{LinkError, SerialLink};
use crate::protocol::{self, PortId};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors returned by protocol operations.
#[derive(Debug, Error)]
pub enum SwitchError {
    /// The serial device never opened; no operation will succeed until
    /// the process restarts.
    #[error("Serial link unavailable")]
    LinkUnavailable,

    /// A transport-level read or write failed. Safe to retry.
    #[error("Serial I/O failed: {0}")]
    Io(#[from] LinkError),

    /// The device answered, but with no parseable `PORT:` line.
    #[error("Device reported no active port")]
    NoPortReported,

    /// The device produced no data within the configured deadline.
    #[error("No response from device within {0:?}")]
    ResponseTimeout(Duration),

    /// The requested port is not in the configured set. No I/O was
    /// performed.
    #[error("Invalid port '{0}', not in the configured port set")]
    InvalidPort(String),
}

/// Timing and validation parameters for the session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// The closed set of valid port identifiers.
    pub ports: Vec<PortId>,
    /// Sleep between polls while waiting for a response burst.
    pub poll_interval: Duration,
    /// Pause after a switch command before the confirming query.
    pub settle_delay: Duration,
    /// Overall per-exchange deadline. `None` waits indefinitely, which is
    /// how the device is driven in the field; set a deadline when a stuck
    /// device must not stall callers forever.
    pub response_deadline: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ports: ["01", "02", "03", "04"]
                .into_iter()
                .map(PortId::from)
                .collect(),
            poll_interval: Duration::from_millis(10),
            settle_delay: Duration::from_millis(100),
            response_deadline: None,
        }
    }
}

/// The shared serial session.
///
/// Constructed once at startup and handed to callers as an
/// `Arc<SwitchSession>`. If the device failed to open, the session is
/// constructed link-absent and every operation returns
/// [`SwitchError::LinkUnavailable`]; there is no automatic re-open.
pub struct SwitchSession {
    link: Mutex<Option<Box<dyn SerialLink>>>,
    config: SessionConfig,
}

impl SwitchSession {
    /// Create a session that owns the given link.
    pub fn new(link: Box<dyn SerialLink>, config: SessionConfig) -> Self {
        Self {
            link: Mutex::new(Some(link)),
            config,
        }
    }

    /// Create a session whose device never opened.
    pub fn link_absent(config: SessionConfig) -> Self {
        Self {
            link: Mutex::new(None),
            config,
        }
    }

    /// The configured port set, in configuration order.
    pub fn ports(&self) -> &[PortId] {
        &self.config.ports
    }

    /// Whether `id` is a member of the configured port set.
    pub fn is_valid_port(&self, id: &PortId) -> bool {
        self.config.ports.contains(id)
    }

    /// Ask the device which port is currently selected.
    pub fn query_port(&self) -> Result<PortId, SwitchError> {
        let mut guard = self.link.lock().unwrap_or_else(|e| e.into_inner());
        let link = guard.as_deref_mut().ok_or(SwitchError::LinkUnavailable)?;
        self.query_locked(link)
    }

    /// Switch the device to `target` and return the port it reports
    /// afterwards.
    ///
    /// The returned port is whatever the device says, even if it differs
    /// from `target`; detecting and surfacing a mismatch is the caller's
    /// contract. Targets outside the configured set fail with
    /// [`SwitchError::InvalidPort`] before any byte is written.
    pub fn switch_port(&self, target: &PortId) -> Result<PortId, SwitchError> {
        if !self.is_valid_port(target) {
            return Err(SwitchError::InvalidPort(target.to_string()));
        }

        let mut guard = self.link.lock().unwrap_or_else(|e| e.into_inner());
        let link = guard.as_deref_mut().ok_or(SwitchError::LinkUnavailable)?;

        let command = protocol::switch_command(target);
        link.write_bytes(&command)?;
        debug!(target = %target, "switch command sent");

        // Let the device apply the change before trusting a query.
        std::thread::sleep(self.config.settle_delay);

        // Read back under the same lock acquisition so no other caller
        // can slip an exchange between the write and the confirmation.
        self.query_locked(link)
    }

    /// One full query exchange against an already-locked link.
    fn query_locked(&self, link: &mut dyn SerialLink) -> Result<PortId, SwitchError> {
        // Stale bytes from a prior exchange must never leak into this one.
        link.clear_input()?;
        link.write_bytes(protocol::query_command())?;

        let deadline = self
            .config
            .response_deadline
            .map(|d| (Instant::now() + d, d));

        // The first burst that yields any line is trusted; the device
        // offers no minimum-byte or checksum guarantee to wait for.
        let mut lines: Vec<String> = Vec::new();
        loop {
            // A failing availability check means the transport is gone,
            // not that the device is quiet; bail out instead of spinning.
            let available = link.bytes_to_read()?;
            if available > 0 {
                let mut buffer = vec![0u8; available];
                let n = link.read_bytes(&mut buffer)?;
                for line in protocol::split_burst(&buffer[..n]) {
                    debug!(line = %line, "line read");
                    lines.push(line);
                }
            }
            if !lines.is_empty() {
                break;
            }
            if let Some((at, duration)) = deadline {
                if Instant::now() >= at {
                    warn!(?duration, "device did not respond before the deadline");
                    return Err(SwitchError::ResponseTimeout(duration));
                }
            }
            std::thread::sleep(self.config.poll_interval);
        }

        match protocol::parse_port_report(&lines) {
            Some(port) => {
                debug!(port = %port, "port retrieved");
                Ok(port)
            }
            None => {
                warn!(lines = ?lines, "response contained no PORT line");
                Err(SwitchError::NoPortReported)
            }
        }
    }
}

impl std::fmt::Debug for SwitchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitchSession")
            .field("ports", &self.config.ports)
            .field("response_deadline", &self.config.response_deadline)
            .finish()
    }
}
