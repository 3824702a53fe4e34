//! Mock serial link for testing.
//!
//! Provides a `MockLink` that simulates the USB switch without hardware.
//! Supports raw read/write queues for parser-level tests and a scripted
//! device mode that behaves like the real switch: it answers `info` with a
//! `PORT:<id>` report and tracks the selected port across `sw p<id>`
//! commands. The scripted mode also counts exchange interleaving so
//! concurrency tests can assert that no two protocol exchanges overlap on
//! the simulated wire.

use super::error::LinkError;
use super::traits::SerialLink;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Inner state of the mock link, protected by a mutex for interior mutability.
#[derive(Debug, Default)]
struct MockLinkState {
    /// Queue of bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Log of all byte sequences written to the link.
    write_log: Vec<Vec<u8>>,
    /// When Some, the mock acts as a scripted switch with this port selected.
    selected_port: Option<String>,
    /// Whether a command exchange is in flight (info written, response unread).
    exchange_open: bool,
    /// When true, availability checks fail as if the device vanished.
    available_fails: bool,
    /// Number of times a new exchange started before the previous one drained.
    interleave_violations: usize,
}

/// Mock serial link.
///
/// Clones share state, so a test can hold one handle while the session
/// under test owns another.
///
/// # Example
/// ```
/// use usbswitchd::link::{MockLink, SerialLink};
///
/// let mut link = MockLink::new("MOCK0");
/// link.enqueue_read(b"PORT:02\r\n");
///
/// let mut buffer = [0u8; 16];
/// let n = link.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"PORT:02\r\n");
/// ```
#[derive(Clone)]
pub struct MockLink {
    /// The link name/identifier.
    name: String,
    /// The internal state, wrapped in Arc<Mutex<>> so clones share it.
    state: Arc<Mutex<MockLinkState>>,
}

impl MockLink {
    /// Create a new mock link with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockLinkState::default())),
        }
    }

    /// Create a mock that behaves like the real switch with `port` selected.
    pub fn scripted(name: impl Into<String>, port: &str) -> Self {
        let link = Self::new(name);
        link.set_selected_port(port);
        link
    }

    /// Enqueue bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&self, data: &[u8]) {
        let mut state = self.state.lock().unwrap();
        state.read_queue.extend(data);
    }

    /// Get a copy of all data written to the link.
    pub fn write_log(&self) -> Vec<Vec<u8>> {
        let state = self.state.lock().unwrap();
        state.write_log.clone()
    }

    /// Total number of bytes written to the link.
    pub fn bytes_written(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.write_log.iter().map(Vec::len).sum()
    }

    /// Enable (or change) scripted device mode with the given selected port.
    ///
    /// Enabling mid-test simulates a device that starts responding late.
    pub fn set_selected_port(&self, port: &str) {
        let mut state = self.state.lock().unwrap();
        state.selected_port = Some(port.to_string());
    }

    /// The port the scripted device currently has selected, if scripted.
    pub fn selected_port(&self) -> Option<String> {
        let state = self.state.lock().unwrap();
        state.selected_port.clone()
    }

    /// Make subsequent availability checks fail, simulating a device that
    /// disappeared mid-exchange.
    pub fn set_available_fails(&self, fail: bool) {
        let mut state = self.state.lock().unwrap();
        state.available_fails = fail;
    }

    /// Number of exchanges that started while a previous one was still
    /// in flight. Zero means all exchanges were serialized on the wire.
    pub fn interleave_violations(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.interleave_violations
    }

    /// Number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.read_queue.len()
    }
}

impl SerialLink for MockLink {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, LinkError> {
        let mut state = self.state.lock().unwrap();
        state.write_log.push(data.to_vec());

        if let Some(selected) = state.selected_port.clone() {
            if data == b"info\n" {
                if state.exchange_open {
                    state.interleave_violations += 1;
                }
                state.exchange_open = true;
                // The real device emits a short banner before the status line.
                state.read_queue.extend(b"DEVICE:USB-SW\r\n");
                state
                    .read_queue
                    .extend(format!("PORT:{}\r\n", selected).bytes());
            } else if let Some(rest) = data.strip_prefix(b"sw p") {
                let id = String::from_utf8_lossy(rest).trim().to_string();
                state.selected_port = Some(id);
            }
        }

        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, LinkError> {
        let mut state = self.state.lock().unwrap();

        let mut bytes_read = 0;
        for byte in buffer.iter_mut() {
            if let Some(queued) = state.read_queue.pop_front() {
                *byte = queued;
                bytes_read += 1;
            } else {
                break;
            }
        }

        if state.read_queue.is_empty() {
            state.exchange_open = false;
        }

        if bytes_read == 0 {
            Err(LinkError::Io(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "no data available",
            )))
        } else {
            Ok(bytes_read)
        }
    }

    fn bytes_to_read(&self) -> Result<usize, LinkError> {
        let state = self.state.lock().unwrap();
        if state.available_fails {
            return Err(LinkError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "device disconnected",
            )));
        }
        Ok(state.read_queue.len())
    }

    fn clear_input(&mut self) -> Result<(), LinkError> {
        let mut state = self.state.lock().unwrap();
        state.read_queue.clear();
        state.exchange_open = false;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for MockLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockLink")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_and_read() {
        let mut link = MockLink::new("MOCK0");
        link.enqueue_read(b"hello");

        let mut buffer = [0u8; 10];
        let n = link.read_bytes(&mut buffer).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buffer[..n], b"hello");
    }

    #[test]
    fn test_write_logging() {
        let mut link = MockLink::new("MOCK0");
        link.write_bytes(b"info\n").unwrap();
        link.write_bytes(b"sw p02\n").unwrap();

        let log = link.write_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], b"info\n");
        assert_eq!(log[1], b"sw p02\n");
        assert_eq!(link.bytes_written(), 12);
    }

    #[test]
    fn test_empty_read_would_block() {
        let mut link = MockLink::new("MOCK0");
        let mut buffer = [0u8; 10];

        let result = link.read_bytes(&mut buffer);
        match result {
            Err(LinkError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::WouldBlock),
            other => panic!("Expected WouldBlock error, got: {:?}", other),
        }
    }

    #[test]
    fn test_clear_input() {
        let mut link = MockLink::new("MOCK0");
        link.enqueue_read(b"stale data");

        link.clear_input().unwrap();
        assert_eq!(link.available_bytes(), 0);
    }

    #[test]
    fn test_scripted_info_reports_selected_port() {
        let mut link = MockLink::scripted("MOCK0", "03");
        link.write_bytes(b"info\n").unwrap();

        let mut buffer = [0u8; 64];
        let n = link.read_bytes(&mut buffer).unwrap();
        let response = String::from_utf8_lossy(&buffer[..n]).to_string();
        assert!(response.contains("PORT:03\r\n"));
    }

    #[test]
    fn test_scripted_switch_updates_selection() {
        let mut link = MockLink::scripted("MOCK0", "01");
        link.write_bytes(b"sw p04\n").unwrap();
        assert_eq!(link.selected_port().as_deref(), Some("04"));
    }

    #[test]
    fn test_interleave_detection() {
        let mut link = MockLink::scripted("MOCK0", "01");

        // Second info before the first response is drained is a violation.
        link.write_bytes(b"info\n").unwrap();
        link.write_bytes(b"info\n").unwrap();
        assert_eq!(link.interleave_violations(), 1);

        // Draining the queue closes the exchange.
        let mut buffer = [0u8; 256];
        while link.available_bytes() > 0 {
            link.read_bytes(&mut buffer).unwrap();
        }
        link.write_bytes(b"info\n").unwrap();
        assert_eq!(link.interleave_violations(), 1);
    }

    #[test]
    fn test_available_check_can_fail() {
        let link = MockLink::new("MOCK0");
        link.enqueue_read(b"PORT:02\r\n");
        assert_eq!(link.bytes_to_read().unwrap(), 9);

        link.set_available_fails(true);
        let result = link.bytes_to_read();
        match result {
            Err(LinkError::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe),
            other => panic!("Expected BrokenPipe error, got: {:?}", other),
        }
    }

    #[test]
    fn test_partial_read() {
        let mut link = MockLink::new("MOCK0");
        link.enqueue_read(b"PORT:02\r\n");

        let mut buffer = [0u8; 4];
        let n = link.read_bytes(&mut buffer).unwrap();
        assert_eq!(n, 4);
        assert_eq!(&buffer[..n], b"PORT");
        assert_eq!(link.available_bytes(), 5);
    }
}
