//! Command vocabulary and response parsing for the USB switch.
//!
//! The device speaks a line-oriented, newline-terminated ASCII protocol
//! with no framing guarantee beyond "one status line starts with `PORT:`".
//! Two commands exist:
//!
//! | Direction | Command      | Response                                  |
//! |-----------|--------------|-------------------------------------------|
//! | → device  | `info\n`     | arbitrary lines; one matches `PORT:<id>`  |
//! | → device  | `sw p<id>\n` | none; re-issue `info` to confirm          |

use serde::{Deserialize, Serialize};

/// Prefix of the status line in an `info` response.
const PORT_PREFIX: &str = "PORT:";

/// Two-digit identifier of one physical output of the switch.
///
/// Constructing a `PortId` does not check membership in the configured
/// port set; that check belongs to [`SwitchSession`](crate::SwitchSession),
/// because the valid set is configuration, not protocol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortId(String);

impl PortId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PortId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// The command that asks the device for its status.
pub fn query_command() -> &'static [u8] {
    b"info\n"
}

/// The command that switches the device to `target`.
pub fn switch_command(target: &PortId) -> Vec<u8> {
    format!("sw p{}\n", target).into_bytes()
}

/// Split one burst of device bytes into lines.
///
/// Collection stops after the first `PORT:`-prefixed line; bytes already
/// read in the burst stay consumed either way. The device is all-ASCII,
/// so lossy decoding never mangles a well-formed status line.
pub fn split_burst(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    let mut lines = Vec::new();
    for line in text.split('\n') {
        if line.is_empty() {
            continue;
        }
        lines.push(line.to_string());
        if line.starts_with(PORT_PREFIX) {
            break;
        }
    }
    lines
}

/// Extract the reported port from accumulated response lines.
///
/// The first line with prefix `PORT:` wins; the token after the first
/// colon, trimmed of surrounding whitespace (including `\r`), is the id.
pub fn parse_port_report(lines: &[String]) -> Option<PortId> {
    for line in lines {
        if let Some(rest) = line.strip_prefix(PORT_PREFIX) {
            return Some(PortId::new(rest.trim()));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_commands() {
        assert_eq!(query_command(), b"info\n");
        assert_eq!(switch_command(&PortId::from("03")), b"sw p03\n");
    }

    #[test]
    fn test_parse_with_carriage_return() {
        let lines = split_burst(b"PORT:04\r\n");
        assert_eq!(parse_port_report(&lines), Some(PortId::from("04")));
    }

    #[test]
    fn test_parse_without_trailing_whitespace() {
        let lines = vec!["PORT:04".to_string()];
        assert_eq!(parse_port_report(&lines), Some(PortId::from("04")));
    }

    #[test]
    fn test_parse_skips_banner_lines() {
        let lines = split_burst(b"DEVICE:USB-SW\r\nFW:1.2\r\nPORT:02\r\n");
        assert_eq!(parse_port_report(&lines), Some(PortId::from("02")));
    }

    #[test]
    fn test_parse_no_port_line() {
        let lines = split_burst(b"DEVICE:USB-SW\r\nOK\r\n");
        assert_eq!(parse_port_report(&lines), None);
    }

    #[test]
    fn test_burst_stops_after_port_line() {
        let lines = split_burst(b"PORT:01\r\ngarbage after status\r\n");
        assert_eq!(lines, vec!["PORT:01\r".to_string()]);
    }

    #[test]
    fn test_parse_trims_inner_whitespace() {
        let lines = vec!["PORT: 03 \r".to_string()];
        assert_eq!(parse_port_report(&lines), Some(PortId::from("03")));
    }

    #[test]
    fn test_first_port_line_wins() {
        let lines = vec!["PORT:01".to_string(), "PORT:02".to_string()];
        assert_eq!(parse_port_report(&lines), Some(PortId::from("01")));
    }
}
