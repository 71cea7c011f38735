//! Session configuration
//!
//! A [`SessionConfig`] can be built directly in code or loaded from a TOML
//! file. Validation happens once, inside [`Session::open`]
//! (via [`SessionConfig::validate`]); every field is fixed for the life of
//! the session.
//!
//! # Configuration File Format
//!
//! ```toml
//! [link]
//! device = "/dev/ttyUSB0"
//! baud_rate = 9600
//!
//! [protocol]
//! polling_mode = "passive"   # off | active | passive
//! poll_interval_ms = 100
//! checksum_mode = false
//! max_queue_size = 100
//! own_address = 7
//! multi_drop = true
//! poll_targets = [1, 2, 3]   # active mode only
//! ```
//!
//! [`Session::open`]: crate::Session::open

use crate::error::{Error, Result};
use crate::protocol::constants::{
    DEFAULT_BAUD_RATE, DEFAULT_MAX_QUEUE_SIZE, DEFAULT_POLL_INTERVAL_MS,
};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// How the session participates in XKISS polling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollingMode {
    /// No polling: transmit and dispatch immediately
    #[default]
    Off,
    /// Host is the bus master: poll the target addresses every interval
    Active,
    /// Host is a slave: buffer outbound data until the master polls us
    Passive,
}

/// Immutable per-session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Serial device path (e.g. "/dev/ttyUSB0")
    pub device: String,

    /// Serial baud rate
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default)]
    pub polling_mode: PollingMode,

    /// Interval between active-mode poll rounds
    ///
    /// **Must be > 0.** Only consulted in active mode.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Append (and verify) the 1-byte XOR checksum (Kantronics/BPQ style)
    #[serde(default)]
    pub checksum_mode: bool,

    /// Per-port queue capacity, passive mode. **Must be >= 1.** Overflow
    /// drops the oldest entry.
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,

    /// Our multi-drop TNC address (0-15)
    #[serde(default)]
    pub own_address: u8,

    /// Read the type-byte high nibble as a TNC address instead of a port.
    /// Forced on when polling is enabled.
    #[serde(default)]
    pub multi_drop: bool,

    /// Addresses the active poller cycles through
    #[serde(default = "default_poll_targets")]
    pub poll_targets: Vec<u8>,
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_max_queue_size() -> usize {
    DEFAULT_MAX_QUEUE_SIZE
}

fn default_poll_targets() -> Vec<u8> {
    (1..=15).collect()
}

impl SessionConfig {
    /// Configuration with defaults for the given device
    pub fn new(device: &str) -> Self {
        Self {
            device: device.to_string(),
            baud_rate: default_baud_rate(),
            polling_mode: PollingMode::Off,
            poll_interval_ms: default_poll_interval_ms(),
            checksum_mode: false,
            max_queue_size: default_max_queue_size(),
            own_address: 0,
            multi_drop: false,
            poll_targets: default_poll_targets(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Semantic validation; called by `Session::open` before any I/O
    pub fn validate(&self) -> Result<()> {
        if self.device.is_empty() {
            return Err(Error::InvalidConfig("device must not be empty".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::InvalidConfig(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }
        if self.max_queue_size == 0 {
            return Err(Error::InvalidConfig(
                "max_queue_size must be at least 1".to_string(),
            ));
        }
        if self.own_address > 0x0F {
            return Err(Error::InvalidAddress(self.own_address));
        }
        for &addr in &self.poll_targets {
            if addr == 0 || addr > 0x0F {
                return Err(Error::InvalidConfig(format!(
                    "poll target {} outside 1-15",
                    addr
                )));
            }
        }
        if self.polling_mode == PollingMode::Active && self.poll_targets.is_empty() {
            return Err(Error::InvalidConfig(
                "active polling requires at least one poll target".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .map_err(|e| Error::InvalidConfig(format!("Failed to read config: {}", e)))?;

        let file: FileConfig = basic_toml::from_str(&content)
            .map_err(|e| Error::InvalidConfig(format!("Failed to parse config: {}", e)))?;

        let protocol = file.protocol;
        let config = SessionConfig {
            device: file.link.device,
            baud_rate: file.link.baud_rate,
            polling_mode: protocol.polling_mode,
            poll_interval_ms: protocol.poll_interval_ms,
            checksum_mode: protocol.checksum_mode,
            max_queue_size: protocol.max_queue_size,
            own_address: protocol.own_address,
            multi_drop: protocol.multi_drop,
            poll_targets: protocol.poll_targets,
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Deserialize)]
struct FileConfig {
    link: LinkSection,
    #[serde(default)]
    protocol: ProtocolSection,
}

#[derive(Deserialize)]
struct LinkSection {
    device: String,
    #[serde(default = "default_baud_rate")]
    baud_rate: u32,
}

#[derive(Deserialize)]
struct ProtocolSection {
    #[serde(default)]
    polling_mode: PollingMode,
    #[serde(default = "default_poll_interval_ms")]
    poll_interval_ms: u64,
    #[serde(default)]
    checksum_mode: bool,
    #[serde(default = "default_max_queue_size")]
    max_queue_size: usize,
    #[serde(default)]
    own_address: u8,
    #[serde(default)]
    multi_drop: bool,
    #[serde(default = "default_poll_targets")]
    poll_targets: Vec<u8>,
}

impl Default for ProtocolSection {
    fn default() -> Self {
        Self {
            polling_mode: PollingMode::Off,
            poll_interval_ms: default_poll_interval_ms(),
            checksum_mode: false,
            max_queue_size: default_max_queue_size(),
            own_address: 0,
            multi_drop: false,
            poll_targets: default_poll_targets(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::new("/dev/ttyUSB0");
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.polling_mode, PollingMode::Off);
        assert_eq!(config.poll_interval_ms, 100);
        assert_eq!(config.max_queue_size, 100);
        assert_eq!(config.own_address, 0);
        assert!(!config.multi_drop);
        assert_eq!(config.poll_targets, (1..=15).collect::<Vec<u8>>());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = SessionConfig::new("/dev/ttyUSB0");
        config.poll_interval_ms = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = SessionConfig::new("/dev/ttyUSB0");
        config.max_queue_size = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = SessionConfig::new("/dev/ttyUSB0");
        config.own_address = 16;
        assert!(matches!(config.validate(), Err(Error::InvalidAddress(16))));

        let mut config = SessionConfig::new("/dev/ttyUSB0");
        config.poll_targets = vec![0];
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = SessionConfig::new("");
        config.device.clear();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            [link]
            device = "/dev/ttyS3"
            baud_rate = 19200

            [protocol]
            polling_mode = "passive"
            own_address = 7
            max_queue_size = 5
        "#;
        let file: FileConfig = basic_toml::from_str(toml).unwrap();
        assert_eq!(file.link.device, "/dev/ttyS3");
        assert_eq!(file.link.baud_rate, 19200);
        assert_eq!(file.protocol.polling_mode, PollingMode::Passive);
        assert_eq!(file.protocol.own_address, 7);
        assert_eq!(file.protocol.max_queue_size, 5);
        // Unspecified fields fall back to defaults
        assert_eq!(file.protocol.poll_interval_ms, 100);
    }

    #[test]
    fn test_parse_toml_minimal() {
        let toml = r#"
            [link]
            device = "/dev/ttyUSB0"
        "#;
        let file: FileConfig = basic_toml::from_str(toml).unwrap();
        assert_eq!(file.link.baud_rate, 9600);
        assert_eq!(file.protocol.polling_mode, PollingMode::Off);
    }
}
