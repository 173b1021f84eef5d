//! Configuration
//!
//! Settings for the serial link and the read loop. Every field has a
//! default, so a JSON config file only needs the keys it changes:
//!
//! ```json
//! { "serial": { "port": "/dev/ttyACM0", "baud_rate": 9600 },
//!   "session": { "max_records": 100 } }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::{ConfigError, DEFAULT_BAUD_RATE, DEFAULT_TIMEOUT_MS, MAX_LINE_LEN};

/// Serial link settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial port name
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Port-level read timeout in milliseconds
    pub timeout_ms: u64,
    /// Hold DTR high after opening
    pub assert_dtr: bool,
}

impl SerialConfig {
    /// Settings for `port` at `baud_rate`, defaults elsewhere
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            ..Self::default()
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            assert_dtr: true,
        }
    }
}

/// Read loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long a single read may block, in milliseconds
    pub read_timeout_ms: u64,
    /// Size of the read buffer
    pub chunk_size: usize,
    /// Limit on a pending, unterminated line
    pub max_line_len: usize,
    /// Stop after this many reads (including idle ones)
    pub max_reads: Option<u64>,
    /// Stop after this many records (valid or invalid)
    pub max_records: Option<u64>,
}

impl SessionConfig {
    /// Read timeout as a `Duration`
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: DEFAULT_TIMEOUT_MS,
            chunk_size: 256,
            max_line_len: MAX_LINE_LEN,
            max_reads: None,
            max_records: None,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Serial link
    pub serial: SerialConfig,
    /// Read loop
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the read loop cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::Invalid("baud_rate must be non-zero".into()));
        }
        if self.session.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunk_size must be non-zero".into()));
        }
        if self.session.max_line_len == 0 {
            return Err(ConfigError::Invalid("max_line_len must be non-zero".into()));
        }
        Ok(())
    }
}
