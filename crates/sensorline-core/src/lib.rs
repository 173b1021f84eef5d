//! # SensorLine Core Library
//!
//! Core functionality for receiving sensor telemetry over a serial link.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Line-buffered framing of arbitrarily chunked serial input
//! - Decoding of comma-separated sensor lines into typed records
//! - Serial port enumeration and configuration
//! - A terminating, timeout-bounded read loop
//! - Record sinks for printing, collecting and CSV data logging
//! - A simulated sensor device for running without hardware
//!
//! ## Line format
//!
//! Each sample arrives as one ASCII line:
//!
//! ```text
//! light,soundPressure,motionX,motionY,motionZ,temperature\n
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use sensorline_core::prelude::*;
//!
//! let port = open_port(&SerialConfig::new("/dev/ttyACM0", 9600))?;
//! let mut session = Session::new(SerialSource::new(port), SessionConfig::default());
//! let stats = session.run(&mut |line: &str, record: &SensorRecord| {
//!     println!("{line} -> {record}");
//! })?;
//! println!("{} valid records", stats.valid_records);
//! ```

pub mod config;
pub mod datalog;
pub mod demo;
mod error;
pub mod frame;
pub mod record;
pub mod serial;
pub mod session;
pub mod sink;
pub mod source;

pub use error::{ConfigError, SessionError, SinkError, SourceError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{AppConfig, SerialConfig, SessionConfig};
    pub use crate::datalog::CsvRecorder;
    pub use crate::demo::{DemoDevice, DemoSource};
    pub use crate::frame::{FrameReader, FrameState};
    pub use crate::record::{decode, DecodeError, SensorReadings, SensorRecord};
    pub use crate::serial::{list_ports, open_port, PortInfo};
    pub use crate::session::{CancelToken, Session, SessionStats, StopReason};
    pub use crate::sink::{CollectSink, OutputFormat, PrintSink, RecordSink, Tee};
    pub use crate::source::{ByteSource, ReadOutcome, ReaderSource, SerialSource};
    pub use crate::{ConfigError, SessionError, SinkError, SourceError};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default baud rate for sensor boards
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Default read timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Default upper bound on a buffered, not yet terminated line
pub const MAX_LINE_LEN: usize = 4096;
