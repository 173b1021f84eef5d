//! Data Logging
//!
//! Records decoded sensor readings to disk.

mod recorder;

pub use recorder::CsvRecorder;

use serde::Serialize;
use std::time::Duration;

use crate::record::SensorReadings;

/// A single log entry with timestamp and readings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    /// Timestamp from start of logging
    pub timestamp: Duration,
    /// Decoded readings
    pub readings: SensorReadings,
}

impl LogEntry {
    /// Create a new log entry
    pub fn new(timestamp: Duration, readings: SensorReadings) -> Self {
        Self {
            timestamp,
            readings,
        }
    }
}
