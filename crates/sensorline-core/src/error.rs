//! Library errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by an input source or while opening a port
#[derive(Error, Debug)]
pub enum SourceError {
    /// The serial driver rejected an operation
    #[error("Serial port error: {0}")]
    SerialError(String),

    /// No device behind the requested port name
    #[error("Port not found: {0}")]
    PortNotFound(String),

    /// A read failed for a reason other than a timeout
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serialport::Error> for SourceError {
    fn from(e: serialport::Error) -> Self {
        match e.kind() {
            serialport::ErrorKind::NoDevice => SourceError::PortNotFound(e.description),
            serialport::ErrorKind::Io(kind) => {
                SourceError::IoError(std::io::Error::new(kind, e.description))
            }
            _ => SourceError::SerialError(e.description),
        }
    }
}

/// Errors raised by a record sink
#[derive(Error, Debug)]
pub enum SinkError {
    /// Writing output failed
    #[error("Sink I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A record could not be encoded as JSON
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors that end a reading session
#[derive(Error, Debug)]
pub enum SessionError {
    /// The input source broke; the session cannot continue
    #[error("Input source failed: {0}")]
    Source(#[from] SourceError),

    /// The sink refused a record
    #[error("Record sink failed: {0}")]
    Sink(#[from] SinkError),
}

/// Errors loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config {path}: {source}")]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The file is not valid JSON for [`AppConfig`](crate::config::AppConfig)
    #[error("Invalid config {path}: {source}")]
    Parse {
        /// Config file path
        path: PathBuf,
        /// Underlying parse error
        source: serde_json::Error,
    },

    /// A value is out of range
    #[error("Invalid config value: {0}")]
    Invalid(String),
}
