//! Record sinks
//!
//! Every decoded record, valid or not, is handed to a sink together with
//! the line it came from.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::io::Write;

use crate::record::SensorRecord;
use crate::SinkError;

/// Receiver for decoded records
pub trait RecordSink {
    /// Report one record and the raw line it was decoded from
    fn report(&mut self, line: &str, record: &SensorRecord) -> Result<(), SinkError>;
}

impl<F> RecordSink for F
where
    F: FnMut(&str, &SensorRecord),
{
    fn report(&mut self, line: &str, record: &SensorRecord) -> Result<(), SinkError> {
        self(line, record);
        Ok(())
    }
}

/// Output format for [`PrintSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `raw line -> decoded record`
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    received_at: String,
    line: &'a str,
    record: &'a SensorRecord,
}

/// Writes records to any `Write` (usually stdout)
pub struct PrintSink<W: Write> {
    writer: W,
    format: OutputFormat,
}

impl<W: Write> PrintSink<W> {
    /// Print to `writer` in `format`
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    /// Give back the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for PrintSink<W> {
    fn report(&mut self, line: &str, record: &SensorRecord) -> Result<(), SinkError> {
        match self.format {
            OutputFormat::Text => match record.error() {
                Some(error) => writeln!(self.writer, "{} -> {} ({})", line, record, error)?,
                None => writeln!(self.writer, "{} -> {}", line, record)?,
            },
            OutputFormat::Json => {
                let report = JsonReport {
                    received_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                    line,
                    record,
                };
                serde_json::to_writer(&mut self.writer, &report)?;
                writeln!(self.writer)?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps every record in memory
#[derive(Debug, Default)]
pub struct CollectSink {
    entries: Vec<(String, SensorRecord)>,
}

impl CollectSink {
    /// An empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw lines in arrival order
    pub fn lines(&self) -> Vec<&str> {
        self.entries.iter().map(|(line, _)| line.as_str()).collect()
    }

    /// Records in arrival order
    pub fn records(&self) -> impl Iterator<Item = &SensorRecord> {
        self.entries.iter().map(|(_, record)| record)
    }

    /// Number of records collected
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been collected
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RecordSink for CollectSink {
    fn report(&mut self, line: &str, record: &SensorRecord) -> Result<(), SinkError> {
        self.entries.push((line.to_string(), record.clone()));
        Ok(())
    }
}

/// Reports to two sinks in turn
pub struct Tee<A, B> {
    first: A,
    second: B,
}

impl<A: RecordSink, B: RecordSink> Tee<A, B> {
    /// Report to `first`, then `second`
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// Give back both sinks
    pub fn into_inner(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: RecordSink, B: RecordSink> RecordSink for Tee<A, B> {
    fn report(&mut self, line: &str, record: &SensorRecord) -> Result<(), SinkError> {
        self.first.report(line, record)?;
        self.second.report(line, record)
    }
}
