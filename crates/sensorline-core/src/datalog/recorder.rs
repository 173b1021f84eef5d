//! CSV recorder
//!
//! Writes one row per valid record; malformed lines are counted and skipped.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Instant;
use tracing::debug;

use super::LogEntry;
use crate::record::{SensorRecord, FIELD_NAMES};
use crate::sink::RecordSink;
use crate::SinkError;

/// CSV data logger
pub struct CsvRecorder<W: Write> {
    writer: W,
    /// Start time of logging
    start_time: Instant,
    header_written: bool,
    rows: u64,
    skipped: u64,
}

impl CsvRecorder<BufWriter<File>> {
    /// Create (or truncate) a CSV log file
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path.as_ref())?;
        debug!("Logging records to {}", path.as_ref().display());
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> CsvRecorder<W> {
    /// Create a recorder writing to `writer`; the clock starts now
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            start_time: Instant::now(),
            header_written: false,
            rows: 0,
            skipped: 0,
        }
    }

    /// Write one entry
    pub fn write_entry(&mut self, entry: &LogEntry) -> io::Result<()> {
        if !self.header_written {
            writeln!(self.writer, "Time,{}", FIELD_NAMES.join(","))?;
            self.header_written = true;
        }

        write!(self.writer, "{:.3}", entry.timestamp.as_secs_f64())?;
        for value in entry.readings.to_array() {
            write!(self.writer, ",{}", value)?;
        }
        writeln!(self.writer)?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Invalid records that were not logged
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Flush and return the writer
    pub fn finish(mut self) -> Result<W, SinkError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> RecordSink for CsvRecorder<W> {
    fn report(&mut self, _line: &str, record: &SensorRecord) -> Result<(), SinkError> {
        match record.readings() {
            Some(readings) => {
                let entry = LogEntry::new(self.start_time.elapsed(), *readings);
                self.write_entry(&entry)?;
            }
            None => self.skipped += 1,
        }
        Ok(())
    }
}
