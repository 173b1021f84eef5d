//! Reading sessions
//!
//! A session owns one input source and one line buffer. A single control
//! flow reads with a bounded timeout, feeds the frame reader, decodes every
//! completed line and reports it before the next read is issued.
//!
//! Sessions always terminate: at end of stream, when cancelled through a
//! [`CancelToken`], or when a configured read or record limit is reached.

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, trace};

use crate::config::SessionConfig;
use crate::frame::FrameReader;
use crate::record::decode;
use crate::sink::RecordSink;
use crate::source::{ByteSource, ReadOutcome};
use crate::SessionError;

/// Shared flag asking a running session to stop
///
/// Checked between reads, so a session stops within one read timeout.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not been cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every session holding a clone of this token to stop
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether [`cancel`](CancelToken::cancel) has been called
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The source reported end of stream
    EndOfStream,
    /// The cancel token was set
    Cancelled,
    /// `max_reads` reads were issued
    MaxReads,
    /// `max_records` records were reported
    MaxRecords,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::EndOfStream => "end of stream",
            StopReason::Cancelled => "cancelled",
            StopReason::MaxReads => "read limit reached",
            StopReason::MaxRecords => "record limit reached",
        })
    }
}

/// Counters for a finished session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStats {
    /// Reads issued, including idle ones
    pub reads: u64,
    /// Reads that returned nothing before the timeout
    pub idle_reads: u64,
    /// Bytes received
    pub bytes: u64,
    /// Completed lines
    pub lines: u64,
    /// Records that decoded into six readings
    pub valid_records: u64,
    /// Records reported as malformed
    pub invalid_records: u64,
    /// Complete lines left unreported because the record limit was hit
    pub unreported_lines: u64,
    /// Bytes dropped because a line outgrew the buffer limit
    pub overflowed_bytes: u64,
    /// Unterminated bytes dropped when the session ended
    pub discarded_bytes: u64,
    /// Set once the session has ended
    pub stop_reason: Option<StopReason>,
}

impl SessionStats {
    /// Records handed to the sink
    pub fn records(&self) -> u64 {
        self.valid_records + self.invalid_records
    }
}

/// One reading session over a byte source
pub struct Session<S> {
    source: S,
    frames: FrameReader,
    config: SessionConfig,
    cancel: CancelToken,
    stats: SessionStats,
}

impl<S: ByteSource> Session<S> {
    /// Create a session with a fresh line buffer
    pub fn new(source: S, config: SessionConfig) -> Self {
        Self {
            source,
            frames: FrameReader::with_max_line_len(config.max_line_len),
            config,
            cancel: CancelToken::new(),
            stats: SessionStats::default(),
        }
    }

    /// Use an externally owned cancel token
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops this session when cancelled
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn limit_reached(&self) -> Option<StopReason> {
        if self.cancel.is_cancelled() {
            return Some(StopReason::Cancelled);
        }
        if self
            .config
            .max_records
            .is_some_and(|max| self.stats.records() >= max)
        {
            return Some(StopReason::MaxRecords);
        }
        if self
            .config
            .max_reads
            .is_some_and(|max| self.stats.reads >= max)
        {
            return Some(StopReason::MaxReads);
        }
        None
    }

    /// Run until a stop condition is met, reporting every record to `sink`
    ///
    /// A source or sink failure ends the session with an error. Malformed
    /// lines never do; they are reported as invalid records.
    pub fn run<K>(mut self, sink: &mut K) -> Result<SessionStats, SessionError>
    where
        K: RecordSink + ?Sized,
    {
        let mut buf = vec![0u8; self.config.chunk_size.max(1)];
        let timeout = self.config.read_timeout();
        info!(
            "Reading (timeout {}ms, chunk {} bytes)",
            self.config.read_timeout_ms,
            buf.len()
        );

        let reason = loop {
            if let Some(reason) = self.limit_reached() {
                break reason;
            }

            let outcome = match self.source.read_chunk(&mut buf, timeout) {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Input source failed after {} bytes: {}", self.stats.bytes, e);
                    return Err(e.into());
                }
            };
            self.stats.reads += 1;

            match outcome {
                ReadOutcome::Closed => break StopReason::EndOfStream,
                ReadOutcome::Idle => {
                    self.stats.idle_reads += 1;
                    trace!("No data within {}ms", self.config.read_timeout_ms);
                }
                ReadOutcome::Data(n) => {
                    self.stats.bytes += n as u64;
                    let lines = self.frames.feed(&buf[..n]);
                    self.process_lines(lines, sink)?;
                }
            }
        };

        self.stats.overflowed_bytes = self.frames.overflowed_bytes();
        self.stats.discarded_bytes = self.frames.finish() as u64;
        self.stats.stop_reason = Some(reason);
        info!(
            "Session ended ({}): {} valid, {} invalid, {} bytes in {} reads",
            reason,
            self.stats.valid_records,
            self.stats.invalid_records,
            self.stats.bytes,
            self.stats.reads
        );
        Ok(self.stats)
    }

    fn process_lines<K>(&mut self, lines: Vec<String>, sink: &mut K) -> Result<(), SessionError>
    where
        K: RecordSink + ?Sized,
    {
        let total = lines.len();
        for (i, line) in lines.into_iter().enumerate() {
            if self
                .config
                .max_records
                .is_some_and(|max| self.stats.records() >= max)
            {
                self.stats.unreported_lines += (total - i) as u64;
                break;
            }

            self.stats.lines += 1;
            let record = decode(&line);
            match record.error() {
                Some(e) => {
                    self.stats.invalid_records += 1;
                    debug!("Malformed line {:?}: {}", line, e);
                }
                None => {
                    self.stats.valid_records += 1;
                    trace!("Decoded {:?}", line);
                }
            }
            sink.report(&line, &record)?;
        }
        Ok(())
    }
}
