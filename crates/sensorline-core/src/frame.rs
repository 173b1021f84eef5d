//! Line framing
//!
//! Accumulates bytes arriving in arbitrary-sized chunks and splits them into
//! newline-terminated frames.

use tracing::{debug, warn};

use crate::MAX_LINE_LEN;

/// Buffer state between reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    /// No newline buffered; only a partial line (or nothing) is held
    AwaitingDelimiter,
    /// At least one complete line is buffered
    LineReady,
}

/// Line-buffered frame reader
///
/// After every [`feed`](FrameReader::feed) the buffer holds only the bytes
/// received since the last newline. Any line longer than the configured
/// limit is dropped whole, whether it arrived in one chunk or many.
#[derive(Debug)]
pub struct FrameReader {
    /// Bytes not yet resolved into a line
    buffer: Vec<u8>,
    /// Longest line accepted, in bytes
    max_line_len: usize,
    /// Dropping bytes up to the next newline after an overflow
    discarding: bool,
    /// Total bytes dropped due to overflow
    overflowed_bytes: u64,
}

impl FrameReader {
    /// Create a frame reader with the default line limit
    pub fn new() -> Self {
        Self::with_max_line_len(MAX_LINE_LEN)
    }

    /// Create a frame reader with a custom line limit
    pub fn with_max_line_len(max_line_len: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_line_len: max_line_len.max(1),
            discarding: false,
            overflowed_bytes: 0,
        }
    }

    /// Append a chunk and return every line it completed, in arrival order
    ///
    /// A newline at the very start of the buffer completes an empty line.
    /// A single trailing `\r` is stripped from each line.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            if self.discarding {
                self.discarding = false;
                self.overflowed_bytes += (end - start) as u64;
                debug!("Resynchronised after oversized line");
            } else if end - start > self.max_line_len {
                warn!(
                    "Dropping {}-byte line (limit {})",
                    end - start,
                    self.max_line_len
                );
                self.overflowed_bytes += (end - start) as u64;
            } else {
                lines.push(line_from_bytes(&self.buffer[start..end]));
            }
            start = end + 1;
        }
        self.buffer.drain(..start);

        if self.buffer.len() > self.max_line_len {
            warn!(
                "Dropping {} buffered bytes without a newline (limit {})",
                self.buffer.len(),
                self.max_line_len
            );
            self.overflowed_bytes += self.buffer.len() as u64;
            self.buffer.clear();
            self.discarding = true;
        }

        lines
    }

    /// Discard any unterminated remainder at end of stream
    ///
    /// Returns the number of bytes dropped. The remainder is never emitted as a line.
    pub fn finish(&mut self) -> usize {
        let dropped = self.buffer.len();
        if dropped > 0 {
            debug!("Discarding {} bytes of unterminated input", dropped);
        }
        self.buffer.clear();
        self.discarding = false;
        dropped
    }

    /// Bytes held for the next call
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Current buffer state
    pub fn state(&self) -> FrameState {
        if self.buffer.contains(&b'\n') {
            FrameState::LineReady
        } else {
            FrameState::AwaitingDelimiter
        }
    }

    /// Total bytes dropped because a line outgrew the limit
    pub fn overflowed_bytes(&self) -> u64 {
        self.overflowed_bytes
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

fn line_from_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
