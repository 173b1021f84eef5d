//! Input sources
//!
//! A byte source answers one question per call: what arrived within the
//! timeout? An empty answer is normal; only a broken source is an error.

use serialport::SerialPort;
use std::io::{self, Read};
use std::time::Duration;

use crate::SourceError;

/// Result of one timeout-bounded read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes were written to the front of the buffer
    Data(usize),
    /// Nothing arrived before the timeout
    Idle,
    /// The source reached end of stream
    Closed,
}

/// Abstraction over byte-oriented inputs (serial ports, files, simulators)
pub trait ByteSource: Send {
    /// Read whatever is available into `buf`, waiting at most `timeout`
    fn read_chunk(&mut self, buf: &mut [u8], timeout: Duration)
        -> Result<ReadOutcome, SourceError>;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read_chunk(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<ReadOutcome, SourceError> {
        (**self).read_chunk(buf, timeout)
    }
}

fn classify(result: io::Result<usize>) -> Result<ReadOutcome, SourceError> {
    match result {
        Ok(0) => Ok(ReadOutcome::Closed),
        Ok(n) => Ok(ReadOutcome::Data(n)),
        Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
            Ok(ReadOutcome::Idle)
        }
        Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(ReadOutcome::Idle),
        Err(e) => Err(SourceError::IoError(e)),
    }
}

/// Serial port wrapper implementing ByteSource
pub struct SerialSource {
    port: Box<dyn SerialPort>,
    /// Last timeout applied to the port, to avoid reconfiguring on every read
    timeout: Option<Duration>,
}

impl SerialSource {
    /// Wrap an opened port; the read timeout is applied on first use
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self {
            port,
            timeout: None,
        }
    }
}

impl ByteSource for SerialSource {
    fn read_chunk(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<ReadOutcome, SourceError> {
        if self.timeout != Some(timeout) {
            self.port.set_timeout(timeout)?;
            self.timeout = Some(timeout);
        }

        // A serial port never reaches end of stream; a zero-length read is a quiet line
        match classify(self.port.read(buf))? {
            ReadOutcome::Closed => Ok(ReadOutcome::Idle),
            outcome => Ok(outcome),
        }
    }
}

/// Adapter for any `Read` (files, pipes, in-memory data)
///
/// The timeout is not applied; blocking is up to the reader.
pub struct ReaderSource<R> {
    reader: R,
}

impl<R: Read + Send> ReaderSource<R> {
    /// Wrap a reader
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read + Send> ByteSource for ReaderSource<R> {
    fn read_chunk(
        &mut self,
        buf: &mut [u8],
        _timeout: Duration,
    ) -> Result<ReadOutcome, SourceError> {
        classify(self.reader.read(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reader_source_reads_then_closes() {
        let mut source = ReaderSource::new(Cursor::new(b"1,2\n".to_vec()));
        let mut buf = [0u8; 16];
        let timeout = Duration::from_millis(10);

        assert_eq!(
            source.read_chunk(&mut buf, timeout).unwrap(),
            ReadOutcome::Data(4)
        );
        assert_eq!(&buf[..4], b"1,2\n");
        assert_eq!(
            source.read_chunk(&mut buf, timeout).unwrap(),
            ReadOutcome::Closed
        );
    }

    #[test]
    fn test_classify_timeout_is_idle() {
        let err = io::Error::new(io::ErrorKind::TimedOut, "timed out");
        assert_eq!(classify(Err(err)).unwrap(), ReadOutcome::Idle);
    }

    #[test]
    fn test_classify_broken_pipe_is_error() {
        let err = io::Error::new(io::ErrorKind::BrokenPipe, "gone");
        assert!(matches!(classify(Err(err)), Err(SourceError::IoError(_))));
    }
}
