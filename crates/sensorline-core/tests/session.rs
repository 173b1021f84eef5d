use pretty_assertions::assert_eq;
use sensorline_core::prelude::*;
use std::collections::VecDeque;
use std::io;
use std::thread;
use std::time::Duration;

/// Scripted byte source for testing
enum Step {
    Bytes(&'static [u8]),
    Idle,
    Fail,
}

struct MockSource {
    steps: VecDeque<Step>,
    /// What to return once the script runs out
    exhausted: ReadOutcome,
}

impl MockSource {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
            exhausted: ReadOutcome::Closed,
        }
    }

    fn endless(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
            exhausted: ReadOutcome::Idle,
        }
    }
}

impl ByteSource for MockSource {
    fn read_chunk(
        &mut self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<ReadOutcome, SourceError> {
        match self.steps.pop_front() {
            Some(Step::Bytes(data)) => {
                buf[..data.len()].copy_from_slice(data);
                Ok(ReadOutcome::Data(data.len()))
            }
            Some(Step::Idle) => Ok(ReadOutcome::Idle),
            Some(Step::Fail) => Err(SourceError::IoError(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "device unplugged",
            ))),
            None => {
                if self.exhausted == ReadOutcome::Idle {
                    thread::sleep(timeout);
                }
                Ok(self.exhausted)
            }
        }
    }
}

fn config() -> SessionConfig {
    SessionConfig {
        read_timeout_ms: 5,
        ..SessionConfig::default()
    }
}

#[test]
fn test_idle_reads_do_not_disturb_buffer() {
    let source = MockSource::new(vec![
        Step::Bytes(b"10,20,"),
        Step::Idle,
        Step::Bytes(b"0.1,0.2,0.9,"),
        Step::Idle,
        Step::Idle,
        Step::Bytes(b"23.5\n"),
    ]);

    let mut sink = CollectSink::new();
    let stats = Session::new(source, config()).run(&mut sink).unwrap();

    assert_eq!(stats.reads, 7);
    assert_eq!(stats.idle_reads, 3);
    assert_eq!(stats.valid_records, 1);
    assert_eq!(sink.lines(), vec!["10,20,0.1,0.2,0.9,23.5"]);
    assert_eq!(
        sink.records().next().and_then(|r| r.temperature()),
        Some(23.5)
    );
}

#[test]
fn test_malformed_lines_are_not_fatal() {
    let source = MockSource::new(vec![
        Step::Bytes(b"1,2,3\n\nx,y,z,1,2,3\n"),
        Step::Bytes(b"1,2,3,4,5,6\n"),
    ]);

    let mut sink = CollectSink::new();
    let stats = Session::new(source, config()).run(&mut sink).unwrap();

    assert_eq!(stats.invalid_records, 3);
    assert_eq!(stats.valid_records, 1);
    let validity: Vec<bool> = sink.records().map(|r| r.is_valid()).collect();
    assert_eq!(validity, vec![false, false, false, true]);
}

#[test]
fn test_source_failure_is_fatal() {
    let source = MockSource::new(vec![Step::Bytes(b"1,2,3,4,5,6\n"), Step::Fail]);

    let mut sink = CollectSink::new();
    let result = Session::new(source, config()).run(&mut sink);

    assert!(matches!(result, Err(SessionError::Source(_))));
    // Records before the failure were still delivered
    assert_eq!(sink.len(), 1);
}

#[test]
fn test_partial_line_discarded_at_end_of_stream() {
    let source = MockSource::new(vec![Step::Bytes(b"1,2,3,4,5,6\n7,8,9")]);

    let mut sink = CollectSink::new();
    let stats = Session::new(source, config()).run(&mut sink).unwrap();

    assert_eq!(stats.stop_reason, Some(StopReason::EndOfStream));
    assert_eq!(stats.discarded_bytes, 5);
    assert_eq!(sink.lines(), vec!["1,2,3,4,5,6"]);
}

#[test]
fn test_max_reads_bounds_a_silent_source() {
    let source = MockSource::endless(vec![]);
    let session = Session::new(
        source,
        SessionConfig {
            max_reads: Some(4),
            ..config()
        },
    );

    let mut sink = CollectSink::new();
    let stats = session.run(&mut sink).unwrap();
    assert_eq!(stats.stop_reason, Some(StopReason::MaxReads));
    assert_eq!(stats.reads, 4);
    assert_eq!(stats.idle_reads, 4);
}

#[test]
fn test_cancel_from_another_thread() {
    let session = Session::new(MockSource::endless(vec![]), config());
    let token = session.cancel_token();

    let handle = thread::spawn(move || {
        let mut sink = CollectSink::new();
        session.run(&mut sink)
    });

    thread::sleep(Duration::from_millis(30));
    token.cancel();

    let stats = handle.join().unwrap().unwrap();
    assert_eq!(stats.stop_reason, Some(StopReason::Cancelled));
    assert!(stats.reads > 0);
}

#[test]
fn test_sink_failure_is_fatal() {
    struct FailingSink;

    impl RecordSink for FailingSink {
        fn report(&mut self, _: &str, _: &SensorRecord) -> Result<(), SinkError> {
            Err(SinkError::IoError(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "stdout closed",
            )))
        }
    }

    let source = MockSource::new(vec![Step::Bytes(b"1,2,3,4,5,6\n")]);
    let result = Session::new(source, config()).run(&mut FailingSink);
    assert!(matches!(result, Err(SessionError::Sink(_))));
}

#[test]
fn test_demo_source_end_to_end() {
    let source = DemoSource::new(DemoDevice::with_seed(11).corrupt_every(5)).max_lines(50);

    let mut sink = CollectSink::new();
    let stats = Session::new(source, config()).run(&mut sink).unwrap();

    assert_eq!(stats.stop_reason, Some(StopReason::EndOfStream));
    assert_eq!(stats.lines, 50);
    assert_eq!(stats.invalid_records, 10);
    assert_eq!(stats.valid_records, 40);
    assert_eq!(stats.discarded_bytes, 0);
}

#[test]
fn test_csv_log_from_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("log.csv");

    let source = MockSource::new(vec![Step::Bytes(
        b"1,2,3,4,5,6\nbad\n6,5,4,3,2,1\n",
    )]);
    let mut tee = Tee::new(CollectSink::new(), CsvRecorder::create(&path).unwrap());
    let stats = Session::new(source, config()).run(&mut tee).unwrap();
    let (collected, recorder) = tee.into_inner();
    assert_eq!(recorder.rows(), 2);
    recorder.finish().unwrap();

    assert_eq!(stats.records(), 3);
    assert_eq!(collected.len(), 3);

    let content = std::fs::read_to_string(&path).unwrap();
    let rows: Vec<&str> = content.lines().collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[0],
        "Time,light,soundPressure,motionX,motionY,motionZ,temperature"
    );
    assert!(rows[2].ends_with(",6,5,4,3,2,1"));
}
