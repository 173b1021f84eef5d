use pretty_assertions::assert_eq;
use sensorline_core::frame::{FrameReader, FrameState};
use sensorline_core::record::decode;

const STREAM: &[u8] = b"512.0,40.5,0.01,-0.02,0.98,22.5\r\n\
    510.0,41.0,0.00,0.01,1.01,22.5\n\
    \n\
    garbage line\n\
    1,2,3\n\
    1,2,x,4,5,6\n\
    -1,-1,-1,-1,-1,-1\n\
    trailing partial";

fn feed_in_chunks(data: &[u8], chunk: usize) -> (Vec<String>, Vec<u8>) {
    feed_with_limit(FrameReader::new(), data, chunk).0
}

fn feed_with_limit(
    mut reader: FrameReader,
    data: &[u8],
    chunk: usize,
) -> ((Vec<String>, Vec<u8>), u64) {
    let mut lines = Vec::new();
    for piece in data.chunks(chunk) {
        lines.extend(reader.feed(piece));
        assert_eq!(reader.state(), FrameState::AwaitingDelimiter);
    }
    ((lines, reader.pending().to_vec()), reader.overflowed_bytes())
}

#[test]
fn test_chunking_does_not_change_lines() {
    let (expected, expected_pending) = feed_in_chunks(STREAM, STREAM.len());
    assert_eq!(expected.len(), 7);

    for chunk in 1..=STREAM.len() {
        let (lines, pending) = feed_in_chunks(STREAM, chunk);
        assert_eq!(lines, expected, "chunk size {}", chunk);
        assert_eq!(pending, expected_pending, "chunk size {}", chunk);
    }
}

#[test]
fn test_chunking_does_not_change_oversized_line_handling() {
    let data: &[u8] = b"0123456789\n1,2\n12345678\nabcdefghijklmnop\r\n\n9,9\n";
    let reader = || FrameReader::with_max_line_len(8);

    let (expected, overflowed) = feed_with_limit(reader(), data, data.len());
    assert_eq!(expected.0, vec!["1,2", "12345678", "", "9,9"]);
    assert_eq!(overflowed, 27);

    for chunk in 1..=data.len() {
        let (result, dropped) = feed_with_limit(reader(), data, chunk);
        assert_eq!(result, expected, "chunk size {}", chunk);
        assert_eq!(dropped, overflowed, "chunk size {}", chunk);
    }
}

#[test]
fn test_irregular_chunks() {
    let (expected, _) = feed_in_chunks(STREAM, STREAM.len());

    let mut reader = FrameReader::new();
    let mut lines = Vec::new();
    let mut rest = STREAM;
    let sizes = [3usize, 1, 17, 2, 40, 5, 9];
    let mut i = 0;
    while !rest.is_empty() {
        let n = sizes[i % sizes.len()].min(rest.len());
        lines.extend(reader.feed(&rest[..n]));
        rest = &rest[n..];
        i += 1;
    }
    assert_eq!(lines, expected);
}

#[test]
fn test_decoded_stream() {
    let (lines, pending) = feed_in_chunks(STREAM, 7);
    let validity: Vec<bool> = lines.iter().map(|l| decode(l).is_valid()).collect();

    assert_eq!(
        validity,
        vec![true, true, false, false, false, false, true]
    );
    assert_eq!(pending, b"trailing partial".to_vec());

    // A legitimately negative reading is a real value, not "unset"
    let record = decode(&lines[6]);
    assert_eq!(record.light(), Some(-1.0));
}

#[test]
fn test_two_lines_one_feed() {
    let mut reader = FrameReader::new();
    let lines = reader.feed(b"a,b,c,d,e,f\n1,1,1,1,1,1\n");
    assert_eq!(lines, vec!["a,b,c,d,e,f", "1,1,1,1,1,1"]);
    assert!(reader.pending().is_empty());

    assert!(!decode(&lines[0]).is_valid());
    assert!(decode(&lines[1]).is_valid());
}
