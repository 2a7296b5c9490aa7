use std::sync::Arc;
use std::time::{Duration, Instant};

use dh_session::OutputSink;
use proptest::prelude::*;

fn lines(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

#[test]
fn unterminated_chunk_is_continued_by_next_chunk() {
    let sink = OutputSink::new("\n");
    sink.write(b"main[1] ");
    assert_eq!(sink.snapshot(), lines(&["main[1] "]));

    sink.write(b"x = 5\n");
    assert_eq!(sink.snapshot(), lines(&["main[1] x = 5", ""]));
}

#[test]
fn terminated_line_leaves_empty_trailing_entry() {
    let sink = OutputSink::new("\n");
    sink.write(b"one\ntwo\n");
    assert_eq!(sink.snapshot(), lines(&["one", "two", ""]));

    sink.write(b"three");
    assert_eq!(sink.snapshot(), lines(&["one", "two", "three"]));
}

#[test]
fn reset_then_snapshot_is_empty() {
    let sink = OutputSink::new("\n");
    sink.write(b"Breakpoint hit: main\nmain[1] ");
    let taken = sink.snapshot();
    assert_eq!(taken.len(), 2);

    let reset = sink.reset();
    assert_eq!(reset, taken);
    assert!(sink.snapshot().is_empty());
    assert!(sink.reset().is_empty());
}

#[test]
fn data_after_reset_starts_a_new_line() {
    let sink = OutputSink::new("\n");
    sink.write(b"partial");
    sink.snapshot();
    sink.reset();
    sink.write(b"fresh\n");
    assert_eq!(sink.snapshot(), lines(&["fresh", ""]));
}

#[test]
fn reset_leaves_unabsorbed_bytes_for_next_snapshot() {
    let sink = OutputSink::new("\n");
    sink.write(b"late\n");
    assert!(sink.reset().is_empty());
    assert!(sink.has_new_data());
    assert_eq!(sink.snapshot(), lines(&["late", ""]));
}

#[test]
fn has_new_data_tracks_unabsorbed_bytes() {
    let sink = OutputSink::new("\n");
    assert!(!sink.has_new_data());
    sink.write(b"abc");
    assert!(sink.has_new_data());
    sink.snapshot();
    assert!(!sink.has_new_data());
    sink.write(b"");
    assert!(!sink.has_new_data());
}

#[test]
fn incomplete_sequence_at_end_of_input_is_flushed() {
    let sink = OutputSink::new("\n");
    sink.write(b"bye \xE2\x86");
    assert_eq!(sink.snapshot(), lines(&["bye "]));
    assert!(!sink.has_new_data());

    sink.finish();
    assert!(sink.has_new_data());
    assert!(sink.wait_for_data(Duration::from_millis(10)));
    assert_eq!(sink.snapshot(), lines(&["bye \u{FFFD}"]));
    assert!(!sink.has_new_data());
}

#[test]
fn partial_separator_at_end_of_input_is_kept() {
    let sink = OutputSink::new("\r\n");
    sink.write(b"last\r");
    assert_eq!(sink.snapshot(), lines(&["last"]));

    sink.finish();
    assert_eq!(sink.snapshot(), lines(&["last\r"]));
}

#[test]
fn multibyte_character_split_across_chunks() {
    let sink = OutputSink::new("\n");
    let text = "naïve → ok\n".as_bytes();
    // split inside the two-byte 'ï' and inside the three-byte arrow
    let first = 3;
    let second = text.len() - 6;
    sink.write(&text[..first]);
    sink.snapshot();
    sink.write(&text[first..second]);
    sink.snapshot();
    sink.write(&text[second..]);
    assert_eq!(sink.snapshot(), lines(&["naïve → ok", ""]));
}

#[test]
fn invalid_utf8_is_replaced() {
    let sink = OutputSink::new("\n");
    sink.write(b"bad \xff byte\n");
    assert_eq!(sink.snapshot(), lines(&["bad \u{FFFD} byte", ""]));
}

#[test]
fn crlf_separator_split_across_chunks() {
    let sink = OutputSink::new("\r\n");
    sink.write(b"first\r");
    sink.snapshot();
    sink.write(b"\nsecond\r\n");
    assert_eq!(sink.snapshot(), lines(&["first", "second", ""]));
}

#[test]
fn wait_for_data_times_out_without_writes() {
    let sink = OutputSink::new("\n");
    let start = Instant::now();
    assert!(!sink.wait_for_data(Duration::from_millis(100)));
    assert!(start.elapsed() >= Duration::from_millis(90));
}

#[test]
fn wait_for_data_wakes_on_write_from_other_thread() {
    let sink = Arc::new(OutputSink::new("\n"));
    let writer = Arc::clone(&sink);
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        writer.write(b"hello\n");
    });

    let start = Instant::now();
    assert!(sink.wait_for_data(Duration::from_secs(5)));
    assert!(start.elapsed() < Duration::from_secs(5));
    handle.join().expect("writer thread");
    assert_eq!(sink.snapshot(), lines(&["hello", ""]));
}

#[test]
fn concurrent_writers_keep_per_stream_order() {
    let sink = Arc::new(OutputSink::new("\n"));
    let spawn_writer = |tag: &'static str| {
        let sink = Arc::clone(&sink);
        std::thread::spawn(move || {
            for i in 0..200 {
                sink.write(format!("{tag}{i}\n").as_bytes());
            }
        })
    };
    let a = spawn_writer("out");
    let b = spawn_writer("err");
    a.join().expect("writer a");
    b.join().expect("writer b");

    let all = sink.snapshot();
    assert_eq!(all.len(), 401);
    // no ordering between the two streams, only within each
    for tag in ["out", "err"] {
        let seen: Vec<String> = all.iter().filter(|l| l.starts_with(tag)).cloned().collect();
        let expected: Vec<String> = (0..200).map(|i| format!("{tag}{i}")).collect();
        assert_eq!(seen, expected);
    }
}

fn feed(sink: &OutputSink, bytes: &[u8], cuts: &[usize]) -> Vec<String> {
    let mut points: Vec<usize> = cuts.iter().map(|c| c % (bytes.len() + 1)).collect();
    points.push(0);
    points.push(bytes.len());
    points.sort_unstable();
    for pair in points.windows(2) {
        sink.write(&bytes[pair[0]..pair[1]]);
        sink.snapshot();
    }
    sink.snapshot()
}

proptest! {
    #[test]
    fn chunking_does_not_change_lines(
        text in "[a-z0-9 \\[\\]>=éλ→\n]{1,120}",
        cuts in proptest::collection::vec(any::<usize>(), 0..12),
    ) {
        let sink = OutputSink::new("\n");
        let got = feed(&sink, text.as_bytes(), &cuts);
        let expected: Vec<String> = text.split('\n').map(str::to_string).collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn chunking_does_not_change_crlf_lines(
        parts in proptest::collection::vec("[a-z0-9 >é]{0,12}", 1..8),
        cuts in proptest::collection::vec(any::<usize>(), 0..12),
    ) {
        let text = parts.join("\r\n");
        prop_assume!(!text.is_empty());
        let sink = OutputSink::new("\r\n");
        let got = feed(&sink, text.as_bytes(), &cuts);
        prop_assert_eq!(got, parts);
    }
}
