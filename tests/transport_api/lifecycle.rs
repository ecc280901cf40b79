//! Open, write, flush, close against real files

use super::*;
use std::time::Duration;

#[test]
fn write_flush_read_back() {
    let (_dir, log) = scratch();
    let (transport, recorder) = open_recorded(&log);

    transport.write(b"alpha\n").unwrap();
    transport.write(b"beta\n").unwrap();
    transport.flush().unwrap();

    // Durable and visible before close
    assert_eq!(std::fs::read(&log).unwrap(), b"alpha\nbeta\n");
    assert_eq!(recorder.sync_count(), 1);
    assert_eq!(transport.pending_bytes(), 0);
}

#[test]
fn close_then_reopen_appends() {
    let (_dir, log) = scratch();

    let (transport, _) = open_recorded(&log);
    transport.write(b"one\n").unwrap();
    transport.close();

    let (transport, _) = open_recorded(&log);
    transport.write(b"two\n").unwrap();
    drop(transport);

    assert_eq!(std::fs::read(&log).unwrap(), b"one\ntwo\n");
}

#[test]
fn counters_track_activity() {
    let (_dir, log) = scratch();
    let (transport, _) = open_recorded(&log);

    for _ in 0..10 {
        transport.write(b"0123456789").unwrap();
    }
    transport.flush().unwrap();
    transport.flush().unwrap();

    let counters = transport.counters();
    assert_eq!(counters.writes, 10);
    assert_eq!(counters.bytes_written, 100);
    assert_eq!(counters.sync_calls, 1);
    assert_eq!(counters.explicit_flushes, 1);
    assert_eq!(counters.failed_syncs, 0);
}

#[test]
fn scheduler_flushes_without_caller() {
    let (_dir, log) = scratch();
    let recorder = Arc::new(RecordingSync::passthrough());
    let transport = FileTransport::builder(&log)
        .flush_max_us(5_000)
        .sync_strategy(recorder.clone())
        .open()
        .unwrap();

    transport.write(b"background").unwrap();
    assert!(recorder.wait_for_syncs(1, Duration::from_secs(5)));
    assert_eq!(std::fs::read(&log).unwrap(), b"background");
}

#[test]
fn shared_across_threads() {
    let (_dir, log) = scratch();
    let (transport, _) = open_recorded(&log);
    let transport = Arc::new(transport);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let transport = Arc::clone(&transport);
            std::thread::spawn(move || {
                for _ in 0..100 {
                    transport.write(format!("{i}").as_bytes()).unwrap();
                }
                transport.flush().unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    transport.close();

    assert_eq!(std::fs::read(&log).unwrap().len(), 400);
}
