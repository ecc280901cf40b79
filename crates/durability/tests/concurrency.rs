//! Concurrency tests
//!
//! Many writers, explicit flushers and reconfigurations against one
//! transport. No write may be lost or torn.

use filetransport_durability::testing::RecordingSync;
use filetransport_durability::FileTransport;
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

const WRITERS: usize = 8;
const WRITES_PER_THREAD: usize = 1_000;

fn line(writer: usize, seq: usize) -> String {
    format!("w{writer:02}-{seq:05}\n")
}

#[test]
fn test_concurrent_writers_lose_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.log");
    let recorder = Arc::new(RecordingSync::new());
    let transport = Arc::new(
        FileTransport::builder(&path)
            .flush_max_bytes(4_096)
            .flush_max_us(1_000)
            .sync_strategy(recorder.clone())
            .open()
            .unwrap(),
    );

    let barrier = Arc::new(Barrier::new(WRITERS + 2));
    let mut handles = Vec::new();
    for writer in 0..WRITERS {
        let transport = Arc::clone(&transport);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for seq in 0..WRITES_PER_THREAD {
                transport.write(line(writer, seq).as_bytes()).unwrap();
            }
        }));
    }

    // Explicit flushes racing the scheduler
    {
        let transport = Arc::clone(&transport);
        let barrier = Arc::clone(&barrier);
        handles.push(thread::spawn(move || {
            barrier.wait();
            for _ in 0..50 {
                transport.flush().unwrap();
                thread::sleep(Duration::from_micros(200));
            }
        }));
    }

    barrier.wait();
    for handle in handles {
        handle.join().unwrap();
    }
    transport.close();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), WRITERS * WRITES_PER_THREAD);

    let unique: HashSet<&str> = lines.iter().copied().collect();
    assert_eq!(unique.len(), lines.len());
    for writer in 0..WRITERS {
        for seq in [0, WRITES_PER_THREAD / 2, WRITES_PER_THREAD - 1] {
            assert!(unique.contains(line(writer, seq).trim_end()));
        }
    }

    let counters = transport.counters();
    assert_eq!(counters.writes, (WRITERS * WRITES_PER_THREAD) as u64);
    assert_eq!(counters.bytes_written, content.len() as u64);
    assert!(counters.sync_calls >= 1);
    assert_eq!(transport.pending_bytes(), 0);
}

#[test]
fn test_per_writer_order_preserved() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.log");
    let transport = Arc::new(
        FileTransport::builder(&path)
            .flush_max_us(500)
            .sync_strategy(Arc::new(RecordingSync::new()))
            .open()
            .unwrap(),
    );

    let handles: Vec<_> = (0..4)
        .map(|writer| {
            let transport = Arc::clone(&transport);
            thread::spawn(move || {
                for seq in 0..500 {
                    transport.write(line(writer, seq).as_bytes()).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    transport.close();

    let content = std::fs::read_to_string(&path).unwrap();
    let mut next = [0usize; 4];
    for entry in content.lines() {
        let writer: usize = entry[1..3].parse().unwrap();
        let seq: usize = entry[4..9].parse().unwrap();
        assert_eq!(seq, next[writer], "writer {writer} out of order");
        next[writer] += 1;
    }
    assert_eq!(next, [500; 4]);
}

#[test]
fn test_reconfigure_while_writing() {
    let dir = TempDir::new().unwrap();
    let recorder = Arc::new(RecordingSync::new());
    let transport = Arc::new(
        FileTransport::builder(dir.path().join("out.log"))
            .sync_strategy(recorder.clone())
            .open()
            .unwrap(),
    );

    let writer = {
        let transport = Arc::clone(&transport);
        thread::spawn(move || {
            for seq in 0..2_000 {
                transport.write(line(0, seq).as_bytes()).unwrap();
            }
        })
    };
    for i in 0..200u64 {
        transport.set_flush_max_bytes(64 + i).unwrap();
        transport.set_flush_max_us(100 + i * 10).unwrap();
    }
    writer.join().unwrap();
    transport.close();

    assert_eq!(transport.counters().writes, 2_000);
    assert!(recorder.sync_count() >= 1);
}
