//! User-supplied durability strategies

use super::*;
use filetransport::{SinkId, SyncStrategy};
use std::fs::File;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counts calls and delegates to `sync_data`
#[derive(Default)]
struct DataOnlySync {
    calls: AtomicU64,
    last_sink: AtomicU64,
}

impl SyncStrategy for DataOnlySync {
    fn sync(&self, sink: SinkId, file: &File) -> io::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_sink.store(sink.as_u64(), Ordering::SeqCst);
        file.sync_data()
    }

    fn strategy_id(&self) -> &str {
        "data-only"
    }
}

#[test]
fn custom_strategy_receives_every_call() {
    let (_dir, log) = scratch();
    let strategy = Arc::new(DataOnlySync::default());
    let transport = FileTransport::builder(&log)
        .flush_max_us(60_000_000)
        .sync_strategy(strategy.clone())
        .open()
        .unwrap();

    transport.write(b"a").unwrap();
    transport.flush().unwrap();
    transport.write(b"b").unwrap();
    transport.close();

    assert_eq!(strategy.calls.load(Ordering::SeqCst), 2);
    assert_eq!(
        strategy.last_sink.load(Ordering::SeqCst),
        transport.sink_id().as_u64()
    );
    assert_eq!(std::fs::read(&log).unwrap(), b"ab");
}

#[test]
fn each_transport_gets_its_own_sink_id() {
    let (dir, log) = scratch();
    let recorder = Arc::new(RecordingSync::new());
    let first = FileTransport::builder(&log)
        .flush_max_us(60_000_000)
        .sync_strategy(recorder.clone())
        .open()
        .unwrap();
    let second = FileTransport::builder(dir.path().join("other.log"))
        .flush_max_us(60_000_000)
        .sync_strategy(recorder.clone())
        .open()
        .unwrap();
    assert_ne!(first.sink_id(), second.sink_id());

    first.write(b"1").unwrap();
    second.write(b"2").unwrap();
    first.flush().unwrap();
    second.flush().unwrap();

    let sinks: Vec<_> = recorder.calls().iter().filter_map(|c| c.sink).collect();
    assert_eq!(sinks, vec![first.sink_id(), second.sink_id()]);
}
