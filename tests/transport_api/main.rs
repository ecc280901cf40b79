//! Transport API Test Suite
//!
//! End-to-end coverage of the public `filetransport` API: opening from
//! configuration, the write/flush/close cycle against real files, and
//! custom durability strategies.
//!
//! ## Running Tests
//!
//! ```bash
//! # Run the whole suite
//! cargo test --test transport_api
//!
//! # Configuration tests only
//! cargo test --test transport_api config_file::
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use filetransport::testing::RecordingSync;
use filetransport::{FileTransport, TransportConfig};
use tempfile::TempDir;

/// Fresh directory plus the log path inside it
fn scratch() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("transport.log");
    (dir, path)
}

/// Open with a recorder and a one-minute interval, so only explicit flushes
/// and close produce durability calls
fn open_recorded(path: &Path) -> (FileTransport, Arc<RecordingSync>) {
    let recorder = Arc::new(RecordingSync::passthrough());
    let transport = FileTransport::builder(path)
        .config(TransportConfig::new().with_flush_max_us(60_000_000))
        .sync_strategy(recorder.clone())
        .open()
        .unwrap();
    (transport, recorder)
}

mod config_file;
mod custom_strategy;
mod lifecycle;
