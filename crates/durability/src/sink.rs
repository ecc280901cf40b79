//! Durable sink handle
//!
//! Thin wrapper around an open file. Two layers of buffering sit between a
//! caller's bytes and the disk:
//!
//! ```text
//!   append()        → BufWriter (process memory)
//!   drain()         → OS page cache
//!   force_durable() → physical disk (one SyncStrategy::sync call)
//! ```
//!
//! The durability primitive itself is a [`SyncStrategy`] passed in at open,
//! so tests can count and time durability calls without touching the OS.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_SINK_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identifier of an opened sink.
///
/// This is the "descriptor" handed to every durability call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(u64);

impl SinkId {
    fn next() -> Self {
        SinkId(NEXT_SINK_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink-{}", self.0)
    }
}

/// Durability primitive.
///
/// Every flush makes exactly one `sync` call. Production code uses
/// [`OsSync`]; tests inject a recorder.
///
/// # Thread Safety
///
/// Strategies must be `Send + Sync`: the scheduler thread and caller
/// threads share one instance.
pub trait SyncStrategy: Send + Sync {
    /// Force everything written to `file` so far onto stable storage.
    fn sync(&self, sink: SinkId, file: &File) -> io::Result<()>;

    /// Short identifier for logging.
    fn strategy_id(&self) -> &str;
}

/// The OS durability call (`fsync`).
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSync;

impl SyncStrategy for OsSync {
    fn sync(&self, _sink: SinkId, file: &File) -> io::Result<()> {
        file.sync_all()
    }

    fn strategy_id(&self) -> &str {
        "os"
    }
}

/// An open, append-only file with a write buffer in front of it.
pub struct FileSink {
    path: PathBuf,
    id: SinkId,
    writer: BufWriter<File>,
    strategy: Arc<dyn SyncStrategy>,
}

impl FileSink {
    /// Open or create the file at `path`.
    ///
    /// Creates parent directories if they don't exist. Opens in append mode,
    /// or discards previous contents when `truncate` is set.
    pub fn open(path: &Path, truncate: bool, strategy: Arc<dyn SyncStrategy>) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut options = OpenOptions::new();
        options.create(true);
        if truncate {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }
        let file = options.open(path)?;

        Ok(FileSink {
            path: path.to_path_buf(),
            id: SinkId::next(),
            writer: BufWriter::new(file),
            strategy,
        })
    }

    /// Append bytes. Durability is not implied.
    pub fn append(&mut self, buf: &[u8]) -> io::Result<()> {
        self.writer.write_all(buf)
    }

    /// Hand buffered bytes to the OS without a durability call.
    pub fn drain(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Drain, then issue one durability call.
    pub fn force_durable(&mut self) -> io::Result<()> {
        self.drain()?;
        self.strategy.sync(self.id, self.writer.get_ref())
    }

    /// Handle for issuing durability calls without holding the sink.
    ///
    /// The handle shares the underlying open file, so a sync through it
    /// covers everything drained through this sink before the call.
    pub fn sync_handle(&self) -> io::Result<SyncHandle> {
        Ok(SyncHandle {
            file: self.writer.get_ref().try_clone()?,
            sink: self.id,
            strategy: Arc::clone(&self.strategy),
        })
    }

    /// Bytes appended but not yet drained.
    pub fn buffered_len(&self) -> usize {
        self.writer.buffer().len()
    }

    /// Sink identifier.
    pub fn id(&self) -> SinkId {
        self.id
    }

    /// File path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain and release the file.
    pub fn close(mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Release the file without handing buffered bytes to the OS.
    pub fn discard(self) {
        let (file, _unwritten) = self.writer.into_parts();
        drop(file);
    }
}

impl fmt::Debug for FileSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSink")
            .field("path", &self.path)
            .field("id", &self.id)
            .field("buffered", &self.writer.buffer().len())
            .field("strategy", &self.strategy.strategy_id())
            .finish()
    }
}

/// Durability-call handle detached from the sink's write buffer.
pub struct SyncHandle {
    file: File,
    sink: SinkId,
    strategy: Arc<dyn SyncStrategy>,
}

impl SyncHandle {
    /// Issue one durability call.
    pub fn force_durable(&self) -> io::Result<()> {
        self.strategy.sync(self.sink, &self.file)
    }

    /// Sink this handle belongs to.
    pub fn sink(&self) -> SinkId {
        self.sink
    }
}
