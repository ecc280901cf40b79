//! File transport handle and open/close logic
//!
//! [`FileTransport`] is the caller-facing façade. It owns:
//! - the sink (file plus write buffer), behind the shared locks
//! - the flush policy, mutable at any time until close
//! - one background scheduler thread
//!
//! ## Lifecycle
//!
//! ```text
//! open ──► Running ──► close() / drop ──► Closed
//!             │
//!             └── append failure ──► Failed (everything returns TransportClosed)
//! ```
//!
//! `close` wakes the scheduler immediately, lets it perform one final
//! flush, joins it, then releases the file. Teardown latency is bounded by
//! that final flush, never by the configured flush interval.

mod builder;

pub use builder::TransportBuilder;

use crate::buffer::TransportCounters;
use crate::scheduler;
use crate::shared::{FlushTrigger, Shared};
use crate::sink::{FileSink, OsSync, SinkId, SyncStrategy};
use filetransport_core::{FlushPolicy, Result, TransportConfig, TransportError};
use parking_lot::Mutex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, warn};

/// Buffered, durably flushed file transport.
///
/// All methods take `&self`; share the transport across threads with an
/// `Arc`. Dropping the transport closes it.
///
/// # Example
///
/// ```ignore
/// use filetransport_durability::FileTransport;
///
/// let transport = FileTransport::open("/var/log/app/events.log")?;
/// transport.set_flush_max_bytes(64 * 1024)?;
/// transport.write(b"hello\n")?;
/// transport.flush()?; // durable from here on
/// transport.close();
/// ```
pub struct FileTransport {
    path: PathBuf,
    sink_id: SinkId,
    shared: Arc<Shared>,
    scheduler: Mutex<Option<JoinHandle<()>>>,
}

impl FileTransport {
    /// Open (or create) the file at `path` with default settings.
    ///
    /// Defaults: append mode, no byte threshold, a 300ms time threshold and
    /// the OS durability call.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, TransportConfig::default())
    }

    /// Open with explicit configuration.
    pub fn open_with_config(path: impl AsRef<Path>, config: TransportConfig) -> Result<Self> {
        Self::start(path.as_ref(), config, Arc::new(OsSync))
    }

    /// Builder for custom thresholds or a custom durability strategy.
    pub fn builder(path: impl Into<PathBuf>) -> TransportBuilder {
        TransportBuilder::new(path)
    }

    fn start(path: &Path, config: TransportConfig, strategy: Arc<dyn SyncStrategy>) -> Result<Self> {
        config.validate()?;

        let strategy_id = strategy.strategy_id().to_string();
        let sink = FileSink::open(path, config.truncate, strategy)
            .map_err(|e| TransportError::open_failure(path, e))?;
        let syncer = sink
            .sync_handle()
            .map_err(|e| TransportError::open_failure(path, e))?;
        let sink_id = sink.id();

        let shared = Arc::new(Shared::new(sink, syncer, &config));
        let handle = scheduler::spawn(Arc::clone(&shared), format!("filetransport-flush-{}", sink_id.as_u64()))
            .map_err(|e| TransportError::open_failure(path, e))?;

        debug!(
            path = %path.display(),
            sink = %sink_id,
            strategy = %strategy_id,
            max_bytes = config.policy().max_bytes_since_flush,
            max_us = config.flush_max_us,
            "transport opened"
        );

        Ok(FileTransport {
            path: path.to_path_buf(),
            sink_id,
            shared,
            scheduler: Mutex::new(Some(handle)),
        })
    }

    /// Append `buf` to the write buffer.
    ///
    /// Returns once the bytes are buffered, not once they are durable. An
    /// empty slice is accepted and ignored.
    ///
    /// # Errors
    ///
    /// - [`TransportError::PayloadTooLarge`] if `buf` exceeds `max_write_size`
    /// - [`TransportError::WriteFailure`] if the append fails; the transport
    ///   is unusable afterwards
    /// - [`TransportError::TransportClosed`] after close or a prior write failure
    pub fn write(&self, buf: &[u8]) -> Result<()> {
        let mut sink_guard = self.shared.sink.lock();
        let Some(sink) = sink_guard.as_mut() else {
            return Err(TransportError::TransportClosed);
        };
        {
            let state = self.shared.state.lock();
            if state.stopping || state.failed {
                return Err(TransportError::TransportClosed);
            }
        }

        let len = buf.len() as u64;
        if let Some(limit) = self.shared.max_write_size {
            if len > limit {
                return Err(TransportError::PayloadTooLarge { len, limit });
            }
        }
        if buf.is_empty() {
            return Ok(());
        }

        if let Err(e) = sink.append(buf) {
            self.shared.mark_failed();
            return Err(TransportError::WriteFailure(e));
        }

        // Recorded before the sink lock drops, so any flush that drains
        // these bytes also accounts for them
        let mut state = self.shared.state.lock();
        let was_empty = state.pending.record_write(len, Instant::now());
        state.counters.writes += 1;
        state.counters.bytes_written += len;
        let wake = was_empty
            || state
                .policy
                .bytes_exceeded(state.pending.bytes_since_flush());
        drop(state);
        drop(sink_guard);

        if wake {
            self.shared.wakeup.notify_one();
        }
        Ok(())
    }

    /// Drain the buffer and make everything written so far durable.
    ///
    /// Issues exactly one durability call when there are pending bytes and
    /// none when there are not. Resets the flush clock on success.
    pub fn flush(&self) -> Result<()> {
        self.shared.flush(FlushTrigger::Explicit).map(|_| ())
    }

    /// Change the byte threshold. Takes effect at the next flush decision.
    pub fn set_flush_max_bytes(&self, bytes: u64) -> Result<()> {
        self.update_policy(|policy| policy.max_bytes_since_flush = bytes)
    }

    /// Change the time threshold, in microseconds. Takes effect at the next
    /// flush decision; a durability call already in progress is not
    /// interrupted.
    pub fn set_flush_max_us(&self, micros: u64) -> Result<()> {
        self.update_policy(|policy| policy.max_micros_since_flush = micros)
    }

    fn update_policy(&self, update: impl FnOnce(&mut FlushPolicy)) -> Result<()> {
        let mut state = self.shared.state.lock();
        if state.stopping || state.failed {
            return Err(TransportError::TransportClosed);
        }
        update(&mut state.policy);
        drop(state);
        // The scheduler's current deadline may be stale
        self.shared.wakeup.notify_all();
        Ok(())
    }

    /// Stop the scheduler, flush what is pending and release the file.
    ///
    /// Idempotent. Concurrent callers all return after teardown finished.
    /// A failure of the final flush is logged and kept for
    /// [`FileTransport::take_background_error`].
    pub fn close(&self) {
        let mut scheduler = self.scheduler.lock();
        let Some(handle) = scheduler.take() else {
            return;
        };

        self.shared.state.lock().stopping = true;
        self.shared.wakeup.notify_all();

        if handle.join().is_err() {
            warn!(path = %self.path.display(), "flush scheduler panicked; flushing from close");
            if let Err(e) = self.shared.flush(FlushTrigger::Final) {
                self.shared.report(e);
            }
        }

        let sink = self.shared.sink.lock().take();
        if let Some(sink) = sink {
            if self.shared.state.lock().failed {
                // Buffer contents are unknown after a failed append
                sink.discard();
            } else if let Err(e) = sink.close() {
                self.shared.report(TransportError::WriteFailure(e));
            }
        }
        self.shared.syncer.lock().take();

        debug!(path = %self.path.display(), sink = %self.sink_id, "transport closed");
    }

    /// Check if the transport no longer accepts operations.
    ///
    /// True once close has begun, or after a fatal write failure.
    pub fn is_closed(&self) -> bool {
        let state = self.shared.state.lock();
        state.stopping || state.failed
    }

    /// Snapshot of the cumulative counters.
    pub fn counters(&self) -> TransportCounters {
        self.shared.state.lock().counters.clone()
    }

    /// Bytes written since the last successful flush.
    pub fn pending_bytes(&self) -> u64 {
        self.shared.state.lock().pending.bytes_since_flush()
    }

    /// Current flush thresholds.
    pub fn flush_policy(&self) -> FlushPolicy {
        self.shared.state.lock().policy
    }

    /// When the last successful flush started (the open time if none yet).
    pub fn last_flush_at(&self) -> Instant {
        self.shared.state.lock().pending.last_flush()
    }

    /// When the last non-empty write was accepted.
    pub fn last_write_at(&self) -> Option<Instant> {
        self.shared.state.lock().pending.last_write()
    }

    /// Collect the most recent background failure, if any.
    ///
    /// Background flush failures have no caller to return to; they are
    /// logged and parked here. Collecting clears the slot.
    pub fn take_background_error(&self) -> Option<TransportError> {
        self.shared.state.lock().background_error.take()
    }

    /// File path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Identifier handed to every durability call for this transport.
    pub fn sink_id(&self) -> SinkId {
        self.sink_id
    }
}

impl Drop for FileTransport {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for FileTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("FileTransport")
            .field("path", &self.path)
            .field("sink", &self.sink_id)
            .field("policy", &state.policy)
            .field("pending_bytes", &state.pending.bytes_since_flush())
            .field("closed", &state.stopping)
            .finish()
    }
}
