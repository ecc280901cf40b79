//! Recording durability strategy

use crate::sink::{SinkId, SyncStrategy};
use parking_lot::Mutex;
use std::fs::File;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// One recorded durability call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncCall {
    /// When the call started
    pub at: Instant,
    /// Sink the call was issued for; `None` for a [`RecordingSync::mark`]
    pub sink: Option<SinkId>,
    /// Whether the call reported an error
    pub failed: bool,
}

/// Durability strategy that records calls instead of (or as well as)
/// forcing data to disk.
#[derive(Debug)]
pub struct RecordingSync {
    calls: Mutex<Vec<SyncCall>>,
    passthrough: bool,
    failing: AtomicBool,
    delay_micros: AtomicU64,
}

impl RecordingSync {
    /// Record only; no data reaches stable storage.
    pub fn new() -> Self {
        Self::build(false)
    }

    /// Record, then perform the real OS durability call.
    pub fn passthrough() -> Self {
        Self::build(true)
    }

    fn build(passthrough: bool) -> Self {
        RecordingSync {
            calls: Mutex::new(Vec::new()),
            passthrough,
            failing: AtomicBool::new(false),
            delay_micros: AtomicU64::new(0),
        }
    }

    /// Make subsequent calls fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Stall every subsequent call for `delay` before returning.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_micros
            .store(delay.as_micros() as u64, Ordering::SeqCst);
    }

    /// Record a reference point with no sink attached.
    ///
    /// Gap measurements then include the interval from the mark to the next
    /// real call, which is what "first flush after the first write" needs.
    pub fn mark(&self) {
        self.calls.lock().push(SyncCall {
            at: Instant::now(),
            sink: None,
            failed: false,
        });
    }

    /// Everything recorded so far, marks included, in call order.
    pub fn calls(&self) -> Vec<SyncCall> {
        self.calls.lock().clone()
    }

    /// Number of real durability calls, failed ones included.
    pub fn sync_count(&self) -> usize {
        self.calls.lock().iter().filter(|c| c.sink.is_some()).count()
    }

    /// Longest interval between consecutive recorded entries.
    pub fn max_gap(&self) -> Option<Duration> {
        let calls = self.calls.lock();
        calls
            .windows(2)
            .map(|w| w[1].at.saturating_duration_since(w[0].at))
            .max()
    }

    /// Poll until at least `count` real calls are recorded.
    ///
    /// Returns false if `timeout` elapses first.
    pub fn wait_for_syncs(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.sync_count() >= count {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}

impl Default for RecordingSync {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncStrategy for RecordingSync {
    fn sync(&self, sink: SinkId, file: &File) -> io::Result<()> {
        let at = Instant::now();
        let delay = self.delay_micros.load(Ordering::SeqCst);
        if delay > 0 {
            std::thread::sleep(Duration::from_micros(delay));
        }

        let result = if self.failing.load(Ordering::SeqCst) {
            Err(io::Error::new(io::ErrorKind::Other, "injected sync failure"))
        } else if self.passthrough {
            file.sync_all()
        } else {
            Ok(())
        };

        self.calls.lock().push(SyncCall {
            at,
            sink: Some(sink),
            failed: result.is_err(),
        });
        result
    }

    fn strategy_id(&self) -> &str {
        "recording"
    }
}
