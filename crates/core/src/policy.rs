//! Flush policy
//!
//! Pure decision logic for when buffered data must be forced to stable
//! storage. Two independent thresholds are combined with logical OR:
//!
//! | Threshold | Default | Effect |
//! |-----------|---------|--------|
//! | `max_bytes_since_flush` | `u64::MAX` (unbounded) | flush once this many bytes are pending |
//! | `max_micros_since_flush` | 300 000 µs | flush once this long has passed since the last flush |
//!
//! Nothing here locks or performs I/O; the scheduler and the write path
//! evaluate the policy under their own lock.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Byte/time thresholds deciding when a flush is due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushPolicy {
    /// Flush once at least this many bytes were written since the last flush.
    pub max_bytes_since_flush: u64,
    /// Flush once at least this many microseconds passed since the last flush.
    pub max_micros_since_flush: u64,
}

impl FlushPolicy {
    /// Default byte threshold: effectively unbounded.
    pub const DEFAULT_MAX_BYTES: u64 = u64::MAX;

    /// Default time threshold: 300ms.
    pub const DEFAULT_MAX_MICROS: u64 = 300_000;

    /// Create a policy with explicit thresholds.
    pub fn new(max_bytes_since_flush: u64, max_micros_since_flush: u64) -> Self {
        FlushPolicy {
            max_bytes_since_flush,
            max_micros_since_flush,
        }
    }

    /// Set the byte threshold (builder pattern).
    pub fn with_max_bytes(mut self, bytes: u64) -> Self {
        self.max_bytes_since_flush = bytes;
        self
    }

    /// Set the time threshold in microseconds (builder pattern).
    pub fn with_max_micros(mut self, micros: u64) -> Self {
        self.max_micros_since_flush = micros;
        self
    }

    /// Time threshold as a `Duration`.
    pub fn max_interval(&self) -> Duration {
        Duration::from_micros(self.max_micros_since_flush)
    }

    /// Decide whether a flush is due.
    ///
    /// True iff `bytes_since_flush >= max_bytes_since_flush` OR
    /// `micros_since_flush >= max_micros_since_flush`.
    #[inline]
    pub fn is_due(&self, bytes_since_flush: u64, micros_since_flush: u64) -> bool {
        self.bytes_exceeded(bytes_since_flush) || micros_since_flush >= self.max_micros_since_flush
    }

    /// Byte half of [`FlushPolicy::is_due`].
    ///
    /// Checked on every write so a burst can trigger a flush long before
    /// the time deadline.
    #[inline]
    pub fn bytes_exceeded(&self, bytes_since_flush: u64) -> bool {
        bytes_since_flush >= self.max_bytes_since_flush
    }

    /// [`FlushPolicy::is_due`] with the elapsed time taken from two instants.
    pub fn is_due_at(&self, bytes_since_flush: u64, last_flush: Instant, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(last_flush);
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.is_due(bytes_since_flush, micros)
    }

    /// Instant at which the time threshold expires.
    ///
    /// `last_flush + max_micros_since_flush`. Returns `None` when the sum is
    /// not representable, i.e. the time threshold can never be reached.
    pub fn next_deadline(&self, last_flush: Instant) -> Option<Instant> {
        last_flush.checked_add(self.max_interval())
    }
}

impl Default for FlushPolicy {
    fn default() -> Self {
        FlushPolicy {
            max_bytes_since_flush: Self::DEFAULT_MAX_BYTES,
            max_micros_since_flush: Self::DEFAULT_MAX_MICROS,
        }
    }
}
