//! Write buffer bookkeeping
//!
//! The bytes themselves live in the sink's `BufWriter`; this module tracks
//! how much of them is not yet durable and when the last flush happened.
//! All of it is mutated under the transport's state lock.

use std::time::Instant;

/// Cumulative transport counters.
///
/// These counters accumulate over the lifetime of the transport and are
/// never reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportCounters {
    /// Non-empty writes accepted
    pub writes: u64,
    /// Total bytes accepted by `write`
    pub bytes_written: u64,
    /// Durability calls issued, failed ones included
    pub sync_calls: u64,
    /// Total nanoseconds spent in durability calls
    pub sync_nanos: u64,
    /// Flushes performed by the background scheduler
    pub scheduled_flushes: u64,
    /// Flushes performed by explicit `flush()` calls
    pub explicit_flushes: u64,
    /// Durability calls that returned an error
    pub failed_syncs: u64,
}

/// Snapshot taken right before a durability call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FlushTicket {
    /// Bytes the durability call covers
    pub bytes: u64,
    /// When the flush started; becomes the new last-flush time
    pub started: Instant,
}

/// Pending write state: bytes since the last successful flush.
#[derive(Debug)]
pub(crate) struct PendingWrites {
    bytes_since_flush: u64,
    last_flush: Instant,
    last_write: Option<Instant>,
}

impl PendingWrites {
    /// Start with nothing pending; `created` stands in for the first flush.
    pub fn new(created: Instant) -> Self {
        PendingWrites {
            bytes_since_flush: 0,
            last_flush: created,
            last_write: None,
        }
    }

    /// Account for `len` appended bytes.
    ///
    /// Returns true if nothing was pending before, i.e. the scheduler may be
    /// parked without a deadline.
    pub fn record_write(&mut self, len: u64, now: Instant) -> bool {
        let was_empty = self.bytes_since_flush == 0;
        self.bytes_since_flush = self.bytes_since_flush.saturating_add(len);
        self.last_write = Some(now);
        was_empty
    }

    pub fn is_empty(&self) -> bool {
        self.bytes_since_flush == 0
    }

    pub fn bytes_since_flush(&self) -> u64 {
        self.bytes_since_flush
    }

    pub fn last_flush(&self) -> Instant {
        self.last_flush
    }

    pub fn last_write(&self) -> Option<Instant> {
        self.last_write
    }

    /// Snapshot the bytes a durability call starting at `now` will cover.
    pub fn begin_flush(&self, now: Instant) -> FlushTicket {
        FlushTicket {
            bytes: self.bytes_since_flush,
            started: now,
        }
    }

    /// Retire the bytes covered by a successful durability call.
    ///
    /// Writes that arrived while the call was in flight stay pending.
    pub fn complete_flush(&mut self, ticket: FlushTicket) {
        self.bytes_since_flush = self.bytes_since_flush.saturating_sub(ticket.bytes);
        self.last_flush = ticket.started;
    }
}
