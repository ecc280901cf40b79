//! State shared between caller threads and the flush scheduler
//!
//! # Locks
//!
//! | Lock | Guards | Held during I/O |
//! |------|--------|-----------------|
//! | `syncer` | the durability handle; serializes flushes | yes, the durability call |
//! | `sink` | the file and its write buffer | yes, appends and drains |
//! | `state` | counters, thresholds, shutdown flag | never |
//!
//! Acquisition order is always `syncer` → `sink` → `state`. The `wakeup`
//! condvar pairs with `state`; the scheduler sleeps on it.

use crate::buffer::{PendingWrites, TransportCounters};
use crate::sink::{FileSink, SyncHandle};
use filetransport_core::{FlushPolicy, Result, TransportConfig, TransportError};
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};
use tracing::error;

/// Who asked for a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlushTrigger {
    /// Background scheduler, only when the policy says so
    Scheduled,
    /// Caller's `flush()`, regardless of thresholds
    Explicit,
    /// Scheduler's last pass before terminating
    Final,
}

/// Mutable bookkeeping guarded by `Shared::state`.
#[derive(Debug)]
pub(crate) struct State {
    pub policy: FlushPolicy,
    pub pending: PendingWrites,
    pub counters: TransportCounters,
    /// Close has begun; no more writes, scheduler must exit
    pub stopping: bool,
    /// A sink write failed; the transport is unusable
    pub failed: bool,
    /// No scheduled retry before this instant (after a failed durability call)
    pub retry_after: Option<Instant>,
    pub io_error_backoff: Duration,
    pub background_error: Option<TransportError>,
}

impl State {
    fn new(config: &TransportConfig, now: Instant) -> Self {
        State {
            policy: config.policy(),
            pending: PendingWrites::new(now),
            counters: TransportCounters::default(),
            stopping: false,
            failed: false,
            retry_after: None,
            io_error_backoff: Duration::from_micros(config.io_error_backoff_us),
            background_error: None,
        }
    }

    /// Policy decision for the background scheduler.
    pub fn scheduled_flush_due(&self, now: Instant) -> bool {
        if self.failed || self.pending.is_empty() {
            return false;
        }
        if matches!(self.retry_after, Some(retry) if now < retry) {
            return false;
        }
        self.policy
            .is_due_at(self.pending.bytes_since_flush(), self.pending.last_flush(), now)
    }

    /// Earliest instant at which `scheduled_flush_due` can turn true without
    /// any further state change. `None` means sleep until signaled.
    pub fn next_wakeup(&self) -> Option<Instant> {
        if self.failed || self.pending.is_empty() {
            return None;
        }
        let due = if self.policy.bytes_exceeded(self.pending.bytes_since_flush()) {
            Some(self.pending.last_flush())
        } else {
            self.policy.next_deadline(self.pending.last_flush())
        };
        match self.retry_after {
            Some(retry) => due.map(|d| d.max(retry)),
            None => due,
        }
    }

    fn should_flush(&self, trigger: FlushTrigger, now: Instant) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        match trigger {
            FlushTrigger::Scheduled => self.scheduled_flush_due(now),
            FlushTrigger::Explicit | FlushTrigger::Final => true,
        }
    }
}

pub(crate) struct Shared {
    pub state: Mutex<State>,
    pub wakeup: Condvar,
    pub sink: Mutex<Option<FileSink>>,
    pub syncer: Mutex<Option<SyncHandle>>,
    pub max_write_size: Option<u64>,
}

impl Shared {
    pub fn new(sink: FileSink, syncer: SyncHandle, config: &TransportConfig) -> Self {
        Shared {
            state: Mutex::new(State::new(config, Instant::now())),
            wakeup: Condvar::new(),
            sink: Mutex::new(Some(sink)),
            syncer: Mutex::new(Some(syncer)),
            max_write_size: config.max_write_size,
        }
    }

    /// Drain the sink and issue one durability call if `trigger` warrants it.
    ///
    /// Returns `Ok(false)` when nothing needed flushing. The due-decision is
    /// re-made after the flush lock is acquired: a concurrent flush may have
    /// just covered the same bytes.
    pub fn flush(&self, trigger: FlushTrigger) -> Result<bool> {
        let syncer_guard = self.syncer.lock();
        let Some(syncer) = syncer_guard.as_ref() else {
            return Err(TransportError::TransportClosed);
        };

        let ticket = {
            let mut sink_guard = self.sink.lock();
            let Some(sink) = sink_guard.as_mut() else {
                return Err(TransportError::TransportClosed);
            };

            {
                let state = self.state.lock();
                if trigger == FlushTrigger::Explicit && (state.stopping || state.failed) {
                    return Err(TransportError::TransportClosed);
                }
                // Buffer contents are unknown after a failed append
                if state.failed || !state.should_flush(trigger, Instant::now()) {
                    return Ok(false);
                }
            }

            if let Err(e) = sink.drain() {
                self.mark_failed();
                return Err(TransportError::WriteFailure(e));
            }

            // Sink lock still held: no write can land between drain and snapshot
            self.state.lock().pending.begin_flush(Instant::now())
        };

        let start = Instant::now();
        let result = syncer.force_durable();
        let elapsed = start.elapsed();

        let mut state = self.state.lock();
        state.counters.sync_calls += 1;
        state.counters.sync_nanos += elapsed.as_nanos() as u64;

        match result {
            Ok(()) => {
                state.pending.complete_flush(ticket);
                state.retry_after = None;
                match trigger {
                    FlushTrigger::Scheduled => state.counters.scheduled_flushes += 1,
                    FlushTrigger::Explicit => state.counters.explicit_flushes += 1,
                    FlushTrigger::Final => {}
                }
                drop(state);
                // Deadline moved; let the scheduler recompute
                self.wakeup.notify_all();
                Ok(true)
            }
            Err(e) => {
                state.counters.failed_syncs += 1;
                if trigger == FlushTrigger::Scheduled {
                    state.retry_after = Instant::now().checked_add(state.io_error_backoff);
                }
                Err(TransportError::FlushFailure(e))
            }
        }
    }

    /// Mark the transport unusable after a sink write failure.
    pub fn mark_failed(&self) {
        let mut state = self.state.lock();
        state.failed = true;
        self.wakeup.notify_all();
    }

    /// Report a failure nobody is waiting on.
    ///
    /// Logged, then kept until `take_background_error` collects it. A newer
    /// error replaces an uncollected older one.
    pub fn report(&self, err: TransportError) {
        error!(error = %err, "background flush failed");
        self.state.lock().background_error = Some(err);
    }
}
