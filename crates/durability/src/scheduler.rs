//! Flush scheduler
//!
//! One background thread per open transport. It sleeps on the state condvar
//! until the next policy deadline, or until a writer, an explicit flush, a
//! reconfiguration or close signals it, then re-evaluates the policy.
//!
//! ```text
//!            ┌────────────── signaled / deadline ──────────────┐
//!            ▼                                                 │
//!   ┌─────────────────┐  due   ┌──────────────┐                │
//!   │     Waiting     │───────►│ flush (Sched)│────────────────┘
//!   └────────┬────────┘        └──────────────┘
//!            │ stopping
//!            ▼
//!   ┌─────────────────┐
//!   │ flush (Final)   │──► Terminated
//!   └─────────────────┘
//! ```
//!
//! The shutdown flag is checked under the same lock the condvar waits on,
//! and close sets it under that lock before notifying, so a sleeping
//! scheduler wakes immediately instead of waiting out its deadline.

use crate::shared::{FlushTrigger, Shared};
use parking_lot::MutexGuard;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, trace};

/// Spawn the scheduler thread for `shared`.
pub(crate) fn spawn(shared: Arc<Shared>, name: String) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(name)
        .spawn(move || run(&shared))
}

fn run(shared: &Shared) {
    let mut state = shared.state.lock();
    loop {
        if state.stopping {
            break;
        }

        if state.scheduled_flush_due(Instant::now()) {
            MutexGuard::unlocked(&mut state, || match shared.flush(FlushTrigger::Scheduled) {
                Ok(flushed) => trace!(flushed, "scheduled flush pass"),
                Err(e) => shared.report(e),
            });
            continue;
        }

        match state.next_wakeup() {
            Some(deadline) => {
                shared.wakeup.wait_until(&mut state, deadline);
            }
            None => shared.wakeup.wait(&mut state),
        }
    }
    drop(state);

    match shared.flush(FlushTrigger::Final) {
        Ok(true) => debug!("final flush before scheduler exit"),
        Ok(false) => {}
        Err(e) => shared.report(e),
    }
}
