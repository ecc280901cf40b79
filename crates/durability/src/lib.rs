//! Durability layer for the file transport
//!
//! This crate handles everything that touches disk:
//!
//! - Sink: append-only file with a write buffer in front of it
//! - Sync strategies: the durability primitive, injectable for tests
//! - Flush scheduler: one background thread per transport, flushing when
//!   the byte or time threshold is reached
//! - Transport: the caller-facing handle (write, flush, reconfigure, close)
//! - Testing utilities: a recording durability strategy

#![warn(missing_docs)]
#![warn(clippy::all)]

mod buffer; // Pending-byte bookkeeping and counters
mod scheduler; // Background flush thread
mod shared; // Locks and state shared with the scheduler
pub mod sink; // File sink and durability strategies
pub mod testing; // Recording durability strategy
pub mod transport; // FileTransport and its builder

// === Re-exports ===
pub use buffer::TransportCounters;
pub use sink::{FileSink, OsSync, SinkId, SyncHandle, SyncStrategy};
pub use transport::{FileTransport, TransportBuilder};
