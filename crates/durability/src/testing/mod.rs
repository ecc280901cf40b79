//! Testing utilities for the transport
//!
//! - **RecordingSync**: a [`SyncStrategy`](crate::SyncStrategy) that records
//!   every durability call with its timestamp, and can be told to fail or
//!   stall, so flush timing and failure paths can be checked without real
//!   disks.
//!
//! # Example
//!
//! ```ignore
//! use filetransport_durability::testing::RecordingSync;
//! use filetransport_durability::FileTransport;
//! use std::sync::Arc;
//!
//! let recorder = Arc::new(RecordingSync::new());
//! let transport = FileTransport::builder("out.log")
//!     .sync_strategy(recorder.clone())
//!     .open()?;
//! transport.write(b"foo")?;
//! transport.flush()?;
//! assert_eq!(recorder.sync_count(), 1);
//! ```

mod recording;

pub use recording::{RecordingSync, SyncCall};
