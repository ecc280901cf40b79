//! Filetransport - durable buffered file transport
//!
//! Callers append bytes to a file through a write buffer; a background
//! scheduler forces them to stable storage whenever either flush threshold
//! is reached:
//!
//! - `flush_max_bytes`: bytes written since the last flush
//! - `flush_max_us`: microseconds since the last flush
//!
//! # Quick Start
//!
//! ```ignore
//! use filetransport::FileTransport;
//!
//! let transport = FileTransport::open("/var/log/app/events.log")?;
//! transport.write(b"event\n")?;
//!
//! // Tighten the time threshold to 50ms
//! transport.set_flush_max_us(50_000)?;
//!
//! // Durable now, without waiting for the scheduler
//! transport.flush()?;
//!
//! // Wakes the scheduler, performs the final flush, joins it
//! transport.close();
//! ```
//!
//! # Configuration
//!
//! Settings can come from a TOML file:
//!
//! ```ignore
//! use filetransport::{FileTransport, TransportConfig};
//! use std::path::Path;
//!
//! let config = TransportConfig::from_file(Path::new("transport.toml"))?;
//! let transport = FileTransport::open_with_config("/data/out.log", config)?;
//! ```

pub use filetransport_core::{
    ConfigError, FlushPolicy, Result, TransportConfig, TransportError,
    DEFAULT_IO_ERROR_BACKOFF_US,
};
pub use filetransport_durability::{
    FileTransport, OsSync, SinkId, SyncStrategy, TransportBuilder, TransportCounters,
};

/// Recording durability strategy for tests.
pub use filetransport_durability::testing;
