//! Transport builder for fluent configuration

use std::path::PathBuf;
use std::sync::Arc;

use filetransport_core::{Result, TransportConfig};

use super::FileTransport;
use crate::sink::{OsSync, SyncStrategy};

/// Builder for [`FileTransport`]
///
/// ```ignore
/// use filetransport_durability::FileTransport;
///
/// // 1. Defaults
/// let t = FileTransport::open("/data/out.log")?;
///
/// // 2. From a config file
/// let config = TransportConfig::from_file(Path::new("transport.toml"))?;
/// let t = FileTransport::open_with_config("/data/out.log", config)?;
///
/// // 3. Builder
/// let t = FileTransport::builder("/data/out.log")
///     .flush_max_bytes(64 * 1024)
///     .flush_max_us(50_000)
///     .open()?;
/// ```
#[derive(Clone)]
pub struct TransportBuilder {
    path: PathBuf,
    config: TransportConfig,
    strategy: Arc<dyn SyncStrategy>,
}

impl TransportBuilder {
    /// Create new builder with default configuration and the OS
    /// durability call.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TransportBuilder {
            path: path.into(),
            config: TransportConfig::default(),
            strategy: Arc::new(OsSync),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    /// Byte threshold.
    pub fn flush_max_bytes(mut self, bytes: u64) -> Self {
        self.config = self.config.with_flush_max_bytes(bytes);
        self
    }

    /// Time threshold in microseconds.
    pub fn flush_max_us(mut self, micros: u64) -> Self {
        self.config = self.config.with_flush_max_us(micros);
        self
    }

    /// Discard existing file contents on open instead of appending.
    pub fn truncate(mut self, truncate: bool) -> Self {
        self.config = self.config.with_truncate(truncate);
        self
    }

    /// Reject single writes larger than `bytes`.
    pub fn max_write_size(mut self, bytes: u64) -> Self {
        self.config = self.config.with_max_write_size(bytes);
        self
    }

    /// Retry delay after a failed background durability call.
    pub fn io_error_backoff_us(mut self, micros: u64) -> Self {
        self.config = self.config.with_io_error_backoff_us(micros);
        self
    }

    /// Durability primitive to use instead of the OS call.
    pub fn sync_strategy(mut self, strategy: Arc<dyn SyncStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Open the transport.
    ///
    /// # Errors
    ///
    /// - [`filetransport_core::TransportError::Config`] if the configuration
    ///   is invalid
    /// - [`filetransport_core::TransportError::OpenFailure`] if the file
    ///   cannot be opened
    pub fn open(self) -> Result<FileTransport> {
        FileTransport::start(&self.path, self.config, self.strategy)
    }
}

impl std::fmt::Debug for TransportBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportBuilder")
            .field("path", &self.path)
            .field("config", &self.config)
            .field("strategy", &self.strategy.strategy_id())
            .finish()
    }
}
