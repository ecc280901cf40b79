//! Error types for the file transport
//!
//! This module defines the error hierarchy shared by every layer of the
//! transport. We use `thiserror` for automatic `Display` and `Error` trait
//! implementations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

/// Error types for the file transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// The sink could not be created or opened
    ///
    /// Surfaced to the opener; no transport exists afterwards.
    #[error("Failed to open sink '{}': {source}", .path.display())]
    OpenFailure {
        /// Path that was being opened
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// Appending to the sink failed
    ///
    /// Fatal to the transport instance: every later operation fails with
    /// [`TransportError::TransportClosed`].
    #[error("Write to sink failed: {0}")]
    WriteFailure(#[source] io::Error),

    /// The durability call failed
    ///
    /// Surfaced to whichever caller triggered the flush. Failures inside the
    /// background scheduler are kept in the transport's error slot instead.
    #[error("Durability call failed: {0}")]
    FlushFailure(#[source] io::Error),

    /// Operation attempted after close (or after a fatal write failure)
    #[error("Transport is closed")]
    TransportClosed,

    /// Payload exceeds the configured per-write limit
    #[error("Payload of {len} bytes exceeds write limit of {limit} bytes")]
    PayloadTooLarge {
        /// Size of the rejected payload
        len: u64,
        /// Configured limit
        limit: u64,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl TransportError {
    /// Wrap an I/O error raised while opening `path`.
    pub fn open_failure(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TransportError::OpenFailure {
            path: path.into(),
            source,
        }
    }

    /// Check whether this error means the transport is no longer usable.
    pub fn is_closed(&self) -> bool {
        matches!(self, TransportError::TransportClosed)
    }

    /// Underlying I/O error kind, if the error came from the OS.
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self {
            TransportError::OpenFailure { source, .. } => Some(source.kind()),
            TransportError::WriteFailure(e) | TransportError::FlushFailure(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read or written
    #[error("Failed to access config file '{}': {source}", .path.display())]
    Read {
        /// Config file path
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: io::Error,
    },

    /// Config file contents are not valid TOML for this schema
    #[error("Failed to parse config '{path}': {message}")]
    Parse {
        /// Config source (file path or `<inline>`)
        path: String,
        /// Parser message
        message: String,
    },

    /// A value is out of its accepted range
    #[error("{0}")]
    Invalid(String),
}
