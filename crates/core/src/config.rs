//! Transport configuration via TOML
//!
//! A transport can be configured programmatically (`with_*` setters) or from
//! a small TOML file:
//!
//! ```toml
//! # Flush once this many bytes are pending (omit for unbounded)
//! # flush_max_bytes = 1048576
//!
//! # Flush once this many microseconds passed since the last flush
//! flush_max_us = 300000
//! ```
//!
//! TOML integers are signed 64-bit, so the unbounded byte threshold is
//! expressed by leaving `flush_max_bytes` out rather than writing `u64::MAX`.

use crate::error::ConfigError;
use crate::policy::FlushPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default minimum spacing between scheduled retries after a failed
/// durability call (500ms).
pub const DEFAULT_IO_ERROR_BACKOFF_US: u64 = 500_000;

/// Transport configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    /// Byte threshold; `None` means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flush_max_bytes: Option<u64>,

    /// Time threshold in microseconds.
    #[serde(default = "default_flush_max_us")]
    pub flush_max_us: u64,

    /// Discard existing sink contents on open.
    #[serde(default)]
    pub truncate: bool,

    /// Reject single writes larger than this many bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_write_size: Option<u64>,

    /// Minimum spacing between scheduled retries after a failed durability call.
    #[serde(default = "default_io_error_backoff_us")]
    pub io_error_backoff_us: u64,
}

fn default_flush_max_us() -> u64 {
    FlushPolicy::DEFAULT_MAX_MICROS
}

fn default_io_error_backoff_us() -> u64 {
    DEFAULT_IO_ERROR_BACKOFF_US
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            flush_max_bytes: None,
            flush_max_us: default_flush_max_us(),
            truncate: false,
            max_write_size: None,
            io_error_backoff_us: default_io_error_backoff_us(),
        }
    }
}

impl TransportConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the byte threshold (builder pattern).
    pub fn with_flush_max_bytes(mut self, bytes: u64) -> Self {
        self.flush_max_bytes = Some(bytes);
        self
    }

    /// Set the time threshold in microseconds (builder pattern).
    pub fn with_flush_max_us(mut self, micros: u64) -> Self {
        self.flush_max_us = micros;
        self
    }

    /// Discard existing contents when opening (builder pattern).
    pub fn with_truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    /// Limit single writes to `bytes` (builder pattern).
    pub fn with_max_write_size(mut self, bytes: u64) -> Self {
        self.max_write_size = Some(bytes);
        self
    }

    /// Set the retry backoff after a failed scheduled durability call.
    pub fn with_io_error_backoff_us(mut self, micros: u64) -> Self {
        self.io_error_backoff_us = micros;
        self
    }

    /// The flush thresholds this configuration describes.
    pub fn policy(&self) -> FlushPolicy {
        FlushPolicy::new(
            self.flush_max_bytes.unwrap_or(FlushPolicy::DEFAULT_MAX_BYTES),
            self.flush_max_us,
        )
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_write_size == Some(0) {
            return Err(ConfigError::Invalid(
                "max_write_size must be at least 1 byte".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# File transport configuration
#
# A flush forces buffered data to stable storage. It is due when EITHER
# threshold is reached.

# Flush once this many bytes were written since the last flush.
# Omit for unbounded (time threshold only).
# flush_max_bytes = 1048576

# Flush once this many microseconds passed since the last flush.
flush_max_us = 300000

# Discard existing file contents on open (default: append).
truncate = false

# Reject single writes larger than this many bytes.
# max_write_size = 16777216

# After a failed background fsync, wait at least this long before retrying.
io_error_backoff_us = 500000
"#
    }

    /// Parse and validate config from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, "<inline>")
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| ConfigError::Read {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn parse(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: TransportConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}
