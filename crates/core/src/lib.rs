//! Core types for the file transport
//!
//! This crate defines the pieces every other layer builds on:
//! - TransportError / ConfigError: error hierarchy
//! - FlushPolicy: pure byte/time flush decision
//! - TransportConfig: TOML-backed configuration

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod policy;

pub use config::{TransportConfig, DEFAULT_IO_ERROR_BACKOFF_US};
pub use error::{ConfigError, Result, TransportError};
pub use policy::FlushPolicy;
