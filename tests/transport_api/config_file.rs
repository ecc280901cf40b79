//! Opening transports from TOML configuration

use super::*;
use filetransport::{ConfigError, FlushPolicy, TransportError};

#[test]
fn default_file_round_trips() {
    let (dir, log) = scratch();
    let config_path = dir.path().join("transport.toml");

    TransportConfig::write_default_if_missing(&config_path).unwrap();
    let config = TransportConfig::from_file(&config_path).unwrap();
    assert_eq!(config, TransportConfig::default());

    let transport = FileTransport::open_with_config(&log, config).unwrap();
    assert_eq!(transport.flush_policy(), FlushPolicy::default());
}

#[test]
fn thresholds_from_file_apply() {
    let (dir, log) = scratch();
    let config_path = dir.path().join("transport.toml");
    std::fs::write(
        &config_path,
        "flush_max_bytes = 4096\nflush_max_us = 25000\ntruncate = true\n",
    )
    .unwrap();
    std::fs::write(&log, b"old contents").unwrap();

    let config = TransportConfig::from_file(&config_path).unwrap();
    let transport = FileTransport::open_with_config(&log, config).unwrap();
    assert_eq!(transport.flush_policy(), FlushPolicy::new(4096, 25_000));

    transport.write(b"new").unwrap();
    transport.close();
    assert_eq!(std::fs::read(&log).unwrap(), b"new");
}

#[test]
fn written_config_reloads() {
    let (dir, _) = scratch();
    let config_path = dir.path().join("custom.toml");
    let config = TransportConfig::new()
        .with_flush_max_bytes(1 << 20)
        .with_max_write_size(512)
        .with_io_error_backoff_us(10_000);

    config.write_to_file(&config_path).unwrap();
    assert_eq!(TransportConfig::from_file(&config_path).unwrap(), config);
}

#[test]
fn unknown_key_rejected() {
    let (dir, _) = scratch();
    let config_path = dir.path().join("transport.toml");
    std::fs::write(&config_path, "flush_every = 10\n").unwrap();

    let err = TransportConfig::from_file(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn invalid_config_rejected_at_open() {
    let (_dir, log) = scratch();
    let config = TransportConfig::new().with_max_write_size(0);

    let err = FileTransport::open_with_config(&log, config).unwrap_err();
    assert!(matches!(err, TransportError::Config(ConfigError::Invalid(_))));
    assert!(!log.exists());
}
