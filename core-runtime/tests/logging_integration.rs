//! Integration tests for logging and controller configuration

use bridge_traits::{LogLevel, MemoryStorage};
use core_runtime::logging::{
    init_logging, redact_if_sensitive, redact_url, LogFormat, LoggingConfig,
};
use core_runtime::{ControllerConfig, Error, PersistConfig};
use std::sync::Arc;

#[test]
fn test_logging_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_spans(false)
        .with_target(false);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.logger_sink.is_none());
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LoggingConfig::default().format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LoggingConfig::default().format, LogFormat::Json);
}

#[test]
fn test_credentials_are_redacted() {
    assert_eq!(redact_if_sensitive("stream_key", "abcd-efgh-ijkl"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("streamKey", "abcd-efgh-ijkl"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("jwt", "eyJhbGciOi"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("access_key", "ak_123"), "[REDACTED]");
}

#[test]
fn test_ordinary_fields_pass_through() {
    assert_eq!(redact_if_sensitive("volume", "0.75"), "0.75");
    assert_eq!(redact_if_sensitive("creator_id", "creator-1"), "creator-1");
    assert_eq!(redact_if_sensitive("kind", "hls"), "hls");
}

#[test]
fn test_signed_playback_url_is_stripped() {
    let url = "https://livepeercdn.studio/hls/abc123/index.m3u8?jwt=eyJhbGciOi&accessKey=x";
    assert_eq!(redact_url(url), "https://livepeercdn.studio/hls/abc123/index.m3u8");
}

#[test]
fn test_init_logging_only_once() {
    let first = init_logging(LoggingConfig::default().with_format(LogFormat::Compact));
    let second = init_logging(LoggingConfig::default());

    // Another test binary may have installed a subscriber first; the second
    // call in this process must fail either way.
    if first.is_ok() {
        assert!(matches!(second, Err(Error::Config(_))));
    }
    assert!(second.is_err());
}

#[tokio::test]
async fn test_controller_config_with_memory_storage() {
    let storage = Arc::new(MemoryStorage::new());
    let config = ControllerConfig::builder()
        .sdk_version("4.0.0")
        .storage(storage.clone())
        .persist(PersistConfig {
            enabled: true,
            version: 2,
        })
        .build()
        .unwrap();

    assert_eq!(config.persist.version, 2);
    config.storage.set_item("livepeer-broadcast-controller", "{}").await.unwrap();
    assert!(!storage.is_empty());
}
