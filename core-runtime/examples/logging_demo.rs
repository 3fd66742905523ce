//! Logging system demonstration
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format, mirrored into the console sink
//! cargo run --example logging_demo -- json
//!
//! # Compact format with a custom filter
//! cargo run --example logging_demo -- compact "logging_demo=trace"
//! ```

use bridge_traits::{ConsoleLogger, LogLevel};
use core_runtime::logging::{init_logging, redact_if_sensitive, redact_url, LogFormat, LoggingConfig};
use std::env;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Debug)
        .with_spans(true)
        .with_filter("logging_demo=debug,core_runtime=debug");

    if format == LogFormat::Json {
        config = config.with_logger_sink(Arc::new(ConsoleLogger::default()));
    }
    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }

    if let Err(err) = init_logging(config) {
        eprintln!("failed to initialize logging: {err}");
        return;
    }

    info!(format = ?format, "Logging initialized");

    let source = "https://livepeercdn.studio/hls/abc123/index.m3u8?jwt=eyJhbGciOi";
    attach_source(source).await;

    info!(
        stream_key = %redact_if_sensitive("stream_key", "abcd-efgh-ijkl"),
        "Broadcast configured"
    );
    warn!(effect = "set_volume", "Effect failed; continuing with the next one");
}

#[instrument(skip(url), fields(url = %redact_url(url)))]
async fn attach_source(url: &str) {
    debug!("Resolving source");
    tokio::task::yield_now().await;
    info!(kind = "hls", "Source attached");
}
