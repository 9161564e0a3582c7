//! Logging setup demonstration
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format
//! cargo run --example logging_demo -- json
//!
//! # Compact format with a custom filter
//! cargo run --example logging_demo -- compact "logging_demo=trace"
//! ```

use bridge_traits::time::LogLevel;
use core_runtime::logging::{init_logging, redact_url, strip_path, LogFormat, LoggingConfig};
use std::env;
use tracing::{debug, info, instrument, trace, warn};

#[tokio::main]
async fn main() -> core_runtime::Result<()> {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some("pretty") => LogFormat::Pretty,
        _ => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_spans(true)
        .with_target(true);
    if let Some(filter) = args.get(2) {
        config = config.with_filter(filter.clone());
    }

    init_logging(config)?;
    info!(format = ?format, "Logging initialized");

    let url = "https://cdn.example.com/music/track.mp3?signature=abc123&expires=99";
    simulate_download(url, "/home/user/.cache/stream-player-core/track.mp3").await;

    info!("Demo complete");
    Ok(())
}

/// Logs the way the stream cache does: URLs without their query string,
/// cache paths without their directories.
#[instrument(skip_all, fields(url = %redact_url(url)))]
async fn simulate_download(url: &str, cache_path: &str) {
    debug!("Starting download");

    let total: u64 = 4 * 1024 * 1024;
    for received in (0..=total).step_by(1024 * 1024) {
        trace!(bytes_received = received, expected_bytes = total, "Download progress");
        tokio::task::yield_now().await;
    }

    info!(bytes = total, "Download completed");
    warn!(file = %strip_path(cache_path), error = "disk full", "Failed to write cache file");
}
