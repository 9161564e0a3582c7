//! Integration tests for logging system

use async_trait::async_trait;
use bridge_traits::error::Result as SinkResult;
use bridge_traits::time::{LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{init_logging, redact_url, strip_path, LogFormat, LoggingConfig};
use core_runtime::Error;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct CollectingSink {
    entries: Mutex<Vec<LogEntry>>,
}

#[async_trait]
impl LoggerSink for CollectingSink {
    async fn log(&self, entry: LogEntry) -> SinkResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

// Global subscriber can only be installed once per process, so everything
// that depends on it lives in this single test.
#[test]
fn test_init_logging_installs_global_subscriber() {
    let sink = Arc::new(CollectingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_filter("logging_integration=debug")
        .with_logger_sink(sink.clone());

    init_logging(config.clone()).unwrap();

    tracing::debug!(index = 3u64, "queue advanced");
    tracing::trace!("filtered out");

    {
        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "queue advanced");
        assert_eq!(entries[0].fields.get("index"), Some(&"3".to_string()));
    }

    let second = init_logging(config);
    assert!(matches!(second, Err(Error::Logging(_))));
}

#[test]
fn test_url_and_path_helpers() {
    let url = "https://media.example.com/album/01.flac?token=abc123";
    assert_eq!(redact_url(url), "https://media.example.com/album/01.flac");
    assert!(!redact_url(url).contains("abc123"));

    assert_eq!(strip_path("/Users/jane/Library/Caches/01.flac"), "01.flac");
    assert_eq!(strip_path("C:\\cache\\01.flac"), "01.flac");
}
