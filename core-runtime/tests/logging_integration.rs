//! Integration tests for logging system

use async_trait::async_trait;
use bridge_traits::error::Result as SinkResult;
use bridge_traits::logging::{LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{init_logging, redact_if_sensitive, strip_path, LogFormat, LoggingConfig};
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
        LogLevel::Info
    }
}

// Global subscriber can only be installed once per process, so everything
// touching `init_logging` lives in this single test.
#[test]
fn test_init_logging_mirrors_events_to_sink() {
    let sink = Arc::new(CollectingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_logger_sink(sink.clone());

    init_logging(config).expect("first initialization succeeds");

    tracing::info!(target: "core_playback::coordinator", track_id = "42", "Track loaded");
    tracing::debug!(target: "core_playback::coordinator", "below sink level");
    tracing::info!(target: "hyper::client", "filtered out by default filter");

    {
        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "Track loaded");
        assert_eq!(entries[0].fields.get("track_id"), Some(&"42".to_string()));
    }

    let second = init_logging(LoggingConfig::default());
    assert!(second.is_err());
}

#[test]
fn test_redaction_helpers() {
    assert_eq!(redact_if_sensitive("authorization", "Bearer x"), "[REDACTED]");
    assert!(!redact_if_sensitive("email", "neo@greenwave.fm").contains("greenwave.fm"));
    assert_eq!(redact_if_sensitive("artist", "Neo User"), "Neo User");

    assert_eq!(strip_path("file:///storage/emulated/0/Music/a.mp3"), "a.mp3");
    assert_eq!(strip_path("D:\\data\\b.flac"), "b.flac");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LoggingConfig::default().format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LoggingConfig::default().format, LogFormat::Json);
}
