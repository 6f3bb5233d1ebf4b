//! Configuration system tests.

use lumen_lib::core::{Config, ConfigBuilder, LogLevel, LumenError, SdkLimits};
use lumen_lib::otlp::ProtoBuffer;
use lumen_lib::stats::Stats;
use pretty_assertions::assert_eq;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_default_config() {
    let config = Config::new().unwrap();
    assert_eq!(config.stats.queue_capacity, 8192);
    assert_eq!(config.stats.worker_name, "lumen-stats");
    assert_eq!(config.stats.flush_timeout, Duration::from_secs(5));
    assert_eq!(config.export.initial_buffer_size, 750_000);
    assert_eq!(config.export.max_buffer_size, 100 * 1024 * 1024);
    assert_eq!(config.limits, SdkLimits::default());
    assert_eq!(config.logging.level, LogLevel::Info);
}

#[test]
fn test_config_builder() {
    let config = ConfigBuilder::new()
        .queue_capacity(16)
        .flush_timeout(Duration::from_millis(250))
        .initial_buffer_size(1024)
        .max_buffer_size(4096)
        .log_level(LogLevel::Debug)
        .limits(SdkLimits {
            attribute_count_limit: Some(32),
            ..Default::default()
        })
        .build()
        .unwrap();

    assert_eq!(config.stats.queue_capacity, 16);
    assert_eq!(config.stats.flush_timeout, Duration::from_millis(250));
    assert_eq!(config.logging.level, LogLevel::Debug);
    assert_eq!(config.limits.span_attributes(), Some(32));

    let buffer = ProtoBuffer::from_config(&config.export);
    assert_eq!(buffer.len(), 1024);
    assert_eq!(buffer.max_size(), 4096);
}

#[test]
fn test_yaml_config_file() {
    let yaml = r#"
stats:
  queue_capacity: 1024
  worker_name: "metrics-worker"
  flush_timeout: 1s 500ms
limits:
  attribute_value_length_limit: 128
  attribute_count_limit: 64
  span_event_count_limit: 16
export:
  initial_buffer_size: 65536
logging:
  level: warn
  structured: true
"#;
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.stats.queue_capacity, 1024);
    assert_eq!(config.stats.worker_name, "metrics-worker");
    assert_eq!(config.stats.flush_timeout, Duration::from_millis(1500));
    assert_eq!(config.limits.attribute_value_length_limit, Some(128));
    assert_eq!(config.limits.span_events(), Some(16));
    assert_eq!(config.limits.log_attributes(), Some(64));
    assert_eq!(config.limits.span_link_count_limit, None);
    assert_eq!(config.export.initial_buffer_size, 65536);
    // unspecified fields keep their defaults
    assert_eq!(config.export.max_buffer_size, 100 * 1024 * 1024);
    assert_eq!(config.logging.level, LogLevel::Warn);
    assert!(config.logging.structured);

    // the loaded config drives a working stats component
    let stats = Stats::new(&config.stats).unwrap();
    stats.manager().flush().unwrap();
}

#[test]
fn test_invalid_yaml_rejected() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"stats:\n  queue_capacity: 0\n").unwrap();
    assert!(matches!(Config::from_file(file.path()), Err(LumenError::Config(_))));

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"stats: [not, a, map]\n").unwrap();
    assert!(matches!(Config::from_file(file.path()), Err(LumenError::Yaml(_))));
}

#[test]
fn test_missing_file() {
    let result = Config::from_file("/nonexistent/lumen.yaml");
    assert!(matches!(result, Err(LumenError::Io(_))));
}
