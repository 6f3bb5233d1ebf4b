//! Configuration management for lumen.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - Builder overrides
//! - Validation and defaults

use crate::core::{LumenError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Complete configuration for lumen
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stats pipeline configuration
    pub stats: StatsConfig,
    /// Attribute/event/link limits applied while encoding
    pub limits: SdkLimits,
    /// OTLP buffer configuration
    pub export: ExportConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Stats pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    /// Maximum number of queued recordings before new ones are dropped
    pub queue_capacity: usize,
    /// Name given to the background worker thread
    pub worker_name: String,
    /// Default deadline used by `StatsManager::flush`
    #[serde(with = "humantime_serde")]
    pub flush_timeout: Duration,
}

/// Attribute, event and link limits.
///
/// Every limit is optional; `None` means unlimited. Specific limits fall back
/// to `attribute_count_limit` when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SdkLimits {
    /// Maximum length (in chars) of string attribute values
    pub attribute_value_length_limit: Option<usize>,
    /// Default attribute count limit
    pub attribute_count_limit: Option<usize>,
    /// Attributes kept per span
    pub span_attribute_count_limit: Option<usize>,
    /// Events kept per span
    pub span_event_count_limit: Option<usize>,
    /// Links kept per span
    pub span_link_count_limit: Option<usize>,
    /// Attributes kept per span event
    pub span_event_attribute_count_limit: Option<usize>,
    /// Attributes kept per span link
    pub span_link_attribute_count_limit: Option<usize>,
    /// Attributes kept per log record
    pub log_record_attribute_count_limit: Option<usize>,
}

/// OTLP buffer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Initial size of the serialization buffer in bytes
    pub initial_buffer_size: usize,
    /// Hard cap for buffer growth in bytes
    pub max_buffer_size: usize,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
    /// Include targets, thread ids and line numbers
    pub structured: bool,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for StatsConfig {
    fn default() -> Self {
        StatsConfig {
            queue_capacity: 8192,
            worker_name: "lumen-stats".to_string(),
            flush_timeout: Duration::from_secs(5),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            initial_buffer_size: 750_000,
            max_buffer_size: 100 * 1024 * 1024, // 100 MiB
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
            structured: false,
        }
    }
}

impl SdkLimits {
    /// Effective attribute count limit for spans
    pub fn span_attributes(&self) -> Option<usize> {
        self.span_attribute_count_limit.or(self.attribute_count_limit)
    }

    /// Effective event count limit for spans
    pub fn span_events(&self) -> Option<usize> {
        self.span_event_count_limit
    }

    /// Effective link count limit for spans
    pub fn span_links(&self) -> Option<usize> {
        self.span_link_count_limit
    }

    /// Effective attribute count limit for span events
    pub fn event_attributes(&self) -> Option<usize> {
        self.span_event_attribute_count_limit
            .or(self.attribute_count_limit)
    }

    /// Effective attribute count limit for span links
    pub fn link_attributes(&self) -> Option<usize> {
        self.span_link_attribute_count_limit
            .or(self.attribute_count_limit)
    }

    /// Effective attribute count limit for log records
    pub fn log_attributes(&self) -> Option<usize> {
        self.log_record_attribute_count_limit
            .or(self.attribute_count_limit)
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!("Loaded configuration from: {:?}", path.as_ref());
        ConfigBuilder::new().from_yaml(&content)?.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.stats.queue_capacity == 0 {
            return Err(LumenError::config("queue_capacity must be greater than 0"));
        }

        if self.stats.worker_name.is_empty() {
            return Err(LumenError::config("worker_name must not be empty"));
        }

        if self.export.initial_buffer_size > self.export.max_buffer_size {
            return Err(LumenError::config(format!(
                "initial_buffer_size ({}) exceeds max_buffer_size ({})",
                self.export.initial_buffer_size, self.export.max_buffer_size
            )));
        }

        if self.export.max_buffer_size == 0 {
            return Err(LumenError::config("max_buffer_size must be greater than 0"));
        }

        Ok(())
    }
}

impl LogLevel {
    /// Filter directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration builder for fluent API
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)?;
        Ok(self)
    }

    /// Set the recording queue capacity
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.stats.queue_capacity = capacity;
        self
    }

    /// Set the flush deadline
    pub fn flush_timeout(mut self, timeout: Duration) -> Self {
        self.config.stats.flush_timeout = timeout;
        self
    }

    /// Replace the encoding limits
    pub fn limits(mut self, limits: SdkLimits) -> Self {
        self.config.limits = limits;
        self
    }

    /// Set the initial OTLP buffer size
    pub fn initial_buffer_size(mut self, size: usize) -> Self {
        self.config.export.initial_buffer_size = size;
        self
    }

    /// Set the OTLP buffer growth cap
    pub fn max_buffer_size(mut self, size: usize) -> Self {
        self.config.export.max_buffer_size = size;
        self
    }

    /// Set the log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_queue_capacity() {
        let mut config = Config::default();
        config.stats.queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_buffer_sizes() {
        let result = ConfigBuilder::new()
            .initial_buffer_size(4096)
            .max_buffer_size(1024)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .queue_capacity(16)
            .flush_timeout(Duration::from_millis(250))
            .initial_buffer_size(64)
            .log_level(LogLevel::Debug)
            .build()
            .unwrap();

        assert_eq!(config.stats.queue_capacity, 16);
        assert_eq!(config.stats.flush_timeout, Duration::from_millis(250));
        assert_eq!(config.export.initial_buffer_size, 64);
        assert_eq!(config.logging.level, LogLevel::Debug);
    }

    #[test]
    fn test_limit_fallbacks() {
        let limits = SdkLimits {
            attribute_count_limit: Some(8),
            span_attribute_count_limit: Some(4),
            ..SdkLimits::default()
        };
        assert_eq!(limits.span_attributes(), Some(4));
        assert_eq!(limits.event_attributes(), Some(8));
        assert_eq!(limits.log_attributes(), Some(8));
        assert_eq!(limits.span_events(), None);
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
stats:
  queue_capacity: 256
  flush_timeout: 2s
limits:
  attribute_value_length_limit: 64
  span_event_count_limit: 10
export:
  initial_buffer_size: 1024
logging:
  level: warn
  structured: true
"#;

        let config = ConfigBuilder::new().from_yaml(yaml).unwrap().build();

        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.stats.queue_capacity, 256);
        assert_eq!(config.stats.worker_name, "lumen-stats");
        assert_eq!(config.stats.flush_timeout, Duration::from_secs(2));
        assert_eq!(config.limits.attribute_value_length_limit, Some(64));
        assert_eq!(config.limits.span_events(), Some(10));
        assert_eq!(config.limits.attribute_count_limit, None);
        assert_eq!(config.export.initial_buffer_size, 1024);
        assert_eq!(config.export.max_buffer_size, 100 * 1024 * 1024);
        assert_eq!(config.logging.level, LogLevel::Warn);
        assert!(config.logging.structured);
    }
}
