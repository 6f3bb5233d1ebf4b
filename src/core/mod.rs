//! Core building blocks shared by the stats, tagging and OTLP modules.
//!
//! Errors, configuration, logging setup, read-once state latches and the
//! trace/span identifier types live here.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;
pub mod otel_compliance;
pub mod state;
pub mod types;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder, ExportConfig, LogLevel, LoggingConfig, SdkLimits, StatsConfig};
pub use error::{LumenError, Result};
pub use state::{CollectionState, StateLatch};
pub use types::{SpanId, TraceId};
