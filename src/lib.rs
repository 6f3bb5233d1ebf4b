//! Lumen - stats aggregation and OTLP encoding core for telemetry SDKs.
//!
//! Lumen turns application measurements into aggregated views and encodes
//! spans, metrics and logs as OTLP protobuf export requests.
//!
//! # Features
//!
//! - **Streaming Aggregation**: Sum, Count, Mean, Distribution and LastValue
//!   with Welford variance and parallel merge
//! - **Non-blocking Recording**: bounded queue drained by a background worker
//! - **Tagging**: immutable tag contexts with a compact binary propagation format
//! - **OTLP Encoding**: single-pass protobuf writer over a growable buffer,
//!   with SDK attribute/event/link limits
//!
//! # Architecture
//!
//! - `core`: errors, configuration, logging setup, state latches, ids
//! - `tags`: tag keys/values, contexts, binary format
//! - `stats`: measures, views, aggregations, the recording pipeline
//! - `trace`: span data model and head sampling
//! - `otlp`: protobuf encoders for traces, metrics and logs
//!
//! # Example
//!
//! ```no_run
//! use lumen_lib::core::Config;
//! use lumen_lib::stats::{Aggregation, BucketBoundaries, MeasureLong, Stats, View};
//! use lumen_lib::tags::{TagContext, TagKey, TagValue};
//!
//! fn main() -> lumen_lib::Result<()> {
//!     let config = Config::default();
//!     let stats = Stats::new(&config.stats)?;
//!
//!     let video_size = MeasureLong::new("video_size", "size of processed videos", "By")?;
//!     let frontend = TagKey::new("frontend")?;
//!     let bounds = BucketBoundaries::new(vec![0.0, 16.0 * 1048576.0, 256.0 * 1048576.0])?;
//!     stats.view_manager().register_view(View::new(
//!         "video_size_distribution",
//!         "",
//!         video_size.clone(),
//!         Aggregation::Distribution(bounds),
//!         vec![frontend.clone()],
//!     )?)?;
//!
//!     let tags = TagContext::builder()
//!         .put(frontend, TagValue::new("mobile")?)
//!         .build();
//!     stats
//!         .recorder()
//!         .new_measure_map()
//!         .put_long(&video_size, 25 * 1048576)
//!         .record(&tags)?;
//!     stats.manager().flush()?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod core;
pub mod otlp;
pub mod stats;
pub mod tags;
pub mod trace;

// Re-export core types for convenience
pub use crate::core::{Config, LumenError, Result};
