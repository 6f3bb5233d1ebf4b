//! OTLP protobuf encoding.
//!
//! Each `write_*_data` call encodes one export request body into a
//! caller-owned [`ProtoBuffer`] starting at a given offset, growing the buffer
//! when it runs short, and returns the offset just past the encoded bytes:
//!
//! ```
//! use lumen_lib::core::SdkLimits;
//! use lumen_lib::otlp::{write_trace_data, ProtoBuffer};
//!
//! let mut buffer = ProtoBuffer::new(1024);
//! let end = write_trace_data(&mut buffer, 0, &SdkLimits::default(), None, &[]).unwrap();
//! let request = &buffer.as_slice()[..end];
//! assert!(!request.is_empty());
//! ```

pub mod buffer;
pub mod common;
pub mod logs;
pub mod metrics;
pub mod trace;
pub mod wire;

pub use buffer::{ProtoBuffer, DEFAULT_MAX_SIZE};
pub use common::{AnyValue, InstrumentationScope, KeyValue, Resource};
pub use logs::{write_logs_data, LogRecordData, LogSeverity};
pub use metrics::{
    write_metrics_data, AggregationTemporality, HistogramDataPoint, MetricData, MetricKind,
    NumberDataPoint, NumberValue, SummaryDataPoint, ValueAtQuantile,
};
pub use trace::write_trace_data;
pub use wire::{ProtoWriter, WireType};
