//! Trace data model and head sampling.

pub mod sampler;
pub mod span;

pub use sampler::{ProbabilitySampler, Sampler, SamplingDecision};
pub use span::{SpanData, SpanDataBuilder, SpanEvent, SpanKind, SpanLink, Status};
