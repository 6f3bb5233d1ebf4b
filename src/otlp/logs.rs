//! `ExportLogsServiceRequest` encoder.

use crate::core::otel_compliance::system_time_to_nanos;
use crate::core::{Result, SdkLimits, SpanId, TraceId};
use crate::otlp::buffer::ProtoBuffer;
use crate::otlp::common::{
    write_any_value, write_attributes, write_export_request, AnyValue, InstrumentationScope, KeyValue,
    Resource,
};
use crate::otlp::wire::ProtoWriter;
use std::time::SystemTime;

/// Log severity levels per OpenTelemetry specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum LogSeverity {
    #[default]
    Unspecified = 0,
    Trace = 1,
    Debug = 5,
    Info = 9,
    Warn = 13,
    Error = 17,
    Fatal = 21,
}

impl LogSeverity {
    /// Maps an OTLP severity number onto its range; out-of-range is Unspecified
    pub fn from_number(severity: i32) -> Self {
        match severity {
            1..=4 => Self::Trace,
            5..=8 => Self::Debug,
            9..=12 => Self::Info,
            13..=16 => Self::Warn,
            17..=20 => Self::Error,
            21..=24 => Self::Fatal,
            _ => Self::Unspecified,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "",
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }
}

/// A log record ready for export.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecordData {
    /// When the event happened, if known
    pub time: Option<SystemTime>,
    /// When the record was observed by the SDK
    pub observed_time: SystemTime,
    pub severity: LogSeverity,
    /// Overrides the default text derived from `severity`
    pub severity_text: Option<String>,
    pub body: Option<AnyValue>,
    pub attributes: Vec<KeyValue>,
    pub dropped_attributes_count: u32,
    pub flags: u32,
    pub trace_id: Option<TraceId>,
    pub span_id: Option<SpanId>,
    pub scope: InstrumentationScope,
}

impl LogRecordData {
    pub fn new(severity: LogSeverity, body: impl Into<AnyValue>, observed_time: SystemTime) -> Self {
        Self {
            time: None,
            observed_time,
            severity,
            severity_text: None,
            body: Some(body.into()),
            attributes: Vec::new(),
            dropped_attributes_count: 0,
            flags: 0,
            trace_id: None,
            span_id: None,
            scope: InstrumentationScope::default(),
        }
    }

    pub fn with_trace_context(mut self, trace_id: TraceId, span_id: SpanId) -> Self {
        self.trace_id = Some(trace_id);
        self.span_id = Some(span_id);
        self
    }

    pub fn with_attribute(mut self, attribute: KeyValue) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_scope(mut self, scope: InstrumentationScope) -> Self {
        self.scope = scope;
        self
    }
}

/// Encodes `records` at `start` and returns the offset past the last byte.
pub fn write_logs_data(
    buffer: &mut ProtoBuffer,
    start: usize,
    limits: &SdkLimits,
    resource: Option<&Resource>,
    records: &[LogRecordData],
) -> Result<usize> {
    write_export_request(
        buffer,
        start,
        limits,
        resource,
        records,
        |record| &record.scope,
        |w, record| write_log_record(w, record, limits),
    )
}

fn write_log_record(w: &mut ProtoWriter<'_>, record: &LogRecordData, limits: &SdkLimits) -> Result<()> {
    if let Some(time) = record.time {
        w.write_fixed64_field(1, system_time_to_nanos(time))?;
    }
    if record.severity != LogSeverity::Unspecified {
        w.write_uint64_field(2, record.severity as u64)?;
    }
    let text = record
        .severity_text
        .as_deref()
        .unwrap_or_else(|| record.severity.as_str());
    if !text.is_empty() {
        w.write_string_field(3, text)?;
    }
    if let Some(body) = &record.body {
        w.write_message(5, |w| write_any_value(w, body, limits.attribute_value_length_limit))?;
    }

    let dropped = write_attributes(
        w,
        6,
        &record.attributes,
        limits.log_attributes(),
        limits.attribute_value_length_limit,
    )?
    .saturating_add(record.dropped_attributes_count);
    if dropped > 0 {
        w.write_uint64_field(7, u64::from(dropped))?;
    }
    if record.flags != 0 {
        w.write_fixed32_field(8, record.flags)?;
    }
    if let Some(trace_id) = &record.trace_id {
        w.write_bytes_field(9, trace_id.as_bytes())?;
    }
    if let Some(span_id) = &record.span_id {
        w.write_bytes_field(10, span_id.as_bytes())?;
    }
    w.write_fixed64_field(11, system_time_to_nanos(record.observed_time))?;
    Ok(())
}
