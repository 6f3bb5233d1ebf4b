//! Finished-span data handed to the OTLP trace encoder.

use crate::core::{LumenError, Result, SpanId, TraceId};
use crate::otlp::common::{InstrumentationScope, KeyValue};
use std::time::SystemTime;

/// Role of a span in a trace; numbering follows OTLP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum SpanKind {
    #[default]
    Unspecified = 0,
    Internal = 1,
    Server = 2,
    Client = 3,
    Producer = 4,
    Consumer = 5,
}

/// Outcome of a span.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Unset,
    Ok,
    Error(String),
}

impl Status {
    /// OTLP status code
    pub fn code(&self) -> u8 {
        match self {
            Status::Unset => 0,
            Status::Ok => 1,
            Status::Error(_) => 2,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Status::Error(msg) if !msg.is_empty() => Some(msg),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error(_))
    }
}

/// Timestamped annotation on a span.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanEvent {
    pub time: SystemTime,
    pub name: String,
    pub attributes: Vec<KeyValue>,
    pub dropped_attributes_count: u32,
}

impl SpanEvent {
    pub fn new(name: impl Into<String>, time: SystemTime) -> Self {
        Self {
            time,
            name: name.into(),
            attributes: Vec::new(),
            dropped_attributes_count: 0,
        }
    }

    pub fn with_attribute(mut self, attribute: KeyValue) -> Self {
        self.attributes.push(attribute);
        self
    }
}

/// Reference to a span in this or another trace.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanLink {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub trace_state: String,
    pub attributes: Vec<KeyValue>,
    pub dropped_attributes_count: u32,
    pub flags: u32,
}

impl SpanLink {
    pub fn new(trace_id: TraceId, span_id: SpanId) -> Self {
        Self {
            trace_id,
            span_id,
            trace_state: String::new(),
            attributes: Vec::new(),
            dropped_attributes_count: 0,
            flags: 0,
        }
    }
}

/// A completed span.
///
/// `dropped_*_count` fields carry what was already dropped upstream; the
/// encoder adds whatever its own limits cut.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanData {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: Option<SpanId>,
    pub trace_state: String,
    pub name: String,
    pub kind: SpanKind,
    pub start_time: SystemTime,
    pub end_time: SystemTime,
    pub attributes: Vec<KeyValue>,
    pub dropped_attributes_count: u32,
    pub events: Vec<SpanEvent>,
    pub dropped_events_count: u32,
    pub links: Vec<SpanLink>,
    pub dropped_links_count: u32,
    pub status: Status,
    /// W3C trace flags (bit 0 = sampled)
    pub flags: u32,
    pub scope: InstrumentationScope,
}

impl SpanData {
    pub fn builder() -> SpanDataBuilder {
        SpanDataBuilder::default()
    }

    pub fn is_root(&self) -> bool {
        self.parent_span_id.is_none()
    }
}

#[derive(Debug, Default)]
pub struct SpanDataBuilder {
    trace_id: Option<TraceId>,
    span_id: Option<SpanId>,
    parent_span_id: Option<SpanId>,
    trace_state: String,
    name: Option<String>,
    kind: SpanKind,
    start_time: Option<SystemTime>,
    end_time: Option<SystemTime>,
    attributes: Vec<KeyValue>,
    events: Vec<SpanEvent>,
    links: Vec<SpanLink>,
    status: Status,
    flags: u32,
    scope: InstrumentationScope,
}

impl SpanDataBuilder {
    pub fn trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn span_id(mut self, span_id: SpanId) -> Self {
        self.span_id = Some(span_id);
        self
    }

    pub fn parent_span_id(mut self, parent_span_id: SpanId) -> Self {
        self.parent_span_id = Some(parent_span_id);
        self
    }

    pub fn trace_state<S: Into<String>>(mut self, trace_state: S) -> Self {
        self.trace_state = trace_state.into();
        self
    }

    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn kind(mut self, kind: SpanKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn start_time(mut self, start_time: SystemTime) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn end_time(mut self, end_time: SystemTime) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn attribute(mut self, attribute: KeyValue) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn event(mut self, event: SpanEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn link(mut self, link: SpanLink) -> Self {
        self.links.push(link);
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn scope(mut self, scope: InstrumentationScope) -> Self {
        self.scope = scope;
        self
    }

    /// Trace id, span id and name are required. A missing end time equals
    /// the start time; a missing start time is now.
    pub fn build(self) -> Result<SpanData> {
        let trace_id = self
            .trace_id
            .filter(TraceId::is_valid)
            .ok_or_else(|| LumenError::invalid_argument("a valid trace_id is required"))?;
        let span_id = self
            .span_id
            .filter(SpanId::is_valid)
            .ok_or_else(|| LumenError::invalid_argument("a valid span_id is required"))?;
        let name = self
            .name
            .ok_or_else(|| LumenError::invalid_argument("span name is required"))?;
        let start_time = self.start_time.unwrap_or_else(SystemTime::now);

        Ok(SpanData {
            trace_id,
            span_id,
            parent_span_id: self.parent_span_id,
            trace_state: self.trace_state,
            name,
            kind: self.kind,
            start_time,
            end_time: self.end_time.unwrap_or(start_time),
            attributes: self.attributes,
            dropped_attributes_count: 0,
            events: self.events,
            dropped_events_count: 0,
            links: self.links,
            dropped_links_count: 0,
            status: self.status,
            flags: self.flags,
            scope: self.scope,
        })
    }
}
