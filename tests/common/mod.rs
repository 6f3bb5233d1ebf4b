//! Common test utilities and fixtures.

#![allow(dead_code)]

use lumen_lib::core::{SpanId, TraceId};
use lumen_lib::otlp::{InstrumentationScope, KeyValue};
use lumen_lib::trace::{SpanData, SpanEvent, SpanKind, SpanLink, Status};
use std::time::{Duration, SystemTime};

/// Fixed base time so encoded timestamps are reproducible.
pub fn base_time() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
}

pub fn trace_id(n: u8) -> TraceId {
    TraceId::from_hex(&format!("{:032x}", u128::from(n) + 1)).unwrap()
}

pub fn span_id(n: u8) -> SpanId {
    SpanId::from_hex(&format!("{:016x}", u64::from(n) + 1)).unwrap()
}

/// Test fixture builder for spans with sensible defaults.
pub struct TestSpanBuilder {
    num: u8,
    attributes: usize,
    events: usize,
    links: usize,
    scope: String,
    error: Option<String>,
}

impl TestSpanBuilder {
    pub fn new(num: u8) -> Self {
        Self {
            num,
            attributes: 0,
            events: 0,
            links: 0,
            scope: "test-scope".to_string(),
            error: None,
        }
    }

    pub fn attributes(mut self, n: usize) -> Self {
        self.attributes = n;
        self
    }

    pub fn events(mut self, n: usize) -> Self {
        self.events = n;
        self
    }

    pub fn links(mut self, n: usize) -> Self {
        self.links = n;
        self
    }

    pub fn scope(mut self, scope: &str) -> Self {
        self.scope = scope.to_string();
        self
    }

    pub fn with_error(mut self, message: &str) -> Self {
        self.error = Some(message.to_string());
        self
    }

    pub fn build(self) -> SpanData {
        let start = base_time() + Duration::from_millis(u64::from(self.num));
        let mut builder = SpanData::builder()
            .trace_id(trace_id(self.num))
            .span_id(span_id(self.num))
            .name(format!("span-{}", self.num))
            .kind(SpanKind::Server)
            .start_time(start)
            .end_time(start + Duration::from_millis(25))
            .scope(InstrumentationScope::new(self.scope).with_version("1.0.0"));

        for i in 0..self.attributes {
            builder = builder.attribute(KeyValue::new(format!("attr.{}", i), i as i64));
        }
        for i in 0..self.events {
            builder = builder.event(
                SpanEvent::new(format!("event-{}", i), start)
                    .with_attribute(KeyValue::new("event.index", i as i64)),
            );
        }
        for i in 0..self.links {
            builder = builder.link(SpanLink::new(trace_id(200), span_id(i as u8)));
        }
        if let Some(message) = self.error {
            builder = builder.status(Status::Error(message));
        }

        builder.build().unwrap()
    }
}

/// Generate `count` plain spans in one scope.
pub fn generate_spans(count: u8) -> Vec<SpanData> {
    (0..count).map(|n| TestSpanBuilder::new(n).build()).collect()
}
