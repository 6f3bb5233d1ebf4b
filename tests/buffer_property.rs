//! Property tests for the OTLP encoders' buffer handling.
//!
//! Whatever the initial buffer size or start offset, an encode must return
//! an end offset inside the buffer, leave the prefix untouched and produce
//! bytes the reference decoder accepts.

use lumen_lib::core::{LumenError, SdkLimits, SpanId, TraceId};
use lumen_lib::otlp::{
    write_logs_data, write_trace_data, AnyValue, KeyValue, LogRecordData, LogSeverity, ProtoBuffer,
};
use lumen_lib::trace::{SpanData, SpanEvent};
use opentelemetry_proto::tonic::collector::logs::v1::ExportLogsServiceRequest;
use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;
use prost::Message;
use proptest::prelude::*;
use std::time::{Duration, SystemTime};

fn span_strategy() -> impl Strategy<Value = SpanData> {
    (
        any::<[u8; 16]>(),
        any::<[u8; 8]>(),
        "[a-z/._-]{1,40}",
        prop::collection::vec(("[a-z.]{1,16}", ".{0,64}"), 0..8),
        0usize..4,
    )
        .prop_map(|(trace, span, name, attrs, events)| {
            let mut trace = trace;
            trace[0] |= 1;
            let mut span = span;
            span[0] |= 1;
            let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);
            let mut builder = SpanData::builder()
                .trace_id(TraceId::from_bytes(trace))
                .span_id(SpanId::from_bytes(span))
                .name(name)
                .start_time(start)
                .end_time(start + Duration::from_millis(3));
            for (k, v) in attrs {
                builder = builder.attribute(KeyValue::new(k, v));
            }
            for i in 0..events {
                builder = builder.event(SpanEvent::new(format!("e{}", i), start));
            }
            builder.build().unwrap()
        })
}

proptest! {
    /// Any batch fits, starting from any undersized buffer at any offset.
    #[test]
    fn prop_trace_encoding_grows_buffer(
        spans in prop::collection::vec(span_strategy(), 0..20),
        initial in 0usize..256,
        start_fraction in 0.0f64..=1.0,
    ) {
        let mut buffer = ProtoBuffer::new(initial);
        let start = (initial as f64 * start_fraction) as usize;
        let prefix = buffer.as_slice()[..start].to_vec();

        let end = write_trace_data(&mut buffer, start, &SdkLimits::default(), None, &spans).unwrap();

        prop_assert!(start <= end);
        prop_assert!(end <= buffer.len());
        prop_assert_eq!(&buffer.as_slice()[..start], &prefix[..]);

        let request = ExportTraceServiceRequest::decode(&buffer.as_slice()[start..end]).unwrap();
        let decoded: usize = request.resource_spans[0]
            .scope_spans
            .iter()
            .map(|s| s.spans.len())
            .sum();
        prop_assert_eq!(decoded, spans.len());
    }

    /// Length-limited log bodies never exceed the limit in chars.
    #[test]
    fn prop_log_body_truncation(
        bodies in prop::collection::vec(".{0,100}", 1..10),
        limit in 0usize..50,
    ) {
        let now = SystemTime::UNIX_EPOCH;
        let records: Vec<_> = bodies
            .iter()
            .map(|b| LogRecordData::new(LogSeverity::Info, AnyValue::from(b.as_str()), now))
            .collect();
        let limits = SdkLimits {
            attribute_value_length_limit: Some(limit),
            ..Default::default()
        };

        let mut buffer = ProtoBuffer::new(0);
        let end = write_logs_data(&mut buffer, 0, &limits, None, &records).unwrap();
        let request = ExportLogsServiceRequest::decode(&buffer.as_slice()[..end]).unwrap();
        let decoded = &request.resource_logs[0].scope_logs[0].log_records;

        prop_assert_eq!(decoded.len(), bodies.len());
        for (record, original) in decoded.iter().zip(&bodies) {
            use opentelemetry_proto::tonic::common::v1::any_value::Value;
            let body = match record.body.as_ref().and_then(|b| b.value.as_ref()) {
                Some(Value::StringValue(s)) => s.clone(),
                _ => String::new(),
            };
            prop_assert!(body.chars().count() <= limit);
            prop_assert!(original.starts_with(&body));
        }
    }
}

#[test]
fn test_growth_stops_at_max_size() {
    let spans: Vec<SpanData> = (0..50u8)
        .map(|i| {
            SpanData::builder()
                .trace_id(TraceId::from_bytes([i + 1; 16]))
                .span_id(SpanId::from_bytes([i + 1; 8]))
                .name("x".repeat(64))
                .build()
                .unwrap()
        })
        .collect();

    let mut buffer = ProtoBuffer::with_max_size(16, 512);
    let err = write_trace_data(&mut buffer, 0, &SdkLimits::default(), None, &spans).unwrap_err();
    assert!(matches!(err, LumenError::BufferLimitExceeded { limit: 512, .. }));
    assert!(buffer.len() <= 512);
}
