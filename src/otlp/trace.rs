//! `ExportTraceServiceRequest` encoder.

use crate::core::otel_compliance::system_time_to_nanos;
use crate::core::{Result, SdkLimits};
use crate::otlp::buffer::ProtoBuffer;
use crate::otlp::common::{saturating_count, write_attributes, write_export_request, Resource};
use crate::otlp::wire::ProtoWriter;
use crate::trace::{SpanData, SpanEvent, SpanLink};

/// Encodes `spans` at `start` and returns the offset past the last byte.
///
/// Attribute, event and link counts are cut to `limits`; whatever is cut is
/// added to the matching `dropped_*_count`.
pub fn write_trace_data(
    buffer: &mut ProtoBuffer,
    start: usize,
    limits: &SdkLimits,
    resource: Option<&Resource>,
    spans: &[SpanData],
) -> Result<usize> {
    write_export_request(
        buffer,
        start,
        limits,
        resource,
        spans,
        |span| &span.scope,
        |w, span| write_span(w, span, limits),
    )
}

fn keep(len: usize, limit: Option<usize>) -> usize {
    limit.map_or(len, |l| l.min(len))
}

fn write_span(w: &mut ProtoWriter<'_>, span: &SpanData, limits: &SdkLimits) -> Result<()> {
    w.write_bytes_field(1, span.trace_id.as_bytes())?;
    w.write_bytes_field(2, span.span_id.as_bytes())?;
    if !span.trace_state.is_empty() {
        w.write_string_field(3, &span.trace_state)?;
    }
    if let Some(parent) = &span.parent_span_id {
        w.write_bytes_field(4, parent.as_bytes())?;
    }
    w.write_string_field(5, &span.name)?;
    if span.kind as u8 != 0 {
        w.write_uint64_field(6, span.kind as u64)?;
    }
    w.write_fixed64_field(7, system_time_to_nanos(span.start_time))?;
    w.write_fixed64_field(8, system_time_to_nanos(span.end_time))?;

    let dropped_attributes = write_attributes(
        w,
        9,
        &span.attributes,
        limits.span_attributes(),
        limits.attribute_value_length_limit,
    )?
    .saturating_add(span.dropped_attributes_count);
    if dropped_attributes > 0 {
        w.write_uint64_field(10, u64::from(dropped_attributes))?;
    }

    let events = keep(span.events.len(), limits.span_events());
    for event in &span.events[..events] {
        w.write_message(11, |w| write_event(w, event, limits))?;
    }
    let dropped_events = saturating_count(span.events.len() - events).saturating_add(span.dropped_events_count);
    if dropped_events > 0 {
        w.write_uint64_field(12, u64::from(dropped_events))?;
    }

    let links = keep(span.links.len(), limits.span_links());
    for link in &span.links[..links] {
        w.write_message(13, |w| write_link(w, link, limits))?;
    }
    let dropped_links = saturating_count(span.links.len() - links).saturating_add(span.dropped_links_count);
    if dropped_links > 0 {
        w.write_uint64_field(14, u64::from(dropped_links))?;
    }

    let status = &span.status;
    if status.code() != 0 || status.message().is_some() {
        w.write_message(15, |w| {
            if let Some(message) = status.message() {
                w.write_string_field(2, message)?;
            }
            if status.code() != 0 {
                w.write_uint64_field(3, u64::from(status.code()))?;
            }
            Ok(())
        })?;
    }

    if span.flags != 0 {
        w.write_fixed32_field(16, span.flags)?;
    }
    Ok(())
}

fn write_event(w: &mut ProtoWriter<'_>, event: &SpanEvent, limits: &SdkLimits) -> Result<()> {
    w.write_fixed64_field(1, system_time_to_nanos(event.time))?;
    w.write_string_field(2, &event.name)?;
    let dropped = write_attributes(
        w,
        3,
        &event.attributes,
        limits.event_attributes(),
        limits.attribute_value_length_limit,
    )?
    .saturating_add(event.dropped_attributes_count);
    if dropped > 0 {
        w.write_uint64_field(4, u64::from(dropped))?;
    }
    Ok(())
}

fn write_link(w: &mut ProtoWriter<'_>, link: &SpanLink, limits: &SdkLimits) -> Result<()> {
    w.write_bytes_field(1, link.trace_id.as_bytes())?;
    w.write_bytes_field(2, link.span_id.as_bytes())?;
    if !link.trace_state.is_empty() {
        w.write_string_field(3, &link.trace_state)?;
    }
    let dropped = write_attributes(
        w,
        4,
        &link.attributes,
        limits.link_attributes(),
        limits.attribute_value_length_limit,
    )?
    .saturating_add(link.dropped_attributes_count);
    if dropped > 0 {
        w.write_uint64_field(5, u64::from(dropped))?;
    }
    if link.flags != 0 {
        w.write_fixed32_field(6, link.flags)?;
    }
    Ok(())
}
