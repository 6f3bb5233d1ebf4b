//! Attributes, resources and instrumentation scopes, plus the
//! resource/scope envelope shared by the three export requests.

use crate::core::otel_compliance::attributes;
use crate::core::{Result, SdkLimits};
use crate::otlp::buffer::ProtoBuffer;
use crate::otlp::wire::ProtoWriter;

/// Attribute or log body value.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyValue {
    String(String),
    Bool(bool),
    Int(i64),
    Double(f64),
    Array(Vec<AnyValue>),
    KvList(Vec<KeyValue>),
    Bytes(Vec<u8>),
}

impl From<&str> for AnyValue {
    fn from(v: &str) -> Self {
        AnyValue::String(v.to_string())
    }
}

impl From<String> for AnyValue {
    fn from(v: String) -> Self {
        AnyValue::String(v)
    }
}

impl From<bool> for AnyValue {
    fn from(v: bool) -> Self {
        AnyValue::Bool(v)
    }
}

impl From<i64> for AnyValue {
    fn from(v: i64) -> Self {
        AnyValue::Int(v)
    }
}

impl From<f64> for AnyValue {
    fn from(v: f64) -> Self {
        AnyValue::Double(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyValue {
    pub key: String,
    pub value: AnyValue,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<AnyValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Entity producing the telemetry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resource {
    pub attributes: Vec<KeyValue>,
    pub dropped_attributes_count: u32,
    pub schema_url: Option<String>,
}

impl Resource {
    pub fn new(attributes: Vec<KeyValue>) -> Self {
        Self {
            attributes,
            ..Default::default()
        }
    }

    /// Resource naming the service and this SDK
    pub fn for_service(service_name: impl Into<String>) -> Self {
        Self::new(vec![
            KeyValue::new(attributes::SERVICE_NAME, service_name.into()),
            KeyValue::new(attributes::TELEMETRY_SDK_NAME, "lumen"),
            KeyValue::new(attributes::TELEMETRY_SDK_LANGUAGE, "rust"),
            KeyValue::new(attributes::TELEMETRY_SDK_VERSION, env!("CARGO_PKG_VERSION")),
        ])
    }
}

/// Library that produced a span, metric or log record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstrumentationScope {
    pub name: String,
    pub version: Option<String>,
    pub attributes: Vec<KeyValue>,
    pub schema_url: Option<String>,
}

impl InstrumentationScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Cuts `s` to at most `limit` chars, on a char boundary.
pub(crate) fn truncate_chars(s: &str, limit: Option<usize>) -> &str {
    match limit {
        Some(limit) => match s.char_indices().nth(limit) {
            Some((end, _)) => &s[..end],
            None => s,
        },
        None => s,
    }
}

/// Writes an `AnyValue` body. `value_limit` truncates strings, including
/// the string elements of arrays, but not strings nested in kv-lists.
pub(crate) fn write_any_value(w: &mut ProtoWriter<'_>, value: &AnyValue, value_limit: Option<usize>) -> Result<()> {
    match value {
        AnyValue::String(s) => w.write_string_field(1, truncate_chars(s, value_limit)),
        AnyValue::Bool(b) => w.write_bool_field(2, *b),
        AnyValue::Int(i) => w.write_int64_field(3, *i),
        AnyValue::Double(d) => w.write_double_field(4, *d),
        AnyValue::Array(items) => w.write_message(5, |w| {
            for item in items {
                w.write_message(1, |w| write_any_value(w, item, value_limit))?;
            }
            Ok(())
        }),
        AnyValue::KvList(kvs) => w.write_message(6, |w| {
            for kv in kvs {
                w.write_message(1, |w| write_key_value(w, kv, None))?;
            }
            Ok(())
        }),
        AnyValue::Bytes(b) => w.write_bytes_field(7, b),
    }
}

fn write_key_value(w: &mut ProtoWriter<'_>, kv: &KeyValue, value_limit: Option<usize>) -> Result<()> {
    w.write_string_field(1, &kv.key)?;
    w.write_message(2, |w| write_any_value(w, &kv.value, value_limit))
}

/// Writes up to `count_limit` attributes as repeated `field`, returning how
/// many were left out.
pub(crate) fn write_attributes(
    w: &mut ProtoWriter<'_>,
    field: u32,
    attributes: &[KeyValue],
    count_limit: Option<usize>,
    value_limit: Option<usize>,
) -> Result<u32> {
    let kept = count_limit.map_or(attributes.len(), |l| l.min(attributes.len()));
    for kv in &attributes[..kept] {
        w.write_message(field, |w| write_key_value(w, kv, value_limit))?;
    }
    Ok(saturating_count(attributes.len() - kept))
}

/// Dropped-item count as carried on the wire; saturates at `u32::MAX`.
pub(crate) fn saturating_count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn write_resource(w: &mut ProtoWriter<'_>, resource: &Resource) -> Result<()> {
    write_attributes(w, 1, &resource.attributes, None, None)?;
    if resource.dropped_attributes_count > 0 {
        w.write_uint64_field(2, u64::from(resource.dropped_attributes_count))?;
    }
    Ok(())
}

fn write_scope(w: &mut ProtoWriter<'_>, scope: &InstrumentationScope, limits: &SdkLimits) -> Result<()> {
    if !scope.name.is_empty() {
        w.write_string_field(1, &scope.name)?;
    }
    if let Some(version) = &scope.version {
        w.write_string_field(2, version)?;
    }
    let dropped = write_attributes(
        w,
        3,
        &scope.attributes,
        limits.attribute_count_limit,
        limits.attribute_value_length_limit,
    )?;
    if dropped > 0 {
        w.write_uint64_field(4, u64::from(dropped))?;
    }
    Ok(())
}

/// Groups `items` by scope, scopes in first-seen order and items in input
/// order within a scope.
fn group_by_scope<'a, T>(
    items: &'a [T],
    scope_of: impl Fn(&T) -> &InstrumentationScope,
) -> Vec<(&'a InstrumentationScope, Vec<&'a T>)> {
    let mut groups: Vec<(&InstrumentationScope, Vec<&T>)> = Vec::new();
    for item in items {
        let scope = scope_of(item);
        match groups.iter_mut().find(|(s, _)| *s == scope) {
            Some((_, members)) => members.push(item),
            None => groups.push((scope, vec![item])),
        }
    }
    groups
}

/// Writes an `Export*ServiceRequest` body holding one `Resource*` entry at
/// `start`, returning the offset past the last written byte.
///
/// The three OTLP signals share the shape
/// `request { 1: resource_x { 1: resource, 2: scope_x { 1: scope, 2: item, 3: schema_url }, 3: schema_url } }`,
/// so only the item encoding differs.
pub(crate) fn write_export_request<T, F>(
    buffer: &mut ProtoBuffer,
    start: usize,
    limits: &SdkLimits,
    resource: Option<&Resource>,
    items: &[T],
    scope_of: impl Fn(&T) -> &InstrumentationScope,
    mut write_item: F,
) -> Result<usize>
where
    F: FnMut(&mut ProtoWriter<'_>, &T) -> Result<()>,
{
    let mut w = ProtoWriter::new(buffer, start)?;
    let groups = group_by_scope(items, scope_of);

    w.write_message(1, |w| {
        if let Some(resource) = resource {
            w.write_message(1, |w| write_resource(w, resource))?;
        }
        for (scope, members) in &groups {
            w.write_message(2, |w| {
                w.write_message(1, |w| write_scope(w, scope, limits))?;
                for item in members {
                    w.write_message(2, |w| write_item(w, item))?;
                }
                if let Some(url) = &scope.schema_url {
                    w.write_string_field(3, url)?;
                }
                Ok(())
            })?;
        }
        if let Some(url) = resource.and_then(|r| r.schema_url.as_deref()) {
            w.write_string_field(3, url)?;
        }
        Ok(())
    })?;

    Ok(w.position())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", None), "hello");
        assert_eq!(truncate_chars("hello", Some(3)), "hel");
        assert_eq!(truncate_chars("hello", Some(10)), "hello");
        assert_eq!(truncate_chars("h\u{e9}llo", Some(2)), "h\u{e9}");
        assert_eq!(truncate_chars("abc", Some(0)), "");
    }

    #[test]
    fn test_service_resource() {
        let r = Resource::for_service("checkout");
        assert_eq!(r.attributes[0], KeyValue::new("service.name", "checkout"));
        assert!(r.attributes.iter().any(|kv| kv.key == "telemetry.sdk.language"));
    }

    #[test]
    fn test_group_by_scope_first_seen_order() {
        let a = InstrumentationScope::new("a");
        let b = InstrumentationScope::new("b");
        let items = vec![(1, a.clone()), (2, b.clone()), (3, a.clone())];
        let groups = group_by_scope(&items, |(_, s)| s);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, &a);
        assert_eq!(groups[0].1.iter().map(|(n, _)| *n).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(groups[1].0, &b);
    }

    #[test]
    fn test_attribute_count_limit() {
        let mut buf = ProtoBuffer::new(0);
        let mut w = ProtoWriter::new(&mut buf, 0).unwrap();
        let attrs = vec![
            KeyValue::new("a", 1i64),
            KeyValue::new("b", true),
            KeyValue::new("c", "x"),
        ];
        assert_eq!(write_attributes(&mut w, 1, &attrs, Some(1), None).unwrap(), 2);
        assert_eq!(write_attributes(&mut w, 1, &attrs, None, None).unwrap(), 0);
        assert_eq!(write_attributes(&mut w, 1, &attrs, Some(5), None).unwrap(), 0);
    }
}
