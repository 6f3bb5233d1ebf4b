//! Binary propagation format for tag contexts.
//!
//! ```text
//! context := version_id tag*
//! version_id := 0x00
//! tag := 0x00 varint(len) key varint(len) value
//! ```
//!
//! Parsing stops at the first unknown field id; tags read up to that point
//! are kept.

use crate::core::{CollectionState, LumenError, Result, StateLatch};
use crate::tags::{TagContext, TagKey, TagValue};
use std::collections::BTreeMap;
use std::sync::Arc;

const VERSION_ID: u8 = 0;
const TAG_FIELD_ID: u8 = 0;

/// Maximum encoded size of a tag context, in bytes
pub const SERIALIZED_SIZE_LIMIT: usize = 8192;

/// Converts tag contexts to and from the binary propagation format.
#[derive(Debug, Clone)]
pub struct TagContextBinarySerializer {
    state: Arc<StateLatch<CollectionState>>,
}

impl TagContextBinarySerializer {
    pub(crate) fn new(state: Arc<StateLatch<CollectionState>>) -> Self {
        Self { state }
    }

    /// Encodes `ctx`. Returns empty bytes while tagging is disabled.
    pub fn to_bytes(&self, ctx: &TagContext) -> Result<Vec<u8>> {
        if self.state.get_internal() == CollectionState::Disabled {
            return Ok(Vec::new());
        }
        encode(ctx)
    }

    /// Decodes `bytes`. Returns the empty context while tagging is disabled.
    pub fn from_bytes(&self, bytes: &[u8]) -> Result<TagContext> {
        if self.state.get_internal() == CollectionState::Disabled {
            return Ok(TagContext::empty());
        }
        decode(bytes)
    }
}

fn encode(ctx: &TagContext) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(1 + ctx.len() * 16);
    out.push(VERSION_ID);
    for (key, value) in ctx.iter() {
        out.push(TAG_FIELD_ID);
        put_string(&mut out, key.as_str());
        put_string(&mut out, value.as_str());
        if out.len() > SERIALIZED_SIZE_LIMIT {
            return Err(LumenError::serialization(format!(
                "Size of TagContext exceeds the maximum serialized size {}",
                SERIALIZED_SIZE_LIMIT
            )));
        }
    }
    Ok(out)
}

fn decode(bytes: &[u8]) -> Result<TagContext> {
    if bytes.len() > SERIALIZED_SIZE_LIMIT {
        return Err(LumenError::deserialization(format!(
            "Size of TagContext exceeds the maximum serialized size {}",
            SERIALIZED_SIZE_LIMIT
        )));
    }
    let Some((&version, mut rest)) = bytes.split_first() else {
        return Ok(TagContext::empty());
    };
    if version != VERSION_ID {
        return Err(LumenError::deserialization(format!(
            "Wrong Version ID: {}. Currently supports version up to: {}",
            version, VERSION_ID
        )));
    }

    let mut tags = BTreeMap::new();
    while let Some((&field_id, tail)) = rest.split_first() {
        if field_id != TAG_FIELD_ID {
            // Unknown fields carry no length, nothing after them can be read
            break;
        }
        rest = tail;
        let key = take_string(&mut rest)?;
        let value = take_string(&mut rest)?;
        let key = TagKey::new(key).map_err(|e| LumenError::deserialization(e.to_string()))?;
        let value = TagValue::new(value).map_err(|e| LumenError::deserialization(e.to_string()))?;
        tags.insert(key, value);
    }

    Ok(tags
        .into_iter()
        .fold(TagContext::builder(), |builder, (k, v)| builder.put(k, v))
        .build())
}

fn put_varint(out: &mut Vec<u8>, mut value: u32) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

fn put_string(out: &mut Vec<u8>, s: &str) {
    put_varint(out, s.len() as u32);
    out.extend_from_slice(s.as_bytes());
}

fn take_varint(input: &mut &[u8]) -> Result<u32> {
    let mut value: u32 = 0;
    for shift in (0..35).step_by(7) {
        let Some((&byte, tail)) = input.split_first() else {
            return Err(LumenError::deserialization("Truncated varint"));
        };
        *input = tail;
        let bits = u32::from(byte & 0x7f);
        if shift == 28 && bits > 0x0f {
            return Err(LumenError::deserialization("Varint overflows 32 bits"));
        }
        value |= bits << shift;
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(LumenError::deserialization("Varint longer than 5 bytes"))
}

fn take_string(input: &mut &[u8]) -> Result<String> {
    let len = take_varint(input)? as usize;
    if len > input.len() {
        return Err(LumenError::deserialization(format!(
            "String length {} exceeds remaining {} bytes",
            len,
            input.len()
        )));
    }
    let (head, tail) = input.split_at(len);
    *input = tail;
    String::from_utf8(head.to_vec())
        .map_err(|_| LumenError::deserialization("Tag string is not valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::Tags;
    use pretty_assertions::assert_eq;

    fn serializer() -> TagContextBinarySerializer {
        Tags::new().binary_serializer()
    }

    fn ctx(pairs: &[(&str, &str)]) -> TagContext {
        pairs
            .iter()
            .fold(TagContext::builder(), |b, (k, v)| {
                b.put(TagKey::new(*k).unwrap(), TagValue::new(*v).unwrap())
            })
            .build()
    }

    #[test]
    fn test_round_trip_empty() {
        let s = serializer();
        let bytes = s.to_bytes(&TagContext::empty()).unwrap();
        assert_eq!(bytes, vec![0u8]);
        assert_eq!(s.from_bytes(&bytes).unwrap(), TagContext::empty());
    }

    #[test]
    fn test_round_trip_single_and_many() {
        let s = serializer();
        let one = ctx(&[("frontend", "mobile")]);
        assert_eq!(s.from_bytes(&s.to_bytes(&one).unwrap()).unwrap(), one);

        let many = ctx(&[("k1", "v1"), ("k2", ""), ("method", "GET"), ("z", "last")]);
        assert_eq!(s.from_bytes(&s.to_bytes(&many).unwrap()).unwrap(), many);
    }

    #[test]
    fn test_exact_encoding() {
        let bytes = serializer().to_bytes(&ctx(&[("k", "v")])).unwrap();
        assert_eq!(bytes, vec![0, 0, 1, b'k', 1, b'v']);
    }

    #[test]
    fn test_duplicate_keys_last_wins() {
        let bytes = vec![0, 0, 1, b'k', 1, b'a', 0, 1, b'k', 1, b'b'];
        let decoded = serializer().from_bytes(&bytes).unwrap();
        assert_eq!(decoded, ctx(&[("k", "b")]));
    }

    #[test]
    fn test_empty_input_is_empty_context() {
        assert_eq!(serializer().from_bytes(&[]).unwrap(), TagContext::empty());
    }

    #[test]
    fn test_wrong_version() {
        let err = serializer().from_bytes(&[1, 0, 1, b'k', 1, b'v']).unwrap_err();
        assert!(matches!(err, LumenError::Deserialization(_)));
    }

    #[test]
    fn test_unknown_field_stops_parsing() {
        let bytes = vec![0, 0, 1, b'k', 1, b'v', 7, 0xff, 0xff];
        assert_eq!(serializer().from_bytes(&bytes).unwrap(), ctx(&[("k", "v")]));
    }

    #[test]
    fn test_truncated_input() {
        let s = serializer();
        assert!(s.from_bytes(&[0, 0, 5, b'k']).is_err());
        assert!(s.from_bytes(&[0, 0, 1, b'k']).is_err());
        assert!(s.from_bytes(&[0, 0, 0x80]).is_err());
    }

    #[test]
    fn test_bad_varint() {
        let bytes = vec![0, 0, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
        assert!(serializer().from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_invalid_key_rejected() {
        // empty key
        assert!(serializer().from_bytes(&[0, 0, 0, 1, b'v']).is_err());
        // non-printable key
        assert!(serializer().from_bytes(&[0, 0, 1, 0x07, 1, b'v']).is_err());
    }

    #[test]
    fn test_size_limit() {
        let s = serializer();
        let oversized = vec![0u8; SERIALIZED_SIZE_LIMIT + 1];
        assert!(matches!(s.from_bytes(&oversized), Err(LumenError::Deserialization(_))));

        let mut builder = TagContext::builder();
        for i in 0..40 {
            builder = builder.put(
                TagKey::new(format!("key-{:03}", i)).unwrap(),
                TagValue::new("v".repeat(250)).unwrap(),
            );
        }
        let err = s.to_bytes(&builder.build()).unwrap_err();
        assert!(matches!(err, LumenError::Serialization(_)));
    }

    #[test]
    fn test_disabled_tagging() {
        let tags = Tags::new();
        tags.set_state(CollectionState::Disabled).unwrap();
        let s = tags.binary_serializer();
        assert!(s.to_bytes(&ctx(&[("k", "v")])).unwrap().is_empty());
        assert_eq!(s.from_bytes(&[0, 0, 1, b'k', 1, b'v']).unwrap(), TagContext::empty());
    }
}
