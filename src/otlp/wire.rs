//! Protobuf primitives over a [`ProtoBuffer`].
//!
//! Nested messages are written in one pass: four bytes are reserved for the
//! length, the body is written, and the length is backfilled as a padded
//! varint. That caps a single nested message at 2^28 - 1 bytes.

use crate::core::{LumenError, Result};
use crate::otlp::buffer::ProtoBuffer;

/// Largest body a 4-byte padded length can describe
pub const MAX_NESTED_SIZE: usize = (1 << 28) - 1;

const LENGTH_RESERVATION: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    Len = 2,
    Fixed32 = 5,
}

/// Cursor writing protobuf fields into a buffer, growing it as needed.
#[derive(Debug)]
pub struct ProtoWriter<'a> {
    buf: &'a mut ProtoBuffer,
    pos: usize,
}

impl<'a> ProtoWriter<'a> {
    /// Fails with [`LumenError::InvalidArgument`] when `start` lies past the
    /// end of the buffer.
    pub fn new(buf: &'a mut ProtoBuffer, start: usize) -> Result<Self> {
        if start > buf.len() {
            return Err(LumenError::invalid_argument(format!(
                "Start offset {} is past the end of a {} byte buffer",
                start,
                buf.len()
            )));
        }
        Ok(Self { buf, pos: start })
    }

    /// Offset just past the last written byte
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.pos + bytes.len();
        self.buf.ensure_capacity(end)?;
        self.buf.as_mut_slice()[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }

    pub fn write_varint(&mut self, mut value: u64) -> Result<()> {
        let mut scratch = [0u8; 10];
        let mut n = 0;
        while value >= 0x80 {
            scratch[n] = (value as u8 & 0x7f) | 0x80;
            value >>= 7;
            n += 1;
        }
        scratch[n] = value as u8;
        self.write_raw(&scratch[..=n])
    }

    #[inline]
    pub fn write_tag(&mut self, field: u32, wire_type: WireType) -> Result<()> {
        self.write_varint(u64::from(field << 3 | wire_type as u32))
    }

    pub fn write_uint64_field(&mut self, field: u32, value: u64) -> Result<()> {
        self.write_tag(field, WireType::Varint)?;
        self.write_varint(value)
    }

    /// `int32`/`int64`/enum: negatives take ten bytes, no zigzag
    pub fn write_int64_field(&mut self, field: u32, value: i64) -> Result<()> {
        self.write_uint64_field(field, value as u64)
    }

    pub fn write_bool_field(&mut self, field: u32, value: bool) -> Result<()> {
        self.write_uint64_field(field, u64::from(value))
    }

    pub fn write_fixed64_field(&mut self, field: u32, value: u64) -> Result<()> {
        self.write_tag(field, WireType::Fixed64)?;
        self.write_raw(&value.to_le_bytes())
    }

    pub fn write_sfixed64_field(&mut self, field: u32, value: i64) -> Result<()> {
        self.write_tag(field, WireType::Fixed64)?;
        self.write_raw(&value.to_le_bytes())
    }

    pub fn write_fixed32_field(&mut self, field: u32, value: u32) -> Result<()> {
        self.write_tag(field, WireType::Fixed32)?;
        self.write_raw(&value.to_le_bytes())
    }

    pub fn write_double_field(&mut self, field: u32, value: f64) -> Result<()> {
        self.write_tag(field, WireType::Fixed64)?;
        self.write_raw(&value.to_le_bytes())
    }

    pub fn write_bytes_field(&mut self, field: u32, value: &[u8]) -> Result<()> {
        self.write_tag(field, WireType::Len)?;
        self.write_varint(value.len() as u64)?;
        self.write_raw(value)
    }

    pub fn write_string_field(&mut self, field: u32, value: &str) -> Result<()> {
        self.write_bytes_field(field, value.as_bytes())
    }

    /// Packed `repeated fixed64`
    pub fn write_packed_fixed64(&mut self, field: u32, values: &[u64]) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        self.write_tag(field, WireType::Len)?;
        self.write_varint((values.len() * 8) as u64)?;
        for v in values {
            self.write_raw(&v.to_le_bytes())?;
        }
        Ok(())
    }

    /// Packed `repeated double`
    pub fn write_packed_double(&mut self, field: u32, values: &[f64]) -> Result<()> {
        if values.is_empty() {
            return Ok(());
        }
        self.write_tag(field, WireType::Len)?;
        self.write_varint((values.len() * 8) as u64)?;
        for v in values {
            self.write_raw(&v.to_le_bytes())?;
        }
        Ok(())
    }

    /// Writes a length-delimited sub-message whose body is produced by
    /// `body`, backfilling the length once it is known.
    pub fn write_message<F>(&mut self, field: u32, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.write_tag(field, WireType::Len)?;
        let length_at = self.pos;
        self.write_raw(&[0; LENGTH_RESERVATION])?;
        let body_start = self.pos;

        body(self)?;

        let len = self.pos - body_start;
        if len > MAX_NESTED_SIZE {
            return Err(LumenError::MessageTooLarge(len));
        }
        let len = len as u32;
        let padded = [
            (len & 0x7f) as u8 | 0x80,
            ((len >> 7) & 0x7f) as u8 | 0x80,
            ((len >> 14) & 0x7f) as u8 | 0x80,
            ((len >> 21) & 0x7f) as u8,
        ];
        self.buf.as_mut_slice()[length_at..body_start].copy_from_slice(&padded);
        Ok(())
    }
}
