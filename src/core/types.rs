use crate::core::error::{LumenError, Result};
use std::fmt;

/// Unique identifier for a trace (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TraceId([u8; 16]);

/// Unique identifier for a span within a trace (8 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SpanId([u8; 8]);

impl TraceId {
    /// The all-zero, invalid trace id
    pub const INVALID: TraceId = TraceId([0; 16]);

    /// Creates a TraceId from raw bytes
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        TraceId(bytes)
    }

    /// Parses 32 lowercase or uppercase hex characters
    pub fn from_hex(hex_id: &str) -> Result<Self> {
        let mut bytes = [0u8; 16];
        hex::decode_to_slice(hex_id, &mut bytes).map_err(|e| {
            LumenError::invalid_argument(format!("TraceId '{}' is not 32 hex chars: {}", hex_id, e))
        })?;
        Ok(TraceId(bytes))
    }

    /// Returns the raw bytes
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Returns the lowercase hex representation
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// A trace id is valid when at least one byte is non-zero
    pub fn is_valid(&self) -> bool {
        self.0 != [0; 16]
    }

    /// Lower 8 bytes interpreted big-endian, used for ratio sampling
    pub fn low_u64(&self) -> u64 {
        let mut low = [0u8; 8];
        low.copy_from_slice(&self.0[8..]);
        u64::from_be_bytes(low)
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl SpanId {
    /// The all-zero, invalid span id
    pub const INVALID: SpanId = SpanId([0; 8]);

    /// Creates a SpanId from raw bytes
    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        SpanId(bytes)
    }

    /// Parses 16 hex characters
    pub fn from_hex(hex_id: &str) -> Result<Self> {
        let mut bytes = [0u8; 8];
        hex::decode_to_slice(hex_id, &mut bytes).map_err(|e| {
            LumenError::invalid_argument(format!("SpanId '{}' is not 16 hex chars: {}", hex_id, e))
        })?;
        Ok(SpanId(bytes))
    }

    /// Returns the raw bytes
    pub fn as_bytes(&self) -> &[u8; 8] {
        &self.0
    }

    /// Returns the lowercase hex representation
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// A span id is valid when at least one byte is non-zero
    pub fn is_valid(&self) -> bool {
        self.0 != [0; 8]
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Names of measures and views: printable ASCII, at most this many chars.
pub const NAME_MAX_LENGTH: usize = 255;

/// True if every char is printable ASCII (space through tilde)
pub fn is_printable(s: &str) -> bool {
    s.bytes().all(|b| (b' '..=b'~').contains(&b))
}

/// Validates a measure or view name.
pub(crate) fn validate_name(kind: &str, name: &str) -> Result<()> {
    if name.len() > NAME_MAX_LENGTH {
        return Err(LumenError::invalid_argument(format!(
            "{} name cannot exceed {} characters, got {}",
            kind,
            NAME_MAX_LENGTH,
            name.len()
        )));
    }
    if !is_printable(name) {
        return Err(LumenError::invalid_argument(format!(
            "{} name '{}' must be printable ASCII",
            kind,
            name.escape_default()
        )));
    }
    Ok(())
}
