//! Growable byte buffer backing the OTLP encoders.

use crate::core::{ExportConfig, LumenError, Result};

/// Default hard cap on buffer growth (100 MiB)
pub const DEFAULT_MAX_SIZE: usize = 100 * 1024 * 1024;

const MIN_SIZE: usize = 64;

/// Byte buffer whose whole length is writable.
///
/// Writers grow it through [`ensure_capacity`](Self::ensure_capacity); it
/// never shrinks. Bytes past the last write offset are unspecified.
#[derive(Debug, Clone)]
pub struct ProtoBuffer {
    data: Vec<u8>,
    max_size: usize,
}

impl ProtoBuffer {
    pub fn new(initial_size: usize) -> Self {
        Self::with_max_size(initial_size, DEFAULT_MAX_SIZE)
    }

    /// Buffer that refuses to grow past `max_size`. The initial size is
    /// clamped to the cap.
    pub fn with_max_size(initial_size: usize, max_size: usize) -> Self {
        Self {
            data: vec![0; initial_size.min(max_size)],
            max_size,
        }
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        Self::with_max_size(config.initial_buffer_size, config.max_buffer_size)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Grows the buffer to at least `required` bytes.
    ///
    /// The new length is `max(2 * len, required, 64)`, capped at the max
    /// size. Existing contents are preserved.
    pub fn ensure_capacity(&mut self, required: usize) -> Result<()> {
        if required <= self.data.len() {
            return Ok(());
        }
        if required > self.max_size {
            return Err(LumenError::BufferLimitExceeded {
                required,
                limit: self.max_size,
            });
        }
        let new_len = (self.data.len().saturating_mul(2))
            .max(required)
            .max(MIN_SIZE)
            .min(self.max_size);
        tracing::trace!("Growing OTLP buffer {} -> {} bytes", self.data.len(), new_len);
        self.data.resize(new_len, 0);
        Ok(())
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

impl Default for ProtoBuffer {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}
