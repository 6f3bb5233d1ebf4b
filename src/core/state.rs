//! Read-once state holders for stats collection and tagging.
//!
//! A [`StateLatch`] may be reconfigured only until the first public read.
//! Components share the latch as an `Arc` handle handed in at construction.

use crate::core::{LumenError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Whether a component collects/propagates data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionState {
    /// Normal operation
    #[default]
    Enabled,
    /// Recording and propagation are no-ops
    Disabled,
}

#[derive(Debug)]
struct Inner<S> {
    value: S,
    read: bool,
}

/// Holder whose value is frozen once it has been observed.
#[derive(Debug)]
pub struct StateLatch<S: Copy + PartialEq> {
    inner: Mutex<Inner<S>>,
}

impl<S: Copy + PartialEq> StateLatch<S> {
    /// Create a latch holding `initial`
    pub fn new(initial: S) -> Self {
        Self {
            inner: Mutex::new(Inner {
                value: initial,
                read: false,
            }),
        }
    }

    /// Returns the current value and freezes it against further `set` calls.
    pub fn get(&self) -> S {
        let mut inner = self.inner.lock();
        inner.read = true;
        inner.value
    }

    /// Returns the current value without freezing it.
    pub fn get_internal(&self) -> S {
        self.inner.lock().value
    }

    /// Replaces the value, returning whether it changed.
    ///
    /// Fails with [`LumenError::StateAlreadyRead`] once [`get`](Self::get)
    /// has been called; the stored value is left untouched in that case.
    pub fn set(&self, value: S) -> Result<bool> {
        let mut inner = self.inner.lock();
        if inner.read {
            return Err(LumenError::StateAlreadyRead);
        }
        let changed = inner.value != value;
        inner.value = value;
        Ok(changed)
    }

    /// True once a public read has happened
    pub fn is_read(&self) -> bool {
        self.inner.lock().read
    }
}

impl<S: Copy + PartialEq + Default> Default for StateLatch<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}
