//! Tagging component and tag-context factory.

use crate::core::{CollectionState, Result, StateLatch};
use crate::tags::{TagContext, TagContextBinarySerializer, TagContextBuilder};
use std::sync::Arc;

/// Owner of the tagging state; hands out taggers and serializers bound to it.
#[derive(Debug, Clone, Default)]
pub struct Tags {
    state: Arc<StateLatch<CollectionState>>,
}

impl Tags {
    /// Tagging component with its own state, initially enabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Tagging component bound to an existing state handle
    pub fn with_state(state: Arc<StateLatch<CollectionState>>) -> Self {
        Self { state }
    }

    pub fn tagger(&self) -> Tagger {
        Tagger {
            state: Arc::clone(&self.state),
        }
    }

    pub fn binary_serializer(&self) -> TagContextBinarySerializer {
        TagContextBinarySerializer::new(Arc::clone(&self.state))
    }

    /// Reads the tagging state. Once read, it can no longer be changed.
    pub fn state(&self) -> CollectionState {
        self.state.get()
    }

    /// Changes the tagging state; fails after the state has been read.
    pub fn set_state(&self, state: CollectionState) -> Result<()> {
        if self.state.set(state)? {
            tracing::info!("Tagging state changed to {:?}", state);
        }
        Ok(())
    }
}

/// Creates tag contexts. While tagging is disabled every context it produces
/// is empty.
#[derive(Debug, Clone)]
pub struct Tagger {
    state: Arc<StateLatch<CollectionState>>,
}

impl Tagger {
    fn disabled(&self) -> bool {
        self.state.get_internal() == CollectionState::Disabled
    }

    pub fn empty(&self) -> TagContext {
        TagContext::empty()
    }

    pub fn empty_builder(&self) -> TagContextBuilder {
        if self.disabled() {
            TagContextBuilder::noop()
        } else {
            TagContext::builder()
        }
    }

    /// Builder seeded with `ctx`'s tags
    pub fn to_builder(&self, ctx: &TagContext) -> TagContextBuilder {
        if self.disabled() {
            TagContextBuilder::noop()
        } else {
            ctx.to_builder()
        }
    }
}
