//! Tagging: keys, values, immutable tag contexts and their binary format.
//!
//! Contexts are passed explicitly to the recording APIs; there is no ambient
//! "current" context.

pub mod binary;
pub mod context;
pub mod tagger;

pub use binary::TagContextBinarySerializer;
pub use context::{Tag, TagContext, TagContextBuilder, TagKey, TagValue};
pub use tagger::{Tagger, Tags};
