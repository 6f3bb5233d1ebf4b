//! Tag keys, values and immutable tag contexts.

use crate::core::types::{is_printable, NAME_MAX_LENGTH};
use crate::core::{LumenError, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Key of a tag: non-empty printable ASCII, at most 255 chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagKey(String);

/// Value of a tag: printable ASCII, at most 255 chars, may be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagValue(String);

impl TagKey {
    /// Maximum key length
    pub const MAX_LENGTH: usize = NAME_MAX_LENGTH;

    /// Creates a TagKey after validation
    pub fn new<S: Into<String>>(name: S) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(LumenError::invalid_argument("TagKey cannot be empty"));
        }
        if name.len() > Self::MAX_LENGTH || !is_printable(&name) {
            return Err(LumenError::invalid_argument(format!(
                "Invalid TagKey '{}': must be printable ASCII of at most {} chars",
                name.escape_default(),
                Self::MAX_LENGTH
            )));
        }
        Ok(TagKey(name))
    }

    /// Returns the key name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TagValue {
    /// Maximum value length
    pub const MAX_LENGTH: usize = NAME_MAX_LENGTH;

    /// Creates a TagValue after validation
    pub fn new<S: Into<String>>(value: S) -> Result<Self> {
        let value = value.into();
        if value.len() > Self::MAX_LENGTH || !is_printable(&value) {
            return Err(LumenError::invalid_argument(format!(
                "Invalid TagValue '{}': must be printable ASCII of at most {} chars",
                value.escape_default(),
                Self::MAX_LENGTH
            )));
        }
        Ok(TagValue(value))
    }

    /// Returns the value string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single key/value pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub key: TagKey,
    pub value: TagValue,
}

impl Tag {
    pub fn new(key: TagKey, value: TagValue) -> Self {
        Self { key, value }
    }
}

/// Immutable set of tags; each key appears at most once.
///
/// Equality ignores insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TagContext {
    tags: BTreeMap<TagKey, TagValue>,
}

impl TagContext {
    /// The context with no tags
    pub fn empty() -> Self {
        Self::default()
    }

    /// Start building a context
    pub fn builder() -> TagContextBuilder {
        TagContextBuilder::default()
    }

    /// Builder pre-populated with this context's tags
    pub fn to_builder(&self) -> TagContextBuilder {
        TagContextBuilder {
            tags: self.tags.clone(),
            noop: false,
        }
    }

    /// Looks up the value for a key
    pub fn get(&self, key: &TagKey) -> Option<&TagValue> {
        self.tags.get(key)
    }

    /// Iterates tags in key order
    pub fn iter(&self) -> impl Iterator<Item = (&TagKey, &TagValue)> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

impl FromIterator<Tag> for TagContext {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        let mut tags = BTreeMap::new();
        for tag in iter {
            tags.insert(tag.key, tag.value);
        }
        TagContext { tags }
    }
}

/// Builder for [`TagContext`]. Later puts for the same key win.
#[derive(Debug, Clone, Default)]
pub struct TagContextBuilder {
    tags: BTreeMap<TagKey, TagValue>,
    noop: bool,
}

impl TagContextBuilder {
    /// Builder that ignores puts and always builds the empty context.
    /// Handed out while tagging is disabled.
    pub(crate) fn noop() -> Self {
        Self {
            tags: BTreeMap::new(),
            noop: true,
        }
    }

    pub fn put(mut self, key: TagKey, value: TagValue) -> Self {
        if !self.noop {
            self.tags.insert(key, value);
        }
        self
    }

    pub fn remove(mut self, key: &TagKey) -> Self {
        self.tags.remove(key);
        self
    }

    pub fn build(self) -> TagContext {
        TagContext { tags: self.tags }
    }
}
