//! Views and view snapshots.

use crate::core::types::validate_name;
use crate::core::{LumenError, Result};
use crate::stats::aggregation::{Aggregation, MutableAggregation};
use crate::stats::measure::Measure;
use crate::tags::{TagContext, TagKey, TagValue};
use std::collections::{HashMap, HashSet};
use std::time::SystemTime;

/// Tag values of one row, aligned with the view's columns. `None` where the
/// recording context lacked the column's key.
pub type TagCombination = Vec<Option<TagValue>>;

/// How one measure is aggregated and broken down by tags.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    name: String,
    description: String,
    measure: Measure,
    aggregation: Aggregation,
    columns: Vec<TagKey>,
}

impl View {
    /// Fails when the name is not a valid printable ASCII name or when a
    /// column appears twice.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        measure: impl Into<Measure>,
        aggregation: Aggregation,
        columns: Vec<TagKey>,
    ) -> Result<Self> {
        let name = name.into();
        validate_name("View", &name)?;

        let mut seen = HashSet::with_capacity(columns.len());
        if let Some(dup) = columns.iter().find(|k| !seen.insert(*k)) {
            return Err(LumenError::invalid_argument(format!(
                "View '{}' has duplicate column '{}'",
                name, dup
            )));
        }

        Ok(Self {
            name,
            description: description.into(),
            measure: measure.into(),
            aggregation,
            columns,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn measure(&self) -> &Measure {
        &self.measure
    }

    pub fn aggregation(&self) -> &Aggregation {
        &self.aggregation
    }

    pub fn columns(&self) -> &[TagKey] {
        &self.columns
    }

    /// Projects `tags` onto this view's columns
    pub fn tag_combination(&self, tags: &TagContext) -> TagCombination {
        self.columns.iter().map(|k| tags.get(k).cloned()).collect()
    }
}

/// Point-in-time copy of a view's aggregated rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewData {
    pub view: View,
    pub rows: HashMap<TagCombination, MutableAggregation>,
    pub start: SystemTime,
    pub end: SystemTime,
    /// Processing time of the latest recording applied in this window
    pub last_update: Option<SystemTime>,
}

impl ViewData {
    /// Row for the given tag combination
    pub fn row(&self, combination: &[Option<TagValue>]) -> Option<&MutableAggregation> {
        self.rows.get(combination)
    }
}
