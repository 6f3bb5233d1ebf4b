//! Registry routing measurements to the views that aggregate them.

use crate::core::{CollectionState, LumenError, Result};
use crate::stats::aggregation::MutableAggregation;
use crate::stats::measure::{Measure, Measurement};
use crate::stats::view::{TagCombination, View, ViewData};
use crate::tags::TagContext;
use std::collections::HashMap;
use std::time::SystemTime;

/// Live rows of one registered view.
#[derive(Debug)]
struct MutableViewData {
    view: View,
    rows: HashMap<TagCombination, MutableAggregation>,
    start: SystemTime,
    last_update: Option<SystemTime>,
}

impl MutableViewData {
    fn new(view: View, start: SystemTime) -> Self {
        Self {
            view,
            rows: HashMap::new(),
            start,
            last_update: None,
        }
    }

    fn record(&mut self, tags: &TagContext, value: f64, timestamp: SystemTime) {
        self.last_update = Some(timestamp);
        let combination = self.view.tag_combination(tags);
        let aggregation = self.view.aggregation();
        self.rows
            .entry(combination)
            .or_insert_with(|| MutableAggregation::new(aggregation))
            .add(value);
    }

    fn snapshot(&self, end: SystemTime) -> ViewData {
        ViewData {
            view: self.view.clone(),
            rows: self.rows.clone(),
            start: self.start,
            end,
            last_update: self.last_update,
        }
    }

    fn clear(&mut self) {
        self.rows.clear();
        self.last_update = None;
    }

    /// Opens a fresh window; rows from before the pause never carry over.
    fn resume(&mut self, now: SystemTime) {
        self.clear();
        self.start = now;
    }
}

/// Views grouped by measure name.
///
/// Not synchronized; the stats manager keeps it behind a mutex.
#[derive(Debug, Default)]
pub struct MeasureToViewMap {
    views_by_measure: HashMap<String, Vec<MutableViewData>>,
    registered_views: HashMap<String, View>,
    registered_measures: HashMap<String, Measure>,
}

impl MeasureToViewMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `view` with an empty window starting at `now`.
    ///
    /// Registering an identical view again is a no-op. A different view
    /// under the same name, or a view whose measure name is already bound to
    /// a different measure definition, is a [`LumenError::ViewConflict`].
    pub fn register_view(&mut self, view: View, now: SystemTime) -> Result<()> {
        if let Some(existing) = self.registered_views.get(view.name()) {
            if *existing == view {
                return Ok(());
            }
            return Err(LumenError::view_conflict(format!(
                "A different view with the same name '{}' is already registered",
                view.name()
            )));
        }

        let measure = view.measure();
        if let Some(registered) = self.registered_measures.get(measure.name()) {
            if registered != measure {
                return Err(LumenError::view_conflict(format!(
                    "A different measure with the same name '{}' is already registered",
                    measure.name()
                )));
            }
        } else {
            self.registered_measures
                .insert(measure.name().to_string(), measure.clone());
        }

        tracing::debug!(
            "Registered view '{}' on measure '{}' ({})",
            view.name(),
            measure.name(),
            view.aggregation().name()
        );
        self.registered_views
            .insert(view.name().to_string(), view.clone());
        self.views_by_measure
            .entry(measure.name().to_string())
            .or_default()
            .push(MutableViewData::new(view, now));
        Ok(())
    }

    /// Snapshot of a view's rows with `end = now`.
    ///
    /// While collection is disabled the snapshot is empty and both window
    /// bounds are the epoch.
    pub fn get_view(&self, name: &str, now: SystemTime, state: CollectionState) -> Option<ViewData> {
        let view = self.registered_views.get(name)?;
        let data = self
            .views_by_measure
            .get(view.measure().name())?
            .iter()
            .find(|d| d.view.name() == name)?;

        Some(match state {
            CollectionState::Enabled => data.snapshot(now),
            CollectionState::Disabled => ViewData {
                view: data.view.clone(),
                rows: HashMap::new(),
                start: SystemTime::UNIX_EPOCH,
                end: SystemTime::UNIX_EPOCH,
                last_update: None,
            },
        })
    }

    /// All registered views, in no particular order
    pub fn exported_views(&self) -> Vec<View> {
        self.registered_views.values().cloned().collect()
    }

    /// Applies each measurement to every view on its measure, stamping the
    /// touched views with `timestamp`.
    ///
    /// Measurements whose measure is unregistered are ignored. A measurement
    /// whose measure name is registered with a different definition is
    /// skipped and reported as an error once the rest have been applied.
    pub fn record(
        &mut self,
        tags: &TagContext,
        measurements: &[Measurement],
        timestamp: SystemTime,
    ) -> Result<()> {
        let mut mismatched: Vec<&str> = Vec::new();
        for measurement in measurements {
            let name = measurement.measure_name();
            let Some(registered) = self.registered_measures.get(name) else {
                continue;
            };
            if *registered != measurement.measure() {
                mismatched.push(name);
                continue;
            }
            if let Some(views) = self.views_by_measure.get_mut(name) {
                let value = measurement.value();
                for view in views.iter_mut() {
                    view.record(tags, value, timestamp);
                }
            }
        }

        if mismatched.is_empty() {
            Ok(())
        } else {
            Err(LumenError::invalid_argument(format!(
                "Measurement definitions do not match registered measures: {}",
                mismatched.join(", ")
            )))
        }
    }

    /// Drops every aggregated row; views stay registered.
    pub fn clear_stats(&mut self) {
        for view in self.views_by_measure.values_mut().flatten() {
            view.clear();
        }
    }

    /// Opens a fresh window starting at `now` for every view.
    pub fn resume_stats_collection(&mut self, now: SystemTime) {
        for view in self.views_by_measure.values_mut().flatten() {
            view.resume(now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::aggregation::Aggregation;
    use crate::stats::measure::{MeasureDouble, MeasureLong};
    use crate::tags::{TagKey, TagValue};
    use std::time::Duration;

    fn t(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn key() -> TagKey {
        TagKey::new("method").unwrap()
    }

    fn tags(method: &str) -> TagContext {
        TagContext::builder()
            .put(key(), TagValue::new(method).unwrap())
            .build()
    }

    fn latency() -> MeasureDouble {
        MeasureDouble::new("latency", "Latency", "ms").unwrap()
    }

    fn sum_view(name: &str) -> View {
        View::new(name, "", latency(), Aggregation::Sum, vec![key()]).unwrap()
    }

    #[test]
    fn test_register_idempotent_and_conflicts() {
        let mut map = MeasureToViewMap::new();
        map.register_view(sum_view("v"), t(1)).unwrap();
        map.register_view(sum_view("v"), t(2)).unwrap();
        assert_eq!(map.exported_views().len(), 1);

        let different = View::new("v", "", latency(), Aggregation::Count, vec![]).unwrap();
        assert!(matches!(
            map.register_view(different, t(3)),
            Err(LumenError::ViewConflict(_))
        ));

        let other_def = MeasureLong::new("latency", "Latency", "ms").unwrap();
        let conflicting = View::new("v2", "", other_def, Aggregation::Sum, vec![]).unwrap();
        assert!(matches!(
            map.register_view(conflicting, t(3)),
            Err(LumenError::ViewConflict(_))
        ));
    }

    #[test]
    fn test_record_groups_rows_by_tags() {
        let mut map = MeasureToViewMap::new();
        map.register_view(sum_view("v"), t(1)).unwrap();

        let m = latency();
        map.record(&tags("GET"), &[Measurement::Double(m.clone(), 1.0)], t(2))
            .unwrap();
        map.record(&tags("GET"), &[Measurement::Double(m.clone(), 2.0)], t(3))
            .unwrap();
        map.record(&TagContext::empty(), &[Measurement::Double(m, 5.0)], t(4))
            .unwrap();

        let data = map.get_view("v", t(10), CollectionState::Enabled).unwrap();
        assert_eq!(data.start, t(1));
        assert_eq!(data.end, t(10));
        assert_eq!(data.last_update, Some(t(4)));
        assert_eq!(data.rows.len(), 2);
        match data.row(&[Some(TagValue::new("GET").unwrap())]) {
            Some(MutableAggregation::Sum(s)) => assert_eq!(s.sum(), 3.0),
            other => panic!("unexpected row {:?}", other),
        }
        match data.row(&[None]) {
            Some(MutableAggregation::Sum(s)) => assert_eq!(s.sum(), 5.0),
            other => panic!("unexpected row {:?}", other),
        }
    }

    #[test]
    fn test_record_mismatched_definition_is_reported() {
        let mut map = MeasureToViewMap::new();
        map.register_view(sum_view("v"), t(1)).unwrap();
        let impostor = MeasureDouble::new("latency", "Other", "s").unwrap();
        let result = map.record(
            &tags("GET"),
            &[
                Measurement::Double(impostor, 9.0),
                Measurement::Double(latency(), 1.0),
            ],
            t(2),
        );
        assert!(result.is_err());
        let data = map.get_view("v", t(2), CollectionState::Enabled).unwrap();
        assert_eq!(data.rows.len(), 1);
    }

    #[test]
    fn test_unregistered_measure_ignored() {
        let mut map = MeasureToViewMap::new();
        let m = MeasureDouble::new("nobody", "", "1").unwrap();
        map.record(&tags("GET"), &[Measurement::Double(m, 1.0)], t(1))
            .unwrap();
        assert!(map.get_view("v", t(1), CollectionState::Enabled).is_none());
    }

    #[test]
    fn test_disabled_snapshot_and_resume() {
        let mut map = MeasureToViewMap::new();
        map.register_view(sum_view("v"), t(1)).unwrap();
        map.record(&tags("GET"), &[Measurement::Double(latency(), 1.0)], t(2))
            .unwrap();

        let disabled = map.get_view("v", t(5), CollectionState::Disabled).unwrap();
        assert!(disabled.rows.is_empty());
        assert_eq!(disabled.start, SystemTime::UNIX_EPOCH);
        assert_eq!(disabled.end, SystemTime::UNIX_EPOCH);

        map.clear_stats();
        map.resume_stats_collection(t(7));
        let data = map.get_view("v", t(8), CollectionState::Enabled).unwrap();
        assert!(data.rows.is_empty());
        assert_eq!(data.start, t(7));
        assert_eq!(data.last_update, None);
    }
}
