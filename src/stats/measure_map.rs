//! Batches of measurements recorded against one tag context.

use crate::core::Result;
use crate::stats::manager::StatsRecorder;
use crate::stats::measure::{MeasureDouble, MeasureLong, Measurement};
use crate::tags::TagContext;

/// Measurements collected with `put_*` and recorded together.
///
/// Putting the same measure twice keeps only the later value.
#[derive(Debug, Clone)]
#[must_use = "a MeasureMap records nothing until `record` is called"]
pub struct MeasureMap {
    recorder: StatsRecorder,
    measurements: Vec<Measurement>,
}

impl MeasureMap {
    pub(crate) fn new(recorder: StatsRecorder) -> Self {
        Self {
            recorder,
            measurements: Vec::new(),
        }
    }

    pub fn put_double(mut self, measure: &MeasureDouble, value: f64) -> Self {
        self.measurements
            .push(Measurement::Double(measure.clone(), value));
        self
    }

    pub fn put_long(mut self, measure: &MeasureLong, value: i64) -> Self {
        self.measurements.push(Measurement::Long(measure.clone(), value));
        self
    }

    /// Measurements that would be recorded, after deduplication
    pub fn measurements(&self) -> Vec<Measurement> {
        let mut measurements = self.measurements.clone();
        dedup_last_wins(&mut measurements);
        measurements
    }

    /// Hands the deduplicated measurements to the stats pipeline.
    ///
    /// See [`StatsRecorder::record`] for the failure modes.
    pub fn record(mut self, tags: &TagContext) -> Result<()> {
        if self.measurements.is_empty() {
            return Ok(());
        }
        dedup_last_wins(&mut self.measurements);
        self.recorder.record(tags, self.measurements)
    }
}

/// Removes every measurement shadowed by a later one for the same measure.
/// Survivors keep their relative order.
fn dedup_last_wins(measurements: &mut Vec<Measurement>) {
    let mut i = measurements.len();
    while i > 0 {
        i -= 1;
        let mut j = i;
        while j > 0 {
            j -= 1;
            if measurements[j].same_measure(&measurements[i]) {
                measurements.remove(j);
                i -= 1;
            }
        }
    }
}
