//! Stats recording and aggregation.
//!
//! Measurements are recorded against a [`TagContext`](crate::tags::TagContext),
//! queued, and folded by a background worker into the rows of every
//! registered [`View`] on the same measure.

pub mod aggregation;
pub mod bucket;
pub mod clock;
pub mod manager;
pub mod measure;
pub mod measure_map;
pub mod view;
pub mod view_map;

pub use aggregation::{
    Aggregation, MutableAggregation, MutableCount, MutableDistribution, MutableLastValue,
    MutableMean, MutableSum,
};
pub use bucket::BucketBoundaries;
pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::{Stats, StatsManager, StatsManagerStats, StatsRecorder, ViewManager};
pub use measure::{Measure, MeasureDouble, MeasureLong, Measurement};
pub use measure_map::MeasureMap;
pub use view::{TagCombination, View, ViewData};
pub use view_map::MeasureToViewMap;
