//! Streaming aggregations.
//!
//! [`MutableAggregation`] is a closed set of five accumulators. Exporters
//! render them with an exhaustive `match`; adding a sixth kind is a compile
//! error everywhere one is consumed.
//!
//! All accumulators are single-writer: the stats worker owns them while a
//! window is open, so none of them synchronize internally.

use crate::core::{LumenError, Result};
use crate::stats::bucket::BucketBoundaries;

/// Tolerance under which a combine fraction counts as 1.0.
pub const FRACTION_TOLERANCE: f64 = 1e-6;

/// Aggregation a view applies to its measure.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregation {
    Sum,
    Count,
    Mean,
    Distribution(BucketBoundaries),
    LastValue,
}

impl Aggregation {
    pub fn name(&self) -> &'static str {
        match self {
            Aggregation::Sum => "Sum",
            Aggregation::Count => "Count",
            Aggregation::Mean => "Mean",
            Aggregation::Distribution(_) => "Distribution",
            Aggregation::LastValue => "LastValue",
        }
    }
}

/// Running total.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutableSum {
    sum: f64,
}

impl MutableSum {
    #[inline]
    pub fn add(&mut self, value: f64) {
        self.sum += value;
    }

    pub fn combine(&mut self, other: &MutableSum, fraction: f64) {
        self.sum += fraction * other.sum;
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }
}

/// Number of recorded values; the values themselves are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutableCount {
    count: u64,
}

impl MutableCount {
    #[inline]
    pub fn add(&mut self, _value: f64) {
        self.count += 1;
    }

    pub fn combine(&mut self, other: &MutableCount, fraction: f64) {
        self.count += scaled_count(other.count, fraction);
    }

    pub fn count(&self) -> u64 {
        self.count
    }
}

/// Sum, count and extremes.
#[derive(Debug, Clone, PartialEq)]
pub struct MutableMean {
    sum: f64,
    count: u64,
    min: f64,
    max: f64,
}

impl Default for MutableMean {
    fn default() -> Self {
        Self {
            sum: 0.0,
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl MutableMean {
    #[inline]
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn combine(&mut self, other: &MutableMean, fraction: f64) {
        self.count += scaled_count(other.count, fraction);
        self.sum += fraction * other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// `sum / count`, or 0 when nothing was recorded
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    /// +inf when nothing was recorded
    pub fn min(&self) -> f64 {
        self.min
    }

    /// -inf when nothing was recorded
    pub fn max(&self) -> f64 {
        self.max
    }
}

/// Histogram with streaming mean and variance.
///
/// `mean` and `sum_of_squared_deviations` follow Welford's online update and
/// are never recomputed from `sum / count`, which loses precision on long
/// streams.
#[derive(Debug, Clone, PartialEq)]
pub struct MutableDistribution {
    sum: f64,
    count: u64,
    mean: f64,
    sum_of_squared_deviations: f64,
    min: f64,
    max: f64,
    boundaries: BucketBoundaries,
    bucket_counts: Vec<u64>,
}

impl MutableDistribution {
    pub fn new(boundaries: BucketBoundaries) -> Self {
        Self {
            sum: 0.0,
            count: 0,
            mean: 0.0,
            sum_of_squared_deviations: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            bucket_counts: vec![0; boundaries.bucket_count()],
            boundaries,
        }
    }

    #[inline]
    pub fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.sum_of_squared_deviations += delta * delta2;

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let bucket = self.boundaries.bucket_index(value);
        self.bucket_counts[bucket] += 1;
    }

    /// Merges another distribution over the same boundaries.
    ///
    /// Only whole operands are merged: a `fraction` further than
    /// [`FRACTION_TOLERANCE`] from 1.0 leaves `self` untouched. Differing
    /// boundaries are an argument error whatever the fraction.
    pub fn combine(&mut self, other: &MutableDistribution, fraction: f64) -> Result<()> {
        if self.boundaries != other.boundaries {
            return Err(LumenError::invalid_argument(
                "Bucket boundaries of combined distributions must match",
            ));
        }
        if (fraction - 1.0).abs() > FRACTION_TOLERANCE {
            return Ok(());
        }
        if other.count == 0 {
            return Ok(());
        }

        let count_a = self.count as f64;
        let count_b = other.count as f64;
        let total = count_a + count_b;
        let delta = other.mean - self.mean;

        self.sum_of_squared_deviations += other.sum_of_squared_deviations
            + delta * delta * count_a * count_b / total;
        self.mean += delta * count_b / total;
        self.count += other.count;
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);

        for (mine, theirs) in self.bucket_counts.iter_mut().zip(&other.bucket_counts) {
            *mine += theirs;
        }
        Ok(())
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn sum_of_squared_deviations(&self) -> f64 {
        self.sum_of_squared_deviations
    }

    /// Sample variance; 0 with fewer than two values
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.sum_of_squared_deviations / (self.count - 1) as f64
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn boundaries(&self) -> &BucketBoundaries {
        &self.boundaries
    }

    pub fn bucket_counts(&self) -> &[u64] {
        &self.bucket_counts
    }
}

/// Most recent value.
#[derive(Debug, Clone, PartialEq)]
pub struct MutableLastValue {
    value: f64,
    initialized: bool,
}

impl Default for MutableLastValue {
    fn default() -> Self {
        Self {
            value: f64::NAN,
            initialized: false,
        }
    }
}

impl MutableLastValue {
    #[inline]
    pub fn add(&mut self, value: f64) {
        self.value = value;
        self.initialized = true;
    }

    /// `other` is assumed to be the newer of the two.
    pub fn combine(&mut self, other: &MutableLastValue, _fraction: f64) {
        if other.initialized {
            self.value = other.value;
            self.initialized = true;
        }
    }

    /// NaN until something is recorded
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

/// One of the five streaming accumulators.
#[derive(Debug, Clone, PartialEq)]
pub enum MutableAggregation {
    Sum(MutableSum),
    Count(MutableCount),
    Mean(MutableMean),
    Distribution(MutableDistribution),
    LastValue(MutableLastValue),
}

impl MutableAggregation {
    /// Empty accumulator for `aggregation`
    pub fn new(aggregation: &Aggregation) -> Self {
        match aggregation {
            Aggregation::Sum => Self::Sum(MutableSum::default()),
            Aggregation::Count => Self::Count(MutableCount::default()),
            Aggregation::Mean => Self::Mean(MutableMean::default()),
            Aggregation::Distribution(bounds) => {
                Self::Distribution(MutableDistribution::new(bounds.clone()))
            },
            Aggregation::LastValue => Self::LastValue(MutableLastValue::default()),
        }
    }

    /// Incorporates a recorded value. Never fails.
    #[inline]
    pub fn add(&mut self, value: f64) {
        match self {
            Self::Sum(a) => a.add(value),
            Self::Count(a) => a.add(value),
            Self::Mean(a) => a.add(value),
            Self::Distribution(a) => a.add(value),
            Self::LastValue(a) => a.add(value),
        }
    }

    /// Merges `fraction` of `other` into `self`.
    ///
    /// Fails with [`LumenError::AggregationMismatch`] when `other` is a
    /// different kind.
    pub fn combine(&mut self, other: &MutableAggregation, fraction: f64) -> Result<()> {
        match (&mut *self, other) {
            (Self::Sum(a), Self::Sum(b)) => a.combine(b, fraction),
            (Self::Count(a), Self::Count(b)) => a.combine(b, fraction),
            (Self::Mean(a), Self::Mean(b)) => a.combine(b, fraction),
            (Self::Distribution(a), Self::Distribution(b)) => a.combine(b, fraction)?,
            (Self::LastValue(a), Self::LastValue(b)) => a.combine(b, fraction),
            _ => {
                return Err(LumenError::AggregationMismatch {
                    expected: self.kind_name(),
                    found: other.kind_name(),
                })
            },
        }
        Ok(())
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Sum(_) => "Sum",
            Self::Count(_) => "Count",
            Self::Mean(_) => "Mean",
            Self::Distribution(_) => "Distribution",
            Self::LastValue(_) => "LastValue",
        }
    }
}

#[inline]
fn scaled_count(count: u64, fraction: f64) -> u64 {
    (fraction * count as f64).round().max(0.0) as u64
}
