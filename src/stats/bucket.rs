//! Histogram bucket boundaries.

use crate::core::{LumenError, Result};
use std::sync::Arc;

/// Strictly ascending bucket edges.
///
/// N boundaries define N+1 buckets:
/// `(-inf, b0), [b0, b1), ..., [bN-1, +inf)`.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketBoundaries {
    bounds: Arc<[f64]>,
}

impl BucketBoundaries {
    /// Validates and wraps the edges. An empty list yields a single bucket.
    pub fn new(bounds: Vec<f64>) -> Result<Self> {
        if let Some(nan) = bounds.iter().position(|b| b.is_nan()) {
            return Err(LumenError::invalid_argument(format!(
                "Bucket boundary at index {} is NaN",
                nan
            )));
        }
        if let Some(i) = bounds.windows(2).position(|w| w[0] >= w[1]) {
            return Err(LumenError::invalid_argument(format!(
                "Bucket boundaries not strictly ascending: {} >= {} at index {}",
                bounds[i],
                bounds[i + 1],
                i
            )));
        }
        Ok(Self {
            bounds: bounds.into(),
        })
    }

    pub fn bounds(&self) -> &[f64] {
        &self.bounds
    }

    /// Number of buckets (boundaries + 1)
    pub fn bucket_count(&self) -> usize {
        self.bounds.len() + 1
    }

    /// Index of the bucket containing `value`.
    ///
    /// Linear scan: the first boundary strictly greater than `value` wins, so
    /// a value equal to a boundary lands in the upper bucket.
    #[inline]
    pub fn bucket_index(&self, value: f64) -> usize {
        self.bounds
            .iter()
            .position(|&b| value < b)
            .unwrap_or(self.bounds.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_placement() {
        let b = BucketBoundaries::new(vec![0.0, 10.0, 100.0]).unwrap();
        let placed: Vec<usize> = [-5.0, 0.0, 5.0, 10.0, 50.0, 200.0]
            .iter()
            .map(|&v| b.bucket_index(v))
            .collect();
        assert_eq!(placed, vec![0, 1, 1, 2, 2, 3]);
        assert_eq!(b.bucket_count(), 4);
    }

    #[test]
    fn test_empty_boundaries_single_bucket() {
        let b = BucketBoundaries::new(vec![]).unwrap();
        assert_eq!(b.bucket_count(), 1);
        assert_eq!(b.bucket_index(-1e9), 0);
        assert_eq!(b.bucket_index(1e9), 0);
    }

    #[test]
    fn test_rejects_unsorted_and_duplicates() {
        assert!(BucketBoundaries::new(vec![1.0, 0.0]).is_err());
        assert!(BucketBoundaries::new(vec![1.0, 1.0]).is_err());
        assert!(BucketBoundaries::new(vec![0.0, f64::NAN]).is_err());
    }

    #[test]
    fn test_equality_is_elementwise() {
        let a = BucketBoundaries::new(vec![1.0, 2.0]).unwrap();
        let b = BucketBoundaries::new(vec![1.0, 2.0]).unwrap();
        let c = BucketBoundaries::new(vec![1.0, 3.0]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
