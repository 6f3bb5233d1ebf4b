//! Head sampling decisions.

use crate::core::{LumenError, Result, TraceId};

/// Sampling decision result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingDecision {
    /// Record and export the span
    RecordAndSample,
    /// Drop the span
    Drop,
}

impl SamplingDecision {
    pub fn is_sampled(&self) -> bool {
        matches!(self, SamplingDecision::RecordAndSample)
    }
}

/// Samples a fixed fraction of traces, keyed on the trace id so every span of
/// a trace gets the same decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilitySampler {
    probability: f64,
    upper_bound: u64,
}

impl ProbabilitySampler {
    /// Fails unless `probability` lies in `[0, 1]`.
    pub fn new(probability: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(LumenError::invalid_argument(format!(
                "Sampling probability must be in [0, 1], got {}",
                probability
            )));
        }
        let upper_bound = if probability >= 1.0 {
            u64::MAX
        } else {
            (probability * u64::MAX as f64) as u64
        };
        Ok(Self {
            probability,
            upper_bound,
        })
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn should_sample(&self, trace_id: &TraceId) -> SamplingDecision {
        if self.probability >= 1.0 {
            return SamplingDecision::RecordAndSample;
        }
        if self.probability <= 0.0 {
            return SamplingDecision::Drop;
        }
        if trace_id.low_u64() < self.upper_bound {
            SamplingDecision::RecordAndSample
        } else {
            SamplingDecision::Drop
        }
    }
}

/// Root sampler.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Sampler {
    #[default]
    AlwaysOn,
    AlwaysOff,
    TraceIdRatio(ProbabilitySampler),
}

impl Sampler {
    /// Ratio sampler; see [`ProbabilitySampler::new`]
    pub fn trace_id_ratio(probability: f64) -> Result<Self> {
        ProbabilitySampler::new(probability).map(Sampler::TraceIdRatio)
    }

    pub fn should_sample(&self, trace_id: &TraceId) -> SamplingDecision {
        match self {
            Sampler::AlwaysOn => SamplingDecision::RecordAndSample,
            Sampler::AlwaysOff => SamplingDecision::Drop,
            Sampler::TraceIdRatio(ratio) => ratio.should_sample(trace_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trace_id_with_low(low: u64) -> TraceId {
        let mut bytes = [0xaa; 16];
        bytes[8..].copy_from_slice(&low.to_be_bytes());
        TraceId::from_bytes(bytes)
    }

    #[test]
    fn test_probability_validation() {
        assert!(ProbabilitySampler::new(-0.1).is_err());
        assert!(ProbabilitySampler::new(1.5).is_err());
        assert!(ProbabilitySampler::new(f64::NAN).is_err());
        assert!(ProbabilitySampler::new(0.0).is_ok());
        assert!(ProbabilitySampler::new(1.0).is_ok());
    }

    #[test]
    fn test_ratio_decisions() {
        let half = ProbabilitySampler::new(0.5).unwrap();
        assert!(half.should_sample(&trace_id_with_low(0)).is_sampled());
        assert!(half.should_sample(&trace_id_with_low(u64::MAX / 4)).is_sampled());
        assert!(!half.should_sample(&trace_id_with_low(u64::MAX / 4 * 3)).is_sampled());
        assert!(!half.should_sample(&trace_id_with_low(u64::MAX)).is_sampled());
    }

    #[test]
    fn test_extremes() {
        let id = trace_id_with_low(u64::MAX);
        assert!(Sampler::trace_id_ratio(1.0).unwrap().should_sample(&id).is_sampled());
        assert!(!Sampler::trace_id_ratio(0.0)
            .unwrap()
            .should_sample(&trace_id_with_low(0))
            .is_sampled());
        assert!(Sampler::AlwaysOn.should_sample(&id).is_sampled());
        assert!(!Sampler::AlwaysOff.should_sample(&id).is_sampled());
    }

    #[test]
    fn test_ratio_is_roughly_respected() {
        let sampler = ProbabilitySampler::new(0.25).unwrap();
        let step = u64::MAX / 1000;
        let sampled = (0..1000u64)
            .filter(|i| sampler.should_sample(&trace_id_with_low(i * step)).is_sampled())
            .count();
        assert!((240..=260).contains(&sampled), "sampled {}", sampled);
    }
}
