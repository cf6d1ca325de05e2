//! Per-configuration aggregation.
//!
//! The first iteration of every configuration is a warm-up: it is recorded
//! and logged but never averaged, because cold-start costs (lazy codec
//! initialisation, cache priming) inflate its latency. An [`AggregateStat`]
//! with no post-warm-up samples is undefined: its averages are NaN, never 0,
//! so it cannot be mistaken for a genuinely fast configuration.

use serde::{Deserialize, Serialize};

use crate::eval::report::ConversionResult;
use crate::params::ParameterSet;

/// Number of leading iterations excluded from averages.
pub const WARMUP_ITERATIONS: u32 = 1;

/// Descriptive statistics for a set of measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of values.
    pub count: usize,
    /// Mean value.
    pub mean: f64,
    /// Median value.
    pub median: f64,
    /// Standard deviation.
    pub std_dev: f64,
    /// Minimum value.
    pub min: f64,
    /// Maximum value.
    pub max: f64,
    /// 5th percentile.
    pub p5: f64,
    /// 95th percentile.
    pub p95: f64,
}

impl Summary {
    /// Compute summary statistics for a slice of values.
    ///
    /// Returns `None` if the slice is empty.
    #[must_use]
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let count = sorted.len();
        let mean = mean(&sorted);

        let variance: f64 = sorted.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;

        Some(Self {
            count,
            mean,
            median: percentile_sorted(&sorted, 0.5),
            std_dev: variance.sqrt(),
            min: sorted[0],
            max: sorted[count - 1],
            p5: percentile_sorted(&sorted, 0.05),
            p95: percentile_sorted(&sorted, 0.95),
        })
    }
}

/// Arithmetic mean; NaN for an empty slice.
///
/// # Example
///
/// ```
/// use webp_sweep::stats::mean;
///
/// assert!((mean(&[1.0, 2.0, 3.0, 4.0, 5.0]) - 3.0).abs() < 0.001);
/// assert!(mean(&[]).is_nan());
/// ```
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }

    let idx = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;
    let frac = idx - lower as f64;

    if lower == upper {
        sorted[lower]
    } else {
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}

/// Aggregate outcome of one configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateStat {
    /// Parameter set the statistic belongs to.
    pub params: ParameterSet,

    /// Parameter set identifier.
    pub id: String,

    /// Number of post-warm-up results averaged.
    pub samples: usize,

    /// Mean encode latency in milliseconds (NaN when undefined).
    #[serde(with = "nan_as_null")]
    pub avg_elapsed_ms: f64,

    /// Mean similarity to the source (NaN when undefined).
    #[serde(with = "nan_as_null")]
    pub avg_similarity: f64,

    /// Mean artifact size in bytes (NaN when undefined).
    #[serde(with = "nan_as_null")]
    pub avg_artifact_bytes: f64,

    /// Latency dispersion over the averaged samples.
    pub elapsed: Option<Summary>,

    /// Why the configuration stopped early, if it did.
    pub failure: Option<String>,
}

impl AggregateStat {
    /// Whether at least one post-warm-up sample exists.
    #[must_use]
    pub fn is_defined(&self) -> bool {
        self.samples > 0
    }

    /// Whether every planned iteration completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Build the aggregate for `params` from its recorded results.
///
/// Results with `iteration <= WARMUP_ITERATIONS` are ignored; the remainder
/// is averaged whatever its size.
#[must_use]
pub fn aggregate(
    params: ParameterSet,
    results: &[ConversionResult],
    failure: Option<String>,
) -> AggregateStat {
    let measured: Vec<&ConversionResult> = results
        .iter()
        .filter(|r| r.params == params && r.iteration > WARMUP_ITERATIONS)
        .collect();

    let elapsed: Vec<f64> = measured.iter().map(|r| r.elapsed_ms).collect();
    let similarity: Vec<f64> = measured.iter().map(|r| r.similarity).collect();
    let bytes: Vec<f64> = measured.iter().map(|r| r.artifact_bytes as f64).collect();

    AggregateStat {
        params,
        id: params.id(),
        samples: measured.len(),
        avg_elapsed_ms: mean(&elapsed),
        avg_similarity: mean(&similarity),
        avg_artifact_bytes: mean(&bytes),
        elapsed: Summary::compute(&elapsed),
        failure,
    }
}

/// Serialize non-finite floats as `null` and read `null` back as NaN.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = Option::<f64>::deserialize(deserializer)?;
        Ok(value.unwrap_or(f64::NAN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(
        params: ParameterSet,
        iteration: u32,
        elapsed_ms: f64,
        similarity: f64,
    ) -> ConversionResult {
        ConversionResult {
            params,
            iteration,
            elapsed_ms,
            artifact_bytes: 1000,
            similarity,
        }
    }

    #[test]
    fn test_warmup_is_excluded() {
        let p = ParameterSet::new(4, 80).unwrap();
        let results = vec![
            result(p, 1, 500.0, 0.5),
            result(p, 2, 10.0, 0.98),
            result(p, 3, 20.0, 0.96),
        ];
        let stat = aggregate(p, &results, None);
        assert_eq!(stat.samples, 2);
        assert!((stat.avg_elapsed_ms - 15.0).abs() < 1e-9);
        assert!((stat.avg_similarity - 0.97).abs() < 1e-9);
        assert!(stat.is_defined());
        assert!(stat.is_complete());
    }

    #[test]
    fn test_n_minus_one_samples() {
        let p = ParameterSet::new(0, 80).unwrap();
        for n in 2..=11_u32 {
            let results: Vec<_> = (1..=n).map(|i| result(p, i, f64::from(i), 0.9)).collect();
            let stat = aggregate(p, &results, None);
            assert_eq!(stat.samples, (n - 1) as usize);
        }
    }

    #[test]
    fn test_single_iteration_is_undefined_not_zero() {
        let p = ParameterSet::new(6, 80).unwrap();
        let stat = aggregate(p, &[result(p, 1, 12.0, 0.99)], None);
        assert_eq!(stat.samples, 0);
        assert!(!stat.is_defined());
        assert!(stat.avg_elapsed_ms.is_nan());
        assert!(stat.avg_similarity.is_nan());
        assert!(stat.elapsed.is_none());
    }

    #[test]
    fn test_other_configurations_are_ignored() {
        let a = ParameterSet::new(1, 80).unwrap();
        let b = ParameterSet::new(2, 80).unwrap();
        let results = vec![result(a, 2, 10.0, 0.9), result(b, 2, 99.0, 0.1)];
        let stat = aggregate(a, &results, None);
        assert_eq!(stat.samples, 1);
        assert_eq!(stat.avg_elapsed_ms, 10.0);
    }

    #[test]
    fn test_undefined_serializes_as_null() {
        let p = ParameterSet::new(3, 80).unwrap();
        let stat = aggregate(p, &[], Some("encode failed".to_string()));
        let json = serde_json::to_value(&stat).unwrap();
        assert!(json["avg_elapsed_ms"].is_null());
        assert_eq!(json["failure"], "encode failed");

        let back: AggregateStat = serde_json::from_value(json).unwrap();
        assert!(back.avg_similarity.is_nan());
    }

    #[test]
    fn test_summary() {
        let s = Summary::compute(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(s.count, 4);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert!((s.median - 2.5).abs() < 1e-9);
        assert!(Summary::compute(&[]).is_none());
    }
}
