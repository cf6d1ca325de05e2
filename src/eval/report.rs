//! Report types for sweep results.
//!
//! This module defines the per-iteration record and the sweep-level report,
//! which can be serialized to JSON or summarised as CSV.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::decode::SourceInfo;
use crate::error::Result;
use crate::params::ParameterSet;
use crate::stats::AggregateStat;

/// Outcome of one encode-then-compare iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Parameter set used.
    pub params: ParameterSet,

    /// 1-based iteration index; iteration 1 is the warm-up.
    pub iteration: u32,

    /// Wall-clock encode latency in milliseconds.
    pub elapsed_ms: f64,

    /// Encoded artifact size in bytes.
    pub artifact_bytes: u64,

    /// Similarity of the decoded artifact to the source, in `[0, 1]`.
    pub similarity: f64,
}

impl ConversionResult {
    /// Calculate compression ratio (source size / artifact size).
    #[must_use]
    pub fn compression_ratio(&self, source_bytes: u64) -> f64 {
        if self.artifact_bytes == 0 {
            0.0
        } else {
            source_bytes as f64 / self.artifact_bytes as f64
        }
    }
}

/// Terminal state of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepStatus {
    /// Every configuration in the plan was attempted.
    Completed,
    /// The sweep was cancelled before the plan was exhausted.
    Aborted,
}

/// Full record of one sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepReport {
    /// Source image metadata.
    pub source: SourceInfo,

    /// Codec identifier.
    pub codec_id: String,

    /// Codec version string.
    pub codec_version: String,

    /// Fidelity metric name.
    pub metric: String,

    /// Iterations planned per configuration.
    pub iterations: u32,

    /// Terminal state.
    pub status: SweepStatus,

    /// Aggregates in plan order.
    pub stats: Vec<AggregateStat>,

    /// Every recorded iteration, warm-ups included.
    pub results: Vec<ConversionResult>,

    /// Transient files that could not be removed.
    #[serde(default)]
    pub leaked_artifacts: Vec<PathBuf>,

    /// When this report was generated.
    #[serde(with = "chrono_serde")]
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl SweepReport {
    /// Aggregate for a parameter set id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AggregateStat> {
        self.stats.iter().find(|s| s.id == id)
    }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Write one CSV row per configuration.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut wtr = csv::Writer::from_path(path)?;

        wtr.write_record([
            "config",
            "method",
            "quality",
            "samples",
            "avg_ms",
            "avg_ssim",
            "avg_bytes",
            "min_ms",
            "max_ms",
            "failure",
        ])?;

        let fmt = |v: f64, digits: usize| {
            if v.is_finite() {
                format!("{v:.digits$}")
            } else {
                String::new()
            }
        };

        for stat in &self.stats {
            let (min_ms, max_ms) = match &stat.elapsed {
                Some(s) => (format!("{:.2}", s.min), format!("{:.2}", s.max)),
                None => (String::new(), String::new()),
            };
            wtr.write_record([
                stat.id.clone(),
                stat.params.method().to_string(),
                stat.params.quality().to_string(),
                stat.samples.to_string(),
                fmt(stat.avg_elapsed_ms, 2),
                fmt(stat.avg_similarity, 5),
                fmt(stat.avg_artifact_bytes, 0),
                min_ms,
                max_ms,
                stat.failure.clone().unwrap_or_default(),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }
}

mod chrono_serde {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        dt.to_rfc3339().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
