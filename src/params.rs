//! Encoder parameter sets and sweep plans.
//!
//! A [`ParameterSet`] is one WebP configuration under test: a `method`
//! (speed/compression trade-off tier, 0 = fastest, 6 = slowest) and a
//! `quality` in 1..=100. A [`SweepPlan`] is the ordered list of parameter sets
//! benchmarked in one run; its order drives report layout only.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Accepted `method` values.
pub const METHOD_RANGE: std::ops::RangeInclusive<u8> = 0..=6;

/// Accepted `quality` values.
pub const QUALITY_RANGE: std::ops::RangeInclusive<u8> = 1..=100;

/// Quality used when a plan does not specify one.
pub const DEFAULT_QUALITY: u8 = 80;

/// One codec configuration under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParameterSet {
    method: u8,
    quality: u8,
}

impl ParameterSet {
    /// Create a validated parameter set.
    pub fn new(method: u8, quality: u8) -> Result<Self> {
        let params = Self { method, quality };
        params.validate()?;
        Ok(params)
    }

    /// Encoder method tier.
    #[must_use]
    pub fn method(&self) -> u8 {
        self.method
    }

    /// Encoder quality.
    #[must_use]
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Check both values against the accepted ranges.
    ///
    /// Deserialized values bypass [`ParameterSet::new`], so the encoder
    /// re-validates before every call.
    pub fn validate(&self) -> Result<()> {
        if !METHOD_RANGE.contains(&self.method) {
            return Err(Error::InvalidParameter(format!(
                "method {} outside {}..={}",
                self.method,
                METHOD_RANGE.start(),
                METHOD_RANGE.end()
            )));
        }
        if !QUALITY_RANGE.contains(&self.quality) {
            return Err(Error::InvalidParameter(format!(
                "quality {} outside {}..={}",
                self.quality,
                QUALITY_RANGE.start(),
                QUALITY_RANGE.end()
            )));
        }
        Ok(())
    }

    /// Stable identifier, also used for log and artifact file names.
    #[must_use]
    pub fn id(&self) -> String {
        format!("method{}_q{}", self.method, self.quality)
    }
}

impl fmt::Display for ParameterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "method={} quality={}", self.method, self.quality)
    }
}

/// Ordered, duplicate-free list of parameter sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepPlan {
    sets: Vec<ParameterSet>,
}

impl SweepPlan {
    /// Create a plan, rejecting empty or duplicated entries.
    pub fn new(sets: Vec<ParameterSet>) -> Result<Self> {
        if sets.is_empty() {
            return Err(Error::InvalidConfig("sweep plan is empty".to_string()));
        }
        let mut seen = HashSet::with_capacity(sets.len());
        for params in &sets {
            params.validate()?;
            if !seen.insert(*params) {
                return Err(Error::InvalidConfig(format!(
                    "sweep plan lists {} more than once",
                    params.id()
                )));
            }
        }
        Ok(Self { sets })
    }

    /// Every method tier at a single quality.
    pub fn all_methods(quality: u8) -> Result<Self> {
        Self::methods(METHOD_RANGE, quality)
    }

    /// The given method tiers at a single quality, in iteration order.
    pub fn methods(methods: impl IntoIterator<Item = u8>, quality: u8) -> Result<Self> {
        let sets = methods
            .into_iter()
            .map(|m| ParameterSet::new(m, quality))
            .collect::<Result<Vec<_>>>()?;
        Self::new(sets)
    }

    /// Number of parameter sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Always false for a constructed plan.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Iterate in plan order.
    pub fn iter(&self) -> impl Iterator<Item = &ParameterSet> {
        self.sets.iter()
    }
}

impl<'a> IntoIterator for &'a SweepPlan {
    type Item = &'a ParameterSet;
    type IntoIter = std::slice::Iter<'a, ParameterSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.sets.iter()
    }
}
