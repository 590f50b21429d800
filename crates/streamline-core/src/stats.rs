//! # Summary Statistics
//!
//! Mergeable count/sum/min/max accumulators for integer and float
//! pipelines. Both types are plain values: workers build one each and
//! `combine` merges them.

use serde::{Deserialize, Serialize};

// =============================================================================
// INTEGER SUMMARY
// =============================================================================

/// Statistics over `i64` values.
///
/// The sum wraps on overflow. Wrapping addition is associative, so a sum
/// merged from per-worker partials equals the single-pass sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IntSummary {
    count: u64,
    sum: i64,
    min: Option<i64>,
    max: Option<i64>,
}

impl IntSummary {
    /// Create an empty summary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one value.
    pub fn accept(&mut self, value: i64) {
        self.count = self.count.saturating_add(1);
        self.sum = self.sum.wrapping_add(value);
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Merge another summary into this one.
    #[must_use]
    pub fn combine(mut self, other: Self) -> Self {
        self.count = self.count.saturating_add(other.count);
        self.sum = self.sum.wrapping_add(other.sum);
        self.min = merge_with(self.min, other.min, i64::min);
        self.max = merge_with(self.max, other.max, i64::max);
        self
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> i64 {
        self.sum
    }

    pub fn min(&self) -> Option<i64> {
        self.min
    }

    pub fn max(&self) -> Option<i64> {
        self.max
    }

    /// Arithmetic mean; `None` when no value was recorded.
    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum as f64 / self.count as f64)
    }
}

// =============================================================================
// FLOAT SUMMARY
// =============================================================================

/// Statistics over `f64` values.
///
/// `min`/`max` ignore NaN inputs unless every input was NaN.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FloatSummary {
    count: u64,
    sum: f64,
    min: Option<f64>,
    max: Option<f64>,
}

impl FloatSummary {
    /// Create an empty summary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one value.
    pub fn accept(&mut self, value: f64) {
        self.count = self.count.saturating_add(1);
        self.sum += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    /// Merge another summary into this one.
    #[must_use]
    pub fn combine(mut self, other: Self) -> Self {
        self.count = self.count.saturating_add(other.count);
        self.sum += other.sum;
        self.min = merge_with(self.min, other.min, f64::min);
        self.max = merge_with(self.max, other.max, f64::max);
        self
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// Arithmetic mean; `None` when no value was recorded.
    pub fn average(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

fn merge_with<V>(left: Option<V>, right: Option<V>, pick: fn(V, V) -> V) -> Option<V> {
    match (left, right) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, None) => a,
        (None, b) => b,
    }
}

// =============================================================================
// TESTS
// =============================================================================
