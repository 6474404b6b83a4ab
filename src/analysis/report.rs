//! Before/after comparison of two windows.

use serde::{Serialize, Serializer};

use super::aggregator::WindowMetrics;
use crate::types::ComplexityTier;

/// A ratio that may be undefined because its denominator is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ratio {
    Defined(f64),
    /// The baseline was zero; there is no meaningful value
    Undefined,
}

impl Ratio {
    fn of(numerator: f64, denominator: f64) -> Self {
        if denominator > 0.0 {
            Ratio::Defined(numerator / denominator)
        } else {
            Ratio::Undefined
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Ratio::Defined(v) => Some(*v),
            Ratio::Undefined => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Ratio::Undefined)
    }

    /// Round to `decimals` places, for display.
    pub fn rounded(&self, decimals: u32) -> Self {
        match self {
            Ratio::Defined(v) => {
                let scale = 10f64.powi(decimals as i32);
                Ratio::Defined((v * scale).round() / scale)
            }
            Ratio::Undefined => Ratio::Undefined,
        }
    }
}

/// Undefined serializes as `null`
impl Serialize for Ratio {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Ratio::Defined(v) => serializer.serialize_f64(*v),
            Ratio::Undefined => serializer.serialize_none(),
        }
    }
}

/// Comparative figures derived from a pair of [`WindowMetrics`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductivityReport {
    pub days_before: i64,
    pub days_after: i64,
    pub commits_before: u64,
    pub commits_after: u64,
    /// Commits per day before adoption
    pub rate_before: f64,
    /// Commits per day after adoption
    pub rate_after: f64,
    /// `(after - before) / before * 100`
    pub percent_change: Ratio,
    /// `after / before`
    pub multiplier: Ratio,
    /// High-complexity commits before and after
    pub complex_commits_before: u64,
    pub complex_commits_after: u64,
    pub lines_changed_before: u64,
    pub lines_changed_after: u64,
}

impl ProductivityReport {
    pub fn compare(before: &WindowMetrics, after: &WindowMetrics) -> Self {
        let days_before = before.window.length_days();
        let days_after = after.window.length_days();
        let rate_before = before.commit_count as f64 / days_before as f64;
        let rate_after = after.commit_count as f64 / days_after as f64;

        Self {
            days_before,
            days_after,
            commits_before: before.commit_count,
            commits_after: after.commit_count,
            rate_before,
            rate_after,
            percent_change: Ratio::of((rate_after - rate_before) * 100.0, rate_before),
            multiplier: Ratio::of(rate_after, rate_before),
            complex_commits_before: before.tier_count(ComplexityTier::High),
            complex_commits_after: after.tier_count(ComplexityTier::High),
            lines_changed_before: before.total_insertions + before.total_deletions,
            lines_changed_after: after.total_insertions + after.total_deletions,
        }
    }
}
