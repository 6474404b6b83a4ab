//! # Common Types
//!
//! Records produced by the log parser and the keys used to memoize log
//! fetches.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::window::DateWindow;

/// A single changed file within a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    /// Path of the file after the change (renames resolve to the new path)
    pub path: String,
    /// Lines added, `None` when git reports no line counts (binary diff)
    pub insertions: Option<u64>,
    /// Lines removed, `None` when git reports no line counts (binary diff)
    pub deletions: Option<u64>,
    /// Whether git reported the file as a binary diff
    pub is_binary: bool,
}

impl FileChange {
    pub fn text(path: impl Into<String>, insertions: u64, deletions: u64) -> Self {
        Self {
            path: path.into(),
            insertions: Some(insertions),
            deletions: Some(deletions),
            is_binary: false,
        }
    }

    pub fn binary(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            insertions: None,
            deletions: None,
            is_binary: true,
        }
    }
}

/// One commit read from the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub sha: String,
    /// Committer timestamp with the committer's own offset
    pub timestamp: DateTime<FixedOffset>,
    /// Subject line
    pub message: String,
    /// Files in numstat order; empty for summary-format logs
    pub files_changed: Vec<FileChange>,
}

/// Coarse scope of a commit inferred from its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityTier {
    High,
    Medium,
    Low,
}

impl ComplexityTier {
    /// All tiers in priority order.
    pub const ALL: [ComplexityTier; 3] = [
        ComplexityTier::High,
        ComplexityTier::Medium,
        ComplexityTier::Low,
    ];
}

impl fmt::Display for ComplexityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ComplexityTier::High => "high",
            ComplexityTier::Medium => "medium",
            ComplexityTier::Low => "low",
        };
        f.write_str(name)
    }
}

/// Shape of the raw log text requested from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Commit delimiter lines only
    Summary,
    /// Commit delimiter lines followed by per-file numstat lines
    NumStat,
}

/// A key used for memoizing raw log text within one run.
///
/// The window carries its timezone, so equal keys always mean equal start
/// and end instants.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct FetchKey {
    pub window: DateWindow,
    pub format: LogFormat,
}
