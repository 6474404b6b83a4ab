//! # Errors
//!
//! Failures surfaced by the analysis engine. Recoverable conditions (malformed
//! log lines, undefined ratios) are not errors and live next to the data they
//! describe.

use std::path::PathBuf;
use thiserror::Error;

/// Everything that can stop an analysis run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Bad window configuration supplied by the caller.
    #[error("invalid date range: {reason}")]
    InvalidRange { reason: String },

    /// The `git` binary is missing, the path is not a repository, or the
    /// log query itself failed.
    #[error("log source unavailable ({context}): {reason}")]
    SourceUnavailable { context: String, reason: String },

    /// The caller cancelled an in-flight fetch.
    #[error("log fetch for {window} was cancelled")]
    Cancelled { window: String },

    /// A background worker panicked or was aborted.
    #[error("analysis worker failed: {reason}")]
    Worker { reason: String },

    /// An explicitly requested configuration file could not be used.
    #[error("failed to load config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

impl AnalysisError {
    pub(crate) fn invalid_range(reason: impl Into<String>) -> Self {
        Self::InvalidRange {
            reason: reason.into(),
        }
    }

    pub(crate) fn unavailable(context: impl ToString, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            context: context.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias used across the library.
pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;
