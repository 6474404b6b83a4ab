//! # Commit Delta
//!
//! `commit_delta` measures how a developer's commit activity changed after
//! adopting a tool. It queries git history for the windows before and after an
//! adoption date, streams the log into per-window metrics, and compares them.
//!
//! ## Features
//!
//! - Half-open date windows normalized to a chosen timezone
//! - Streaming parse of `git log --numstat` output, tolerant of junk lines
//! - Keyword-based commit complexity tiers, configurable from TOML
//! - Line totals, binary-file accounting, most changed files and busiest days
//! - Commit-rate comparison with an explicit "undefined" for empty baselines
//! - Memoized log fetches and cancellable git invocations
//!
//! ## Example
//!
//! ```no_run
//! use commit_delta::analysis::{AnalysisRequest, Analyzer, ComplexityClassifier, GitCliSource};
//! use chrono::NaiveDate;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> commit_delta::Result<()> {
//! let source = GitCliSource::open(".")?;
//! let analyzer = Analyzer::new(source, ComplexityClassifier::default());
//!
//! let adoption = NaiveDate::from_ymd_opt(2025, 6, 21).unwrap();
//! let outcome = analyzer
//!     .run(&AnalysisRequest::new(adoption, 30), &CancellationToken::new())
//!     .await?;
//!
//! println!("multiplier: {:?}", outcome.report.multiplier.rounded(1));
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod error;
pub mod types;
pub mod utils;
pub mod window;

// Re-export main types for convenience
pub use analysis::{AnalysisOutcome, AnalysisRequest, Analyzer, ProductivityReport, WindowMetrics};
pub use config::AnalysisConfig;
pub use error::{AnalysisError, Result};
pub use types::{CommitRecord, ComplexityTier, FetchKey, FileChange, LogFormat};
pub use window::{DateWindow, WindowPair, WindowTz};
