//! Runs a full before/after analysis.

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::spawn_blocking;
use tokio_util::sync::CancellationToken;

use super::aggregator::{aggregate_log, WindowMetrics, DEFAULT_TOP_DAYS, DEFAULT_TOP_FILES};
use super::cache::CachedSource;
use super::classifier::ComplexityClassifier;
use super::report::ProductivityReport;
use super::source::{LogQuery, LogSource};
use crate::error::{AnalysisError, Result};
use crate::types::LogFormat;
use crate::window::{DateWindow, WindowPair, WindowTz};

/// Inputs for one run. Values are expected to be validated by the caller;
/// only the window arithmetic is re-checked here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub adoption_date: NaiveDate,
    pub days_before: i64,
    pub days_after: i64,
    pub timezone: WindowTz,
    pub top_files: usize,
    pub top_days: usize,
    /// `Summary` skips per-file statistics
    pub format: LogFormat,
}

impl AnalysisRequest {
    /// Symmetric windows of `days` with default limits, UTC and full numstat
    pub fn new(adoption_date: NaiveDate, days: i64) -> Self {
        Self {
            adoption_date,
            days_before: days,
            days_after: days,
            timezone: WindowTz::Utc,
            top_files: DEFAULT_TOP_FILES,
            top_days: DEFAULT_TOP_DAYS,
            format: LogFormat::NumStat,
        }
    }
}

/// Metrics for one window plus its bounded top-N views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSummary {
    pub metrics: WindowMetrics,
    pub top_files: Vec<(String, u64)>,
    pub top_days: Vec<(NaiveDate, u64)>,
}

/// Result of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    pub adoption_date: NaiveDate,
    pub report: ProductivityReport,
    pub before: WindowSummary,
    pub after: WindowSummary,
    /// Shell commands reproducing the before/after commit counts
    pub verification: [String; 2],
}

/// Fetches, parses and compares the two windows around an adoption date.
///
/// Fetches go through a run-scoped cache, so repeating a request on the
/// same analyzer never re-queries the source.
pub struct Analyzer<S> {
    source: CachedSource<S>,
    classifier: Arc<ComplexityClassifier>,
}

impl<S: LogSource> Analyzer<S> {
    pub fn new(source: S, classifier: ComplexityClassifier) -> Self {
        Self {
            source: CachedSource::new(source),
            classifier: Arc::new(classifier),
        }
    }

    pub fn source(&self) -> &CachedSource<S> {
        &self.source
    }

    pub async fn run(
        &self,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<AnalysisOutcome> {
        let start_time = Instant::now();
        let windows = WindowPair::around(
            request.adoption_date,
            request.days_before,
            request.days_after,
            request.timezone,
        )?;

        let (before, after) = tokio::try_join!(
            self.analyze_window(windows.before, request, cancel),
            self.analyze_window(windows.after, request, cancel),
        )?;

        let report = ProductivityReport::compare(&before.metrics, &after.metrics);
        let verification = [
            LogQuery::new(windows.before, request.format).verification_command()?,
            LogQuery::new(windows.after, request.format).verification_command()?,
        ];

        debug!(
            "analyzed {} + {} commits in {:.2}s",
            report.commits_before,
            report.commits_after,
            start_time.elapsed().as_secs_f64()
        );

        Ok(AnalysisOutcome {
            adoption_date: request.adoption_date,
            report,
            before,
            after,
            verification,
        })
    }

    /// Each window is folded on its own blocking worker, which owns its
    /// metrics until it hands them back.
    async fn analyze_window(
        &self,
        window: DateWindow,
        request: &AnalysisRequest,
        cancel: &CancellationToken,
    ) -> Result<WindowSummary> {
        let raw = self.source.fetch(window, request.format, cancel).await?;
        let classifier = Arc::clone(&self.classifier);
        let (top_files, top_days) = (request.top_files, request.top_days);

        spawn_blocking(move || {
            let metrics = aggregate_log(&raw, window, &classifier);
            WindowSummary {
                top_files: metrics.top_files(top_files),
                top_days: metrics.top_days(top_days),
                metrics,
            }
        })
        .await
        .map_err(|e| AnalysisError::Worker {
            reason: e.to_string(),
        })
    }
}
