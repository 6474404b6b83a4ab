//! Folds a commit stream into per-window metrics.

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::classifier::ComplexityClassifier;
use super::parser::{LogStreamParser, ParseDiagnostics};
use crate::types::{CommitRecord, ComplexityTier};
use crate::utils::top_n;
use crate::window::DateWindow;

/// Default length of the "most changed files" view
pub const DEFAULT_TOP_FILES: usize = 10;
/// Default length of the "most active days" view
pub const DEFAULT_TOP_DAYS: usize = 5;

/// Everything measured for one window.
///
/// `commit_count` always equals the sum of `complexity_tally`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowMetrics {
    pub window: DateWindow,
    pub commit_count: u64,
    pub total_insertions: u64,
    pub total_deletions: u64,
    /// Binary file changes seen; excluded from line totals and file counts
    pub binary_files_skipped: u64,
    pub complexity_tally: BTreeMap<ComplexityTier, u64>,
    /// Commits touching each text file
    pub file_change_counts: HashMap<String, u64>,
    /// Commits per calendar day in the window's timezone
    pub daily_commit_counts: BTreeMap<NaiveDate, u64>,
    /// Records the log returned that fall outside `[start, end)`
    pub commits_outside_window: u64,
    /// Log lines the parser could not interpret
    pub malformed_lines: usize,
}

impl WindowMetrics {
    /// Empty metrics with every tier present at zero
    pub fn new(window: DateWindow) -> Self {
        Self {
            window,
            commit_count: 0,
            total_insertions: 0,
            total_deletions: 0,
            binary_files_skipped: 0,
            complexity_tally: ComplexityTier::ALL.iter().map(|&t| (t, 0)).collect(),
            file_change_counts: HashMap::new(),
            daily_commit_counts: BTreeMap::new(),
            commits_outside_window: 0,
            malformed_lines: 0,
        }
    }

    pub fn tier_count(&self, tier: ComplexityTier) -> u64 {
        self.complexity_tally.get(&tier).copied().unwrap_or(0)
    }

    /// Percentage of commits in `tier`, 0 for an empty window
    pub fn complexity_share(&self, tier: ComplexityTier) -> f64 {
        if self.commit_count == 0 {
            return 0.0;
        }
        self.tier_count(tier) as f64 / self.commit_count as f64 * 100.0
    }

    /// Average number of lines changed per commit
    pub fn average_commit_size(&self) -> f64 {
        if self.commit_count == 0 {
            return 0.0;
        }
        (self.total_insertions + self.total_deletions) as f64 / self.commit_count as f64
    }

    /// Most frequently changed files
    pub fn top_files(&self, limit: usize) -> Vec<(String, u64)> {
        top_n(&self.file_change_counts, limit)
    }

    /// Days with the most commits
    pub fn top_days(&self, limit: usize) -> Vec<(NaiveDate, u64)> {
        top_n(&self.daily_commit_counts, limit)
    }
}

/// Accumulates [`CommitRecord`]s for a single window.
pub struct StatsAggregator<'c> {
    classifier: &'c ComplexityClassifier,
    metrics: WindowMetrics,
}

impl<'c> StatsAggregator<'c> {
    pub fn new(window: DateWindow, classifier: &'c ComplexityClassifier) -> Self {
        Self {
            classifier,
            metrics: WindowMetrics::new(window),
        }
    }

    /// Fold one commit into the running metrics
    pub fn push(&mut self, record: CommitRecord) {
        let metrics = &mut self.metrics;
        let window = metrics.window;

        if !window.contains(&record.timestamp) {
            debug!("commit {} at {} is outside {window}", record.sha, record.timestamp);
            metrics.commits_outside_window += 1;
            return;
        }

        metrics.commit_count += 1;
        let day = window.timezone().local_date(&record.timestamp);
        *metrics.daily_commit_counts.entry(day).or_insert(0) += 1;

        let tier = self.classifier.classify(&record.message);
        *metrics.complexity_tally.entry(tier).or_insert(0) += 1;

        for file in record.files_changed {
            match (file.is_binary, file.insertions, file.deletions) {
                (false, Some(insertions), Some(deletions)) => {
                    metrics.total_insertions += insertions;
                    metrics.total_deletions += deletions;
                    *metrics.file_change_counts.entry(file.path).or_insert(0) += 1;
                }
                _ => metrics.binary_files_skipped += 1,
            }
        }
    }

    pub fn record_diagnostics(&mut self, diagnostics: &ParseDiagnostics) {
        self.metrics.malformed_lines += diagnostics.malformed_lines;
    }

    /// Fold every record of `records`
    pub fn fold<I>(mut self, records: I) -> WindowMetrics
    where
        I: IntoIterator<Item = CommitRecord>,
    {
        for record in records {
            self.push(record);
        }
        self.finish()
    }

    pub fn finish(self) -> WindowMetrics {
        self.metrics
    }
}

/// Parse `raw` and fold it straight into metrics for `window`.
pub fn aggregate_log(
    raw: &str,
    window: DateWindow,
    classifier: &ComplexityClassifier,
) -> WindowMetrics {
    let mut parser = LogStreamParser::new(raw);
    let mut aggregator = StatsAggregator::new(window, classifier);
    for record in &mut parser {
        aggregator.push(record);
    }
    aggregator.record_diagnostics(parser.diagnostics());

    let metrics = aggregator.finish();
    debug!(
        "{window}: {} commits, +{} -{}, {} binary, {} malformed lines",
        metrics.commit_count,
        metrics.total_insertions,
        metrics.total_deletions,
        metrics.binary_files_skipped,
        metrics.malformed_lines
    );
    metrics
}
