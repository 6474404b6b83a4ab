pub mod aggregator;
mod cache;
pub mod classifier;
pub mod engine;
pub mod parser;
pub mod report;
pub mod source;

#[cfg(test)]
mod tests;

pub use aggregator::{aggregate_log, StatsAggregator, WindowMetrics};
pub use cache::CachedSource;
pub use classifier::{ComplexityClassifier, KeywordTable};
pub use engine::{AnalysisOutcome, AnalysisRequest, Analyzer, WindowSummary};
pub use parser::{LogStreamParser, ParseDiagnostics};
pub use report::{ProductivityReport, Ratio};
pub use source::{GitCliSource, LogQuery, LogSource, StaticSource};
