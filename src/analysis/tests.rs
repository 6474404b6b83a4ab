use super::*;
use crate::error::AnalysisError;
use crate::types::LogFormat;
use crate::window::WindowTz;
use chrono::{DateTime, NaiveDate};
use git2::{Commit, Repository, Signature, Time};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn setup_test_repo() -> (TempDir, Repository) {
    let temp_dir = TempDir::new().unwrap();
    let repo = Repository::init(temp_dir.path()).unwrap();
    (temp_dir, repo)
}

/// Write `content` to `file` and commit it with committer time `when`
fn commit_at(repo: &Repository, file: &str, content: &[u8], message: &str, when: &str) {
    let workdir = repo.workdir().unwrap();
    let file_path = workdir.join(file);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&file_path, content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(file)).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let when = DateTime::parse_from_rfc3339(when).unwrap();
    let time = Time::new(when.timestamp(), when.offset().local_minus_utc() / 60);
    let signature = Signature::new("Test User", "test@example.com", &time).unwrap();

    let parents: Vec<Commit> = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().unwrap()],
        Err(_) => Vec::new(),
    };
    let parent_refs: Vec<&Commit> = parents.iter().collect();

    repo.commit(
        Some("HEAD"),
        &signature,
        &signature,
        message,
        &tree,
        &parent_refs,
    )
    .unwrap();
}

fn populate(repo: &Repository) {
    commit_at(repo, "a.txt", b"hello\n", "Fix typo", "2025-06-01T10:00:00Z");
    commit_at(repo, "b.txt", b"x\ny\n", "Add feature flag", "2025-06-10T10:00:00Z");
    commit_at(
        repo,
        "src/importer.rs",
        b"a\nb\nc\n",
        "Implement importer",
        "2025-06-21T00:30:00Z",
    );
    commit_at(
        repo,
        "logo.png",
        &[0x89, b'P', b'N', b'G', 0, 0, 1, 2],
        "Add logo",
        "2025-06-22T12:00:00Z",
    );
    commit_at(
        repo,
        "src/importer.rs",
        b"a\nb\nc\nd\n",
        "Refactor importer",
        "2025-06-25T08:00:00Z",
    );
}

fn adoption() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 21).unwrap()
}

#[tokio::test]
async fn test_analyze_repo_with_commits() {
    let (temp_dir, repo) = setup_test_repo();
    populate(&repo);

    let source = GitCliSource::open(temp_dir.path()).unwrap();
    let analyzer = Analyzer::new(source, ComplexityClassifier::default());
    let outcome = analyzer
        .run(&AnalysisRequest::new(adoption(), 30), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(outcome.report.commits_before, 2);
    assert_eq!(outcome.report.commits_after, 3);
    assert_eq!(outcome.before.metrics.total_insertions, 3);
    assert_eq!(outcome.after.metrics.total_insertions, 4);
    assert_eq!(outcome.after.metrics.binary_files_skipped, 1);
    assert_eq!(outcome.after.top_files, vec![("src/importer.rs".to_string(), 2)]);
    assert_eq!(outcome.report.complex_commits_after, 2);
    assert_eq!(outcome.after.metrics.malformed_lines, 0);
    assert_eq!(outcome.after.metrics.commits_outside_window, 0);
}

#[tokio::test]
async fn test_summary_format_counts_without_lines() {
    let (temp_dir, repo) = setup_test_repo();
    populate(&repo);

    let source = GitCliSource::open(temp_dir.path()).unwrap();
    let analyzer = Analyzer::new(source, ComplexityClassifier::default());
    let mut request = AnalysisRequest::new(adoption(), 30);
    request.format = LogFormat::Summary;

    let outcome = analyzer
        .run(&request, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.report.commits_before, 2);
    assert_eq!(outcome.report.commits_after, 3);
    assert_eq!(outcome.after.metrics.total_insertions, 0);
    assert!(outcome.after.top_files.is_empty());
}

#[tokio::test]
async fn test_boundary_commit_follows_timezone() {
    let (temp_dir, repo) = setup_test_repo();
    // 01:30 UTC on adoption day, from a -02:00 machine
    commit_at(
        &repo,
        "late.txt",
        b"late\n",
        "chore: late night",
        "2025-06-20T23:30:00-02:00",
    );

    let analyzer = Analyzer::new(
        GitCliSource::open(temp_dir.path()).unwrap(),
        ComplexityClassifier::default(),
    );

    let utc = analyzer
        .run(&AnalysisRequest::new(adoption(), 7), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!((utc.report.commits_before, utc.report.commits_after), (0, 1));

    let mut shifted = AnalysisRequest::new(adoption(), 7);
    shifted.timezone = "-02:00".parse::<WindowTz>().unwrap();
    let shifted = analyzer
        .run(&shifted, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!((shifted.report.commits_before, shifted.report.commits_after), (1, 0));
    assert_eq!(
        shifted.before.top_days,
        vec![(NaiveDate::from_ymd_opt(2025, 6, 20).unwrap(), 1)]
    );
}

#[tokio::test]
async fn test_analyze_empty_repo() {
    let (temp_dir, _repo) = setup_test_repo();
    let analyzer = Analyzer::new(
        GitCliSource::open(temp_dir.path()).unwrap(),
        ComplexityClassifier::default(),
    );

    // no commits yet: both windows are empty rather than an error
    let outcome = analyzer
        .run(&AnalysisRequest::new(adoption(), 30), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(outcome.report.commits_before, 0);
    assert_eq!(outcome.report.commits_after, 0);
    assert_eq!(
        outcome.after.metrics,
        WindowMetrics::new(outcome.after.metrics.window)
    );
    assert!(outcome.report.multiplier.is_undefined());
    assert!(outcome.report.percent_change.is_undefined());
}

#[tokio::test]
async fn test_missing_repository_is_unavailable() {
    let temp_dir = TempDir::new().unwrap();
    let result = GitCliSource::open(temp_dir.path().join("not-a-repo"));
    assert!(matches!(result, Err(AnalysisError::SourceUnavailable { .. })));
}

#[tokio::test]
async fn test_open_from_subdirectory() {
    let (temp_dir, repo) = setup_test_repo();
    populate(&repo);

    let source = GitCliSource::open(temp_dir.path().join("src")).unwrap();
    assert_eq!(
        source.workdir().canonicalize().unwrap(),
        temp_dir.path().canonicalize().unwrap()
    );
}
