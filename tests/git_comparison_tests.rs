use chrono::NaiveDate;
use commit_delta::analysis::{AnalysisRequest, Analyzer, ComplexityClassifier, GitCliSource};
use commit_delta::{DateWindow, LogFormat, WindowPair, WindowTz};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

fn run_git_command(repo_path: &Path, args: &[&str], date: Option<&str>) -> String {
    let mut command = Command::new("git");
    command
        .current_dir(repo_path)
        .args(["-c", "user.name=Test User", "-c", "user.email=test@example.com"])
        .args(args);
    if let Some(date) = date {
        command
            .env("GIT_AUTHOR_DATE", date)
            .env("GIT_COMMITTER_DATE", date);
    }
    let output = command.output().expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn range_args(window: &DateWindow) -> [String; 2] {
    [
        format!("--since={}", window.start_instant().unwrap().to_rfc3339()),
        format!("--until={}", window.end_instant().unwrap().to_rfc3339()),
    ]
}

fn get_git_commit_count(repo_path: &Path, window: &DateWindow) -> u64 {
    let [since, until] = range_args(window);
    let output = run_git_command(repo_path, &["rev-list", "--count", &since, &until, "HEAD"], None);
    output.trim().parse().unwrap_or(0)
}

fn get_git_line_stats(repo_path: &Path, window: &DateWindow) -> (u64, u64) {
    let [since, until] = range_args(window);
    let output = run_git_command(
        repo_path,
        &["log", "--numstat", "--format=", &since, &until],
        None,
    );
    let mut added = 0;
    let mut deleted = 0;

    for line in output.lines() {
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() >= 3 {
            if let (Ok(a), Ok(d)) = (parts[0].parse::<u64>(), parts[1].parse::<u64>()) {
                added += a;
                deleted += d;
            }
        }
    }
    (added, deleted)
}

/// Forty commits spread across April and May 2025, committed at noon UTC so
/// none of them sits on a window boundary.
fn build_repo() -> TempDir {
    let temp_dir = TempDir::new().expect("failed to create temporary directory");
    let repo_path = temp_dir.path();
    run_git_command(repo_path, &["init", "--quiet"], None);

    let start = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
    let messages = ["Fix flaky test", "Add export", "Refactor loader", "chore: bump"];
    for i in 0..40u64 {
        let day = start + chrono::Days::new(i * 3 / 2);
        let file_name = format!("src/module_{}.rs", i % 7);
        let file_path = repo_path.join(&file_name);
        fs::create_dir_all(file_path.parent().unwrap()).unwrap();

        let mut content = fs::read_to_string(&file_path).unwrap_or_default();
        for line in 0..=(i % 5) {
            content.push_str(&format!("// change {i} line {line}\n"));
        }
        if i % 4 == 3 {
            content = content.lines().skip(1).map(|l| format!("{l}\n")).collect();
        }
        fs::write(&file_path, content).unwrap();
        if i == 17 {
            fs::write(repo_path.join("assets.bin"), [0u8, 159, 146, 150, 0, 1]).unwrap();
            run_git_command(repo_path, &["add", "assets.bin"], None);
        }

        let when = format!("{day}T12:00:00+0000");
        run_git_command(repo_path, &["add", &file_name], None);
        run_git_command(
            repo_path,
            &["commit", "--quiet", "-m", messages[i as usize % messages.len()]],
            Some(&when),
        );
    }

    temp_dir
}

#[tokio::test]
async fn test_commit_count_accuracy() {
    let temp_dir = build_repo();
    let repo_path = temp_dir.path();
    let adoption = NaiveDate::from_ymd_opt(2025, 4, 25).unwrap();
    let windows = WindowPair::around(adoption, 21, 21, WindowTz::Utc).unwrap();

    let analyzer = Analyzer::new(
        GitCliSource::open(repo_path).unwrap(),
        ComplexityClassifier::default(),
    );
    let mut request = AnalysisRequest::new(adoption, 21);
    request.format = LogFormat::Summary;
    let result = analyzer
        .run(&request, &CancellationToken::new())
        .await
        .unwrap();

    // Get git's counts
    let git_before = get_git_commit_count(repo_path, &windows.before);
    let git_after = get_git_commit_count(repo_path, &windows.after);

    println!(
        "Before: git={} ours={}, after: git={} ours={}",
        git_before, result.report.commits_before, git_after, result.report.commits_after
    );
    assert!(git_before > 0 && git_after > 0);
    assert_eq!(result.report.commits_before, git_before);
    assert_eq!(result.report.commits_after, git_after);
}

#[tokio::test]
async fn test_line_stats_accuracy() {
    let temp_dir = build_repo();
    let repo_path = temp_dir.path();
    let adoption = NaiveDate::from_ymd_opt(2025, 4, 25).unwrap();
    let windows = WindowPair::around(adoption, 21, 21, WindowTz::Utc).unwrap();

    let analyzer = Analyzer::new(
        GitCliSource::open(repo_path).unwrap(),
        ComplexityClassifier::default(),
    );
    let result = analyzer
        .run(&AnalysisRequest::new(adoption, 21), &CancellationToken::new())
        .await
        .unwrap();

    for (summary, window) in [(&result.before, &windows.before), (&result.after, &windows.after)] {
        let (git_added, git_deleted) = get_git_line_stats(repo_path, window);
        assert_eq!(summary.metrics.total_insertions, git_added);
        assert_eq!(summary.metrics.total_deletions, git_deleted);
        assert_eq!(summary.metrics.malformed_lines, 0);
    }

    let binary_total =
        result.before.metrics.binary_files_skipped + result.after.metrics.binary_files_skipped;
    assert_eq!(binary_total, 1);
}

#[tokio::test]
async fn test_verification_command_matches() {
    let temp_dir = build_repo();
    let repo_path = temp_dir.path();
    let adoption = NaiveDate::from_ymd_opt(2025, 5, 10).unwrap();

    let analyzer = Analyzer::new(
        GitCliSource::open(repo_path).unwrap(),
        ComplexityClassifier::default(),
    );
    let result = analyzer
        .run(&AnalysisRequest::new(adoption, 14), &CancellationToken::new())
        .await
        .unwrap();

    let output = Command::new("sh")
        .current_dir(repo_path)
        .args(["-c", result.verification[0].as_str()])
        .output()
        .expect("failed to run verification command");
    let count: u64 = String::from_utf8_lossy(&output.stdout).trim().parse().unwrap();
    assert_eq!(count, result.report.commits_before);
}

#[tokio::test]
async fn test_verification_command_excludes_window_end() {
    let temp_dir = TempDir::new().expect("failed to create temporary directory");
    let repo_path = temp_dir.path();
    run_git_command(repo_path, &["init", "--quiet"], None);

    for (file_name, when) in [
        ("early.txt", "2025-05-05T12:00:00+0000"),
        ("midnight.txt", "2025-05-10T00:00:00+0000"),
    ] {
        fs::write(repo_path.join(file_name), "content\n").unwrap();
        run_git_command(repo_path, &["add", file_name], None);
        run_git_command(repo_path, &["commit", "--quiet", "-m", "Add file"], Some(when));
    }

    let analyzer = Analyzer::new(
        GitCliSource::open(repo_path).unwrap(),
        ComplexityClassifier::default(),
    );
    let adoption = NaiveDate::from_ymd_opt(2025, 5, 10).unwrap();
    let result = analyzer
        .run(&AnalysisRequest::new(adoption, 14), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.report.commits_before, 1);
    assert_eq!(result.report.commits_after, 1);

    for (command, expected) in result.verification.iter().zip([1, 1]) {
        let output = Command::new("sh")
            .current_dir(repo_path)
            .args(["-c", command.as_str()])
            .output()
            .expect("failed to run verification command");
        let count: u64 = String::from_utf8_lossy(&output.stdout).trim().parse().unwrap();
        assert_eq!(count, expected, "{command}");
    }
}
