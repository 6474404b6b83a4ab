//! Log sources: the only place that talks to git.

use chrono::Duration;
use futures::future::BoxFuture;
use git2::{ErrorCode, Repository};
use log::debug;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::process::Command;
use tokio::task::spawn_blocking;
use tokio_util::sync::CancellationToken;

use crate::error::{AnalysisError, Result};
use crate::types::LogFormat;
use crate::window::DateWindow;

/// Starts every commit delimiter line.
pub const RECORD_SEPARATOR: char = '\u{1e}';
/// Separates sha, timestamp and subject inside a delimiter line.
pub const FIELD_SEPARATOR: char = '\u{1f}';

const PRETTY_FORMAT: &str = "--pretty=format:%x1e%H%x1f%cI%x1f%s";

/// Fetches raw log text for a date window.
pub trait LogSource: Send + Sync {
    /// Return the raw log for `window` in `format`.
    ///
    /// Implementations must give up promptly once `cancel` fires and report
    /// [`AnalysisError::Cancelled`].
    fn fetch(
        &self,
        window: DateWindow,
        format: LogFormat,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<String>>;
}

/// The git invocation that produces a window's log.
#[derive(Debug, Clone, Copy)]
pub struct LogQuery {
    pub window: DateWindow,
    pub format: LogFormat,
}

impl LogQuery {
    pub fn new(window: DateWindow, format: LogFormat) -> Self {
        Self { window, format }
    }

    fn bounds(&self) -> Result<(String, String)> {
        Ok((
            self.window.start_instant()?.to_rfc3339(),
            self.window.end_instant()?.to_rfc3339(),
        ))
    }

    /// Arguments passed to `git`.
    pub fn args(&self) -> Result<Vec<String>> {
        let (since, until) = self.bounds()?;
        let mut args = vec![
            "-c".to_string(),
            "core.quotepath=off".to_string(),
            "log".to_string(),
            "--no-color".to_string(),
            format!("--since={since}"),
            format!("--until={until}"),
            PRETTY_FORMAT.to_string(),
        ];
        if self.format == LogFormat::NumStat {
            args.push("--numstat".to_string());
        }
        Ok(args)
    }

    /// A command anyone can paste into a shell to reproduce the commit count.
    ///
    /// git's `--until` is inclusive, so the printed bound stops one second
    /// short of the window end.
    pub fn verification_command(&self) -> Result<String> {
        let since = self.window.start_instant()?.to_rfc3339();
        let until = (self.window.end_instant()? - Duration::seconds(1)).to_rfc3339();
        Ok(format!(
            "git log --since=\"{since}\" --until=\"{until}\" --oneline | wc -l"
        ))
    }
}

/// Reads history by running the `git` binary inside a repository.
#[derive(Debug, Clone)]
pub struct GitCliSource {
    workdir: PathBuf,
    git_binary: PathBuf,
}

impl GitCliSource {
    /// Open the repository containing `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::discover(path)
            .map_err(|e| AnalysisError::unavailable(path.display(), e.message()))?;
        let workdir = repo
            .workdir()
            .unwrap_or_else(|| repo.path())
            .to_path_buf();
        debug!("using repository at {}", workdir.display());

        Ok(Self {
            workdir,
            git_binary: PathBuf::from("git"),
        })
    }

    /// Use a specific git executable instead of the one on `PATH`.
    pub fn with_git_binary(mut self, git_binary: impl Into<PathBuf>) -> Self {
        self.git_binary = git_binary.into();
        self
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }
}

impl LogSource for GitCliSource {
    fn fetch(
        &self,
        window: DateWindow,
        format: LogFormat,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            let args = LogQuery::new(window, format).args()?;
            debug!("running {} {}", self.git_binary.display(), args.join(" "));

            let mut command = Command::new(&self.git_binary);
            command
                .args(&args)
                .current_dir(&self.workdir)
                .stdin(Stdio::null())
                .kill_on_drop(true);

            // dropping the output future kills the child
            let output = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(AnalysisError::Cancelled { window: window.to_string() });
                }
                output = command.output() => output,
            };

            let output = output.map_err(|e| {
                let reason = if e.kind() == ErrorKind::NotFound {
                    format!("{} executable not found", self.git_binary.display())
                } else {
                    e.to_string()
                };
                AnalysisError::unavailable(window, reason)
            })?;

            if !output.status.success() {
                let workdir = self.workdir.clone();
                let unborn = spawn_blocking(move || head_is_unborn(&workdir))
                    .await
                    .unwrap_or(false);
                if unborn {
                    debug!(
                        "{} has no commits yet, treating {window} as empty",
                        self.workdir.display()
                    );
                    return Ok(String::new());
                }
                return Err(AnalysisError::unavailable(
                    window,
                    format!(
                        "git log exited with {}: {}",
                        output.status,
                        String::from_utf8_lossy(&output.stderr).trim()
                    ),
                ));
            }

            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        })
    }
}

/// A fresh repository has a HEAD that points at a branch with no commits.
fn head_is_unborn(workdir: &Path) -> bool {
    let Ok(repo) = Repository::open(workdir) else {
        return false;
    };
    let head = repo.head();
    matches!(head, Err(ref e) if e.code() == ErrorCode::UnbornBranch)
}

/// Serves pre-recorded log text, keyed by window and format.
///
/// Useful when the log was captured elsewhere, and in tests. Unknown keys
/// yield an empty log.
#[derive(Debug, Default)]
pub struct StaticSource {
    logs: HashMap<(DateWindow, LogFormat), String>,
    fetches: AtomicUsize,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(
        mut self,
        window: DateWindow,
        format: LogFormat,
        text: impl Into<String>,
    ) -> Self {
        self.logs.insert((window, format), text.into());
        self
    }

    /// How many times `fetch` has run to completion.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl LogSource for StaticSource {
    fn fetch(
        &self,
        window: DateWindow,
        format: LogFormat,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            if cancel.is_cancelled() {
                return Err(AnalysisError::Cancelled {
                    window: window.to_string(),
                });
            }
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.logs.get(&(window, format)).cloned().unwrap_or_default())
        })
    }
}
