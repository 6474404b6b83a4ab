//! Streaming parser for the delimiter/numstat log grammar.
//!
//! ```text
//! \x1e<sha>\x1f<committer ISO-8601>\x1f<subject>
//! <insertions>\t<deletions>\t<path>
//! -\t-\t<binary path>
//! ```
//!
//! Records are yielded one at a time while the input is read line by line;
//! nothing beyond the commit under construction is buffered.

use chrono::{DateTime, FixedOffset};
use log::{debug, warn};
use std::str::Lines;

use super::source::{FIELD_SEPARATOR, RECORD_SEPARATOR};
use crate::types::{CommitRecord, FileChange};

const MAX_REPORTED_LINE: usize = 200;

/// A line that matched neither grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    /// 1-based line number in the raw log
    pub line_number: usize,
    pub content: String,
}

/// Recoverable problems met while parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseDiagnostics {
    pub malformed_lines: usize,
    pub first_malformed: Option<MalformedLine>,
}

struct Header {
    sha: String,
    timestamp: DateTime<FixedOffset>,
    message: String,
}

impl Header {
    fn into_record(self, files_changed: Vec<FileChange>) -> CommitRecord {
        CommitRecord {
            sha: self.sha,
            timestamp: self.timestamp,
            message: self.message,
            files_changed,
        }
    }
}

/// Lazily turns raw log text into [`CommitRecord`]s.
///
/// Iterate it by reference (`&mut parser`) to read [`ParseDiagnostics`]
/// once the stream is drained.
pub struct LogStreamParser<'a> {
    lines: Lines<'a>,
    lines_read: usize,
    pending: Option<Header>,
    diagnostics: ParseDiagnostics,
}

impl<'a> LogStreamParser<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self {
            lines: raw.lines(),
            lines_read: 0,
            pending: None,
            diagnostics: ParseDiagnostics::default(),
        }
    }

    pub fn diagnostics(&self) -> &ParseDiagnostics {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> ParseDiagnostics {
        self.diagnostics
    }

    /// Lines consumed from the input so far
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    fn next_line(&mut self) -> Option<&'a str> {
        let line = self.lines.next()?;
        self.lines_read += 1;
        Some(line)
    }

    fn record_malformed(&mut self, line: &str) {
        self.diagnostics.malformed_lines += 1;
        let content: String = line.chars().take(MAX_REPORTED_LINE).collect();
        warn!("skipping malformed log line {}: {:?}", self.lines_read, content);
        if self.diagnostics.first_malformed.is_none() {
            self.diagnostics.first_malformed = Some(MalformedLine {
                line_number: self.lines_read,
                content,
            });
        }
    }

    /// Skip forward to the next well-formed delimiter line. Anything passed
    /// on the way belongs to no commit.
    fn seek_header(&mut self) -> Option<Header> {
        while let Some(line) = self.next_line() {
            if let Some(header) = line.strip_prefix(RECORD_SEPARATOR).and_then(parse_header) {
                return Some(header);
            }
            if !line.trim().is_empty() {
                self.record_malformed(line);
            }
        }
        None
    }
}

impl Iterator for LogStreamParser<'_> {
    type Item = CommitRecord;

    fn next(&mut self) -> Option<CommitRecord> {
        let header = match self.pending.take() {
            Some(header) => header,
            None => self.seek_header()?,
        };

        let mut files = Vec::new();
        while let Some(line) = self.next_line() {
            if let Some(body) = line.strip_prefix(RECORD_SEPARATOR) {
                match parse_header(body) {
                    Some(next) => self.pending = Some(next),
                    None => {
                        self.record_malformed(line);
                        self.pending = self.seek_header();
                    }
                }
                break;
            }
            if line.trim().is_empty() {
                continue;
            }
            match parse_numstat(line) {
                Some(file) => files.push(file),
                None => self.record_malformed(line),
            }
        }

        Some(header.into_record(files))
    }
}

fn parse_header(body: &str) -> Option<Header> {
    let mut fields = body.splitn(3, FIELD_SEPARATOR);
    let sha = fields.next()?.trim();
    let timestamp = fields.next()?.trim();
    let message = fields.next()?;

    if sha.is_empty() || !sha.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let timestamp = DateTime::parse_from_rfc3339(timestamp).ok()?;

    Some(Header {
        sha: sha.to_string(),
        timestamp,
        message: message.trim().to_string(),
    })
}

fn parse_numstat(line: &str) -> Option<FileChange> {
    let mut parts = line.splitn(3, '\t');
    let insertions = parts.next()?;
    let deletions = parts.next()?;
    let path = parts.next()?;
    if path.is_empty() {
        return None;
    }
    let path = resolve_rename(path);

    if insertions == "-" && deletions == "-" {
        debug!("binary change to {path}");
        return Some(FileChange::binary(path));
    }
    Some(FileChange::text(
        path,
        insertions.parse().ok()?,
        deletions.parse().ok()?,
    ))
}

const RENAME_ARROW: &str = " => ";

/// `old => new` and `dir/{old => new}/file` both resolve to the new path.
///
/// The rename group is the brace pair immediately around the arrow, so
/// braces elsewhere in the path (`{{slug}}/{a => b}`) are kept as-is.
fn resolve_rename(path: &str) -> String {
    let Some(arrow) = path.find(RENAME_ARROW) else {
        return path.to_string();
    };
    let new_start = arrow + RENAME_ARROW.len();

    let open = path[..arrow]
        .rfind('{')
        .filter(|&open| !path[open..arrow].contains('}'));
    let close = path[new_start..]
        .find('}')
        .map(|offset| new_start + offset)
        .filter(|&close| !path[new_start..close].contains('{'));

    match (open, close) {
        (Some(open), Some(close)) => {
            let joined = format!(
                "{}{}{}",
                &path[..open],
                &path[new_start..close],
                &path[close + 1..]
            );
            joined.replace("//", "/").trim_start_matches('/').to_string()
        }
        _ => path[new_start..].to_string(),
    }
}
