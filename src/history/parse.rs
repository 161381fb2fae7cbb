//! Single-pass git log parsing into a repository index.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Record separator written before every commit header.
pub const RECORD_SEPARATOR: char = '\x1e';

/// `git log` pretty format matching [`parse_log`]: hash, author, strict ISO
/// date and subject, tab separated, after a record separator.
pub const LOG_FORMAT: &str = "--format=%x1e%H%x09%an%x09%aI%x09%s";

/// One commit from the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub hash: String,
    pub author: String,
    /// Strict ISO-8601 author date.
    pub date: String,
    pub message: String,
}

impl Commit {
    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.date).ok()
    }
}

/// A file that changed together with another one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoChange {
    pub file: String,
    /// Commits shared with the queried file.
    pub count: usize,
    /// `count` over the queried file's commit count.
    pub correlation: f64,
}

/// Recent commits touching one file, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentFile {
    pub file: String,
    pub commits: Vec<Commit>,
}

/// Commit and file lookups built from one log invocation.
///
/// File keys are repository-relative with forward slashes. Per-file commit
/// lists keep log order (most recent first).
#[derive(Debug, Default)]
pub struct RepositoryIndex {
    commits: Vec<Commit>,
    commit_files: HashMap<String, Vec<String>>,
    file_commits: HashMap<String, Vec<usize>>,
}

impl RepositoryIndex {
    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    /// Files touched by the commit `hash`.
    pub fn files_of(&self, hash: &str) -> &[String] {
        self.commit_files.get(hash).map_or(&[], Vec::as_slice)
    }

    pub fn file_count(&self) -> usize {
        self.file_commits.len()
    }

    /// Commits touching `path`, most recent first.
    pub fn history(&self, path: &str) -> Vec<Commit> {
        self.file_commits
            .get(path)
            .map(|ids| ids.iter().map(|&i| self.commits[i].clone()).collect())
            .unwrap_or_default()
    }

    /// Files sharing commits with `path`, with correlation >= `threshold`.
    ///
    /// Sorted by descending correlation; `path` itself is never included.
    pub fn files_changed_together(&self, path: &str, threshold: f64) -> Vec<CoChange> {
        let Some(ids) = self.file_commits.get(path) else {
            return Vec::new();
        };
        if ids.is_empty() {
            return Vec::new();
        }

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for &id in ids {
            for file in self.files_of(&self.commits[id].hash) {
                if file != path {
                    *counts.entry(file.as_str()).or_default() += 1;
                }
            }
        }

        let total = ids.len() as f64;
        let mut related: Vec<CoChange> = counts
            .into_iter()
            .map(|(file, count)| CoChange {
                file: file.to_string(),
                count,
                correlation: count as f64 / total,
            })
            .filter(|c| c.correlation >= threshold)
            .collect();

        related.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.file.cmp(&b.file)));
        related
    }

    /// Files touched by commits at or after `since`, most recently touched first.
    ///
    /// Commits whose date cannot be parsed are kept.
    pub fn recently_modified(&self, since: DateTime<Utc>) -> Vec<RecentFile> {
        let mut order: Vec<RecentFile> = Vec::new();
        let mut slots: HashMap<&str, usize> = HashMap::new();

        let recent = self.commits.iter().filter(|c| match c.timestamp() {
            Some(ts) => ts.with_timezone(&Utc) >= since,
            None => true,
        });

        for commit in recent {
            for file in self.files_of(&commit.hash) {
                let slot = *slots.entry(file.as_str()).or_insert_with(|| {
                    order.push(RecentFile {
                        file: file.clone(),
                        commits: Vec::new(),
                    });
                    order.len() - 1
                });
                order[slot].commits.push(commit.clone());
            }
        }

        order
    }
}

/// Parse `git log --name-only` output produced with [`LOG_FORMAT`].
///
/// Malformed headers are skipped along with their file lines.
pub fn parse_log(output: &str) -> RepositoryIndex {
    let mut index = RepositoryIndex::default();

    for record in output.split(RECORD_SEPARATOR) {
        let mut lines = record.lines();
        let Some(header) = lines.next() else {
            continue;
        };
        if header.trim().is_empty() {
            continue;
        }

        let Some(commit) = parse_header(header) else {
            debug!(header, "skipping malformed commit header");
            continue;
        };

        let mut seen = HashSet::new();
        let files: Vec<String> = lines
            .filter(|line| !line.trim().is_empty())
            .map(unquote_path)
            .filter(|line| seen.insert(line.clone()))
            .collect();

        let id = index.commits.len();
        for file in &files {
            index.file_commits.entry(file.clone()).or_default().push(id);
        }
        index.commit_files.insert(commit.hash.clone(), files);
        index.commits.push(commit);
    }

    index
}

/// Undo git's C-style quoting of a path (`"dir/a\tb.js"`, `"caf\303\251.js"`).
///
/// Unquoted lines are returned as they are.
pub fn unquote_path(line: &str) -> String {
    let Some(inner) = line
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return line.to_string();
    };

    let mut bytes = Vec::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        match chars.next() {
            Some('a') => bytes.push(0x07),
            Some('b') => bytes.push(0x08),
            Some('f') => bytes.push(0x0c),
            Some('n') => bytes.push(b'\n'),
            Some('r') => bytes.push(b'\r'),
            Some('t') => bytes.push(b'\t'),
            Some('v') => bytes.push(0x0b),
            Some(d @ '0'..='7') => {
                let mut value = d as u32 - '0' as u32;
                for _ in 0..2 {
                    match chars.peek() {
                        Some(&o @ '0'..='7') => {
                            value = value * 8 + (o as u32 - '0' as u32);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                bytes.push(value as u8);
            }
            Some(other) => {
                let mut buf = [0u8; 4];
                bytes.extend_from_slice(other.encode_utf8(&mut buf).as_bytes());
            }
            None => bytes.push(b'\\'),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn parse_header(header: &str) -> Option<Commit> {
    let mut fields = header.splitn(4, '\t');
    let hash = fields.next()?.trim();
    let author = fields.next()?;
    let date = fields.next()?.trim();
    let message = fields.next().unwrap_or("");

    if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    Some(Commit {
        hash: hash.to_string(),
        author: author.to_string(),
        date: date.to_string(),
        message: message.trim_end().to_string(),
    })
}
