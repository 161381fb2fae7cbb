//! Directory traversal with ignore rules and symlink-cycle protection.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::paths::to_slash;

/// Ignore patterns matched case-insensitively against the root-relative
/// path and each of its segments.
///
/// Plain patterns compare whole segments (or a whole leading path), so
/// `build` ignores `build/` but not `build-utils/`. Patterns with glob
/// metacharacters are compiled with globset.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    literals: Vec<String>,
    globs: GlobSet,
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::new::<&str>(&[])
    }
}

impl IgnoreRules {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let mut literals = Vec::new();
        let mut builder = GlobSetBuilder::new();

        for pattern in patterns {
            let pattern = pattern.as_ref().trim().trim_matches('/');
            if pattern.is_empty() {
                continue;
            }
            if !pattern.contains(['*', '?', '[', '{']) {
                literals.push(pattern.to_lowercase());
                continue;
            }
            match GlobBuilder::new(pattern).case_insensitive(true).build() {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => warn!(pattern, error = %e, "ignoring invalid ignore pattern"),
            }
        }

        let globs = builder.build().unwrap_or_else(|e| {
            warn!(error = %e, "failed to compile ignore patterns");
            GlobSet::empty()
        });

        Self { literals, globs }
    }

    /// Whether a root-relative, forward-slash path is ignored.
    pub fn is_ignored(&self, relative: &str) -> bool {
        let relative = relative.trim_matches('/');
        if relative.is_empty() {
            return false;
        }
        let lowered = relative.to_lowercase();
        let segments: Vec<&str> = lowered.split('/').collect();

        let literal_hit = self.literals.iter().any(|pattern| {
            if pattern.contains('/') {
                lowered == *pattern || lowered.starts_with(&format!("{pattern}/"))
            } else {
                segments.iter().any(|s| s == pattern)
            }
        });

        literal_hit
            || self.globs.is_match(relative)
            || relative.split('/').any(|s| self.globs.is_match(s))
    }
}

/// Collect every regular file under `root` that no rule ignores.
///
/// Follows symlinks but enters each canonical directory once. Entries that
/// cannot be read are skipped. Paths are `root` joined with the relative
/// path, in file-name order.
pub fn walk_files(root: &Path, rules: &IgnoreRules) -> Vec<PathBuf> {
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let relative = entry
                .path()
                .strip_prefix(root)
                .map(to_slash)
                .unwrap_or_default();
            if rules.is_ignored(&relative) {
                return false;
            }
            if entry.file_type().is_dir() {
                return match fs::canonicalize(entry.path()) {
                    Ok(canonical) => visited.insert(canonical),
                    Err(_) => false,
                };
            }
            true
        });

    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => debug!(error = %e, "skipping unreadable entry"),
        }
    }

    files
}
