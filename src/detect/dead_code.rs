//! Detection of files whose exports nothing imports.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::analysis::FileAnalysis;
use crate::graph::CallGraph;
use crate::paths::relative_slash_path;

/// Basenames (without extension) that mark an application entry point.
pub const DEFAULT_ENTRY_POINTS: &[&str] = &["index", "main", "app"];

/// Directory names that hold tests.
const TEST_DIRS: &[&str] = &["test", "tests", "__tests__"];

/// How sure the detector is that a file is unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
        }
    }
}

/// A file flagged as possibly dead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadCodeEntry {
    pub path: PathBuf,
    pub reason: String,
    pub exports: Vec<String>,
    pub confidence: Confidence,
}

/// Options for dead-code detection.
#[derive(Debug, Clone, Default)]
pub struct DeadCodeOptions {
    /// Consider test files too.
    pub include_tests: bool,
    /// Entry-point basenames on top of [`DEFAULT_ENTRY_POINTS`].
    pub extra_entry_points: Vec<String>,
}

impl DeadCodeOptions {
    fn is_entry_point(&self, stem: &str) -> bool {
        DEFAULT_ENTRY_POINTS.contains(&stem) || self.extra_entry_points.iter().any(|e| e == stem)
    }
}

/// Whether a root-relative, forward-slash path names a test file.
pub fn is_test_file(relative: &str) -> bool {
    let mut segments: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
    let Some(file_name) = segments.pop() else {
        return false;
    };

    if segments.iter().any(|s| TEST_DIRS.contains(s)) {
        return true;
    }

    // foo.test.ts, foo.spec.js
    let mut parts = file_name.rsplitn(3, '.');
    let (_ext, kind) = (parts.next(), parts.next());
    parts.next().is_some() && matches!(kind, Some("test") | Some("spec"))
}

/// Flag exporting files with no incoming edges.
///
/// Entry points, files without exports and (unless requested) test files
/// are never flagged. Output follows the order of `files`.
pub fn detect_dead_code(
    files: &[FileAnalysis],
    graph: &CallGraph,
    root: &Path,
    options: &DeadCodeOptions,
) -> Vec<DeadCodeEntry> {
    files
        .iter()
        .filter(|file| file.has_exports())
        .filter(|file| !options.is_entry_point(file.stem()))
        .filter(|file| {
            if options.include_tests {
                return true;
            }
            let relative = relative_slash_path(root, &file.path)
                .unwrap_or_else(|| file.path.to_string_lossy().replace('\\', "/"));
            !is_test_file(&relative)
        })
        .filter(|file| graph.in_degree(&file.path) == 0)
        .map(|file| DeadCodeEntry {
            path: file.path.clone(),
            reason: "No incoming imports and not an entry point".to_string(),
            exports: file.exports.iter().cloned().collect(),
            confidence: confidence(&file.exports),
        })
        .collect()
}

/// Default and star exports are often consumed in ways the resolver cannot see.
fn confidence(exports: &BTreeSet<String>) -> Confidence {
    if exports.contains("default") || exports.contains("*") {
        Confidence::Medium
    } else {
        Confidence::High
    }
}
