//! Per-file source analysis entry points.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::debug;

use super::complexity::cyclomatic_complexity;
use super::languages;
use super::{FileAnalysis, Language};

/// Analyze in-memory content for a file path.
///
/// Returns `None` when the extension maps to no supported language.
pub fn analyze_source(path: &Path, content: &str) -> Option<FileAnalysis> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let language = Language::from_extension(ext)?;

    let symbols = languages::extract(language, ext, content);
    Some(FileAnalysis::new(
        path.to_path_buf(),
        language,
        content,
        symbols,
        cyclomatic_complexity(content),
    ))
}

/// Read and analyze a file.
///
/// Returns `None` for unsupported extensions and for files that cannot be
/// read as UTF-8 text; callers skip those silently.
pub fn analyze_file(path: &Path) -> Option<FileAnalysis> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    Language::from_extension(ext)?;

    match fs::read_to_string(path) {
        Ok(content) => analyze_source(path, &content),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "skipping unreadable file");
            None
        }
    }
}

/// Analyze many files in parallel.
///
/// Results keep the order of `paths`; skipped files are left out.
pub fn analyze_files_parallel(paths: &[PathBuf]) -> Vec<FileAnalysis> {
    paths
        .par_iter()
        .map(|p| analyze_file(p))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unsupported_extension_yields_none() {
        assert!(analyze_source(Path::new("/r/readme.md"), "# title").is_none());
        assert!(analyze_source(Path::new("/r/Makefile"), "all:").is_none());
    }

    #[test]
    fn test_analyze_source_attaches_metrics() {
        let fa = analyze_source(
            Path::new("/r/a.js"),
            "const b = require('./b');\nif (b) { b(); }\n",
        )
        .unwrap();
        assert_eq!(fa.language, Language::JavaScript);
        assert_eq!(fa.lines, 2);
        assert_eq!(fa.complexity, 2);
        assert!(fa.imports.contains("./b"));
        assert!(fa.interfaces.is_none());
    }

    #[test]
    fn test_parallel_analysis_preserves_order() {
        let temp = TempDir::new().unwrap();
        let mut paths = Vec::new();
        for name in ["c.py", "notes.txt", "a.go", "b.ts"] {
            let path = temp.path().join(name);
            fs::write(&path, "x = 1\n").unwrap();
            paths.push(path);
        }
        // unreadable bytes are skipped, not fatal
        let binary = temp.path().join("bin.js");
        fs::write(&binary, [0xff, 0xfe, 0x00]).unwrap();
        paths.push(binary);

        let results = analyze_files_parallel(&paths);
        let names: Vec<_> = results.iter().map(|f| f.stem().to_string()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
