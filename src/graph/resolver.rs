//! Import specifier resolution.
//!
//! Turns a raw specifier written in one file into the file it refers to:
//! relative paths first, then path aliases, then the base root for
//! project-looking specifiers. Everything else is an external package.

use std::path::{Path, PathBuf};

use super::aliases::AliasConfig;
use crate::paths::normalize;

/// Extensions tried when expanding a candidate, in order.
pub const RESOLVABLE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts", "py", "java", "go",
];

/// Compiled-output extensions and the source extensions they may stand for.
const SOURCE_COUNTERPARTS: &[(&str, &[&str])] = &[
    ("js", &["ts", "tsx"]),
    ("jsx", &["tsx"]),
    ("mjs", &["mts"]),
    ("cjs", &["cts"]),
];

/// Resolves import specifiers to files on disk.
#[derive(Debug, Clone, Default)]
pub struct ImportResolver {
    aliases: AliasConfig,
}

impl ImportResolver {
    pub fn new(aliases: AliasConfig) -> Self {
        Self { aliases }
    }

    pub fn aliases(&self) -> &AliasConfig {
        &self.aliases
    }

    /// Resolve `spec` as written in `from`.
    ///
    /// Returns the first existing regular file among the expanded
    /// candidates, or `None` for external or unresolvable specifiers.
    pub fn resolve(&self, from: &Path, spec: &str) -> Option<PathBuf> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }

        self.base_candidates(from, spec)
            .iter()
            .flat_map(|c| expand_candidates(c))
            .find(|c| c.is_file())
    }

    /// Candidate paths before extension and index expansion.
    fn base_candidates(&self, from: &Path, spec: &str) -> Vec<PathBuf> {
        let dir = from.parent().unwrap_or(Path::new(""));

        if spec.starts_with('.') {
            let is_python = from.extension().is_some_and(|e| e == "py");
            let relative = if is_python {
                python_relative(spec)
            } else {
                PathBuf::from(spec)
            };
            return vec![normalize(&dir.join(relative))];
        }

        for rule in &self.aliases.rules {
            if let Some(targets) = rule.substitute(spec) {
                return targets;
            }
        }

        match &self.aliases.base_url {
            Some(base) if looks_project_relative(spec) => vec![normalize(&base.join(spec))],
            _ => Vec::new(),
        }
    }
}

/// Whether a non-relative specifier plausibly names a project path.
fn looks_project_relative(spec: &str) -> bool {
    spec.contains('/')
        || spec.starts_with('@')
        || spec.starts_with('~')
        || has_known_extension(Path::new(spec))
}

fn has_known_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| RESOLVABLE_EXTENSIONS.contains(&e))
}

/// `..pkg.mod` -> `../pkg/mod`, `.` -> `.`
fn python_relative(spec: &str) -> PathBuf {
    let dots = spec.chars().take_while(|&c| c == '.').count();
    let module = &spec[dots..];

    let mut path = PathBuf::from(".");
    for _ in 1..dots {
        path.push("..");
    }
    for part in module.split('.').filter(|p| !p.is_empty()) {
        path.push(part);
    }
    path
}

/// Existence-check candidates for one base path, in priority order.
///
/// The literal path, then the path with each extension appended (unless it
/// already carries a known one), then `index.<ext>` inside it. Python
/// packages also resolve to `__init__.py`.
pub fn expand_candidates(base: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![base.to_path_buf()];

    if let Some(ext) = base.extension().and_then(|e| e.to_str()) {
        if let Some((_, sources)) = SOURCE_COUNTERPARTS.iter().find(|(out, _)| *out == ext) {
            candidates.extend(sources.iter().map(|src| base.with_extension(src)));
        }
    }

    if !has_known_extension(base) {
        for ext in RESOLVABLE_EXTENSIONS {
            let mut appended = base.as_os_str().to_os_string();
            appended.push(".");
            appended.push(ext);
            candidates.push(PathBuf::from(appended));
        }
    }

    for ext in RESOLVABLE_EXTENSIONS {
        candidates.push(base.join(format!("index.{ext}")));
    }
    candidates.push(base.join("__init__.py"));

    candidates
}
