//! Fact structures produced by per-file source analysis.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Supported source languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    TypeScript,
    Python,
    Java,
    Go,
}

impl Language {
    /// Map a file extension (without dot) to a language.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "js" | "jsx" | "mjs" => Some(Language::JavaScript),
            "ts" | "tsx" => Some(Language::TypeScript),
            "py" => Some(Language::Python),
            "java" => Some(Language::Java),
            "go" => Some(Language::Go),
            _ => None,
        }
    }

    /// Convert to a string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Java => "java",
            Language::Go => "go",
        }
    }

    /// All supported languages in table order.
    pub fn all() -> &'static [Language] {
        &[
            Language::JavaScript,
            Language::TypeScript,
            Language::Python,
            Language::Java,
            Language::Go,
        ]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structural symbols extracted from one file, before size/complexity are attached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Symbols {
    /// Import specifiers exactly as written (`./foo`, `@/bar`, `fmt`).
    pub imports: BTreeSet<String>,
    pub functions: BTreeSet<String>,
    pub classes: BTreeSet<String>,
    /// Exported names; may contain the sentinels `default` and `*`.
    pub exports: BTreeSet<String>,
    pub interfaces: BTreeSet<String>,
    pub structs: BTreeSet<String>,
}

/// Analysis of a single source file.
///
/// Immutable once produced; the orchestrator wraps it into an
/// [`EnrichedFile`](crate::analyzer::EnrichedFile) instead of mutating it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileAnalysis {
    /// Absolute path of the file (unique key).
    pub path: PathBuf,
    pub language: Language,
    /// Size in bytes.
    pub size: u64,
    pub lines: usize,
    pub imports: BTreeSet<String>,
    pub functions: BTreeSet<String>,
    pub classes: BTreeSet<String>,
    pub exports: BTreeSet<String>,
    /// Interface names (typescript only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<BTreeSet<String>>,
    /// Struct names (go only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structs: Option<BTreeSet<String>>,
    /// Textual cyclomatic complexity, always >= 1.
    pub complexity: u32,
}

impl FileAnalysis {
    /// Assemble a record from extracted symbols.
    pub fn new(
        path: PathBuf,
        language: Language,
        content: &str,
        symbols: Symbols,
        complexity: u32,
    ) -> Self {
        let Symbols {
            imports,
            functions,
            classes,
            exports,
            interfaces,
            structs,
        } = symbols;

        Self {
            path,
            language,
            size: content.len() as u64,
            lines: content.lines().count(),
            imports,
            functions,
            classes,
            exports,
            interfaces: (language == Language::TypeScript).then_some(interfaces),
            structs: (language == Language::Go).then_some(structs),
            complexity: complexity.max(1),
        }
    }

    /// File name without its extension (`index` for `src/index.ts`).
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
    }

    /// Whether the file declares any export.
    pub fn has_exports(&self) -> bool {
        !self.exports.is_empty()
    }
}
