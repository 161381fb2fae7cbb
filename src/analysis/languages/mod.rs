//! Language-specific extraction rules.
//!
//! Every language carries one extraction rule, selected by a single lookup
//! on the file extension:
//!
//! | language   | rule                                   |
//! |------------|----------------------------------------|
//! | javascript | tree-sitter parse, pattern fallback    |
//! | typescript | tree-sitter parse, pattern fallback    |
//! | python     | patterns only                          |
//! | java       | patterns only                          |
//! | go         | patterns only                          |

mod ecmascript;
mod ecmascript_patterns;
mod go;
mod java;
mod python;

pub use ecmascript::Grammar;

use tracing::debug;

use super::{Language, Symbols};

/// How symbols are extracted for a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    /// Full syntax-tree walk with the given grammar; patterns when the parse fails.
    Syntax(Grammar),
    /// Pattern matching over raw text.
    Patterns,
}

impl Extraction {
    /// Select the extraction rule for a language and file extension.
    pub fn for_file(language: Language, ext: &str) -> Self {
        match language {
            Language::JavaScript => Extraction::Syntax(Grammar::JavaScript),
            Language::TypeScript if ext == "tsx" => Extraction::Syntax(Grammar::Tsx),
            Language::TypeScript => Extraction::Syntax(Grammar::TypeScript),
            Language::Python | Language::Java | Language::Go => Extraction::Patterns,
        }
    }
}

/// Extract symbols from source text.
///
/// Never fails: pattern extraction always yields a (possibly empty) result.
pub fn extract(language: Language, ext: &str, source: &str) -> Symbols {
    match Extraction::for_file(language, ext) {
        Extraction::Syntax(grammar) => match ecmascript::extract(grammar, source) {
            Ok(symbols) => symbols,
            Err(e) => {
                debug!(language = %language, error = %e, "syntax extraction failed, using patterns");
                ecmascript_patterns::extract(source)
            }
        },
        Extraction::Patterns => extract_with_patterns(language, source),
    }
}

/// Pattern-only extraction for any supported language.
pub fn extract_with_patterns(language: Language, source: &str) -> Symbols {
    match language {
        Language::JavaScript | Language::TypeScript => ecmascript_patterns::extract(source),
        Language::Python => python::extract(source),
        Language::Java => java::extract(source),
        Language::Go => go::extract(source),
    }
}
