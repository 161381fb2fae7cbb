//! Per-file structural analysis.
//!
//! This module extracts "facts" from one source file at a time:
//! - Import specifiers exactly as written
//! - Declared functions, classes, interfaces (TypeScript) and structs (Go)
//! - Exported names
//! - A textual cyclomatic complexity
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐     ┌───────────────┐
//! │ Source Files    │────▶│ Extraction table │────▶│ FileAnalysis  │
//! └─────────────────┘     │ (syntax/patterns)│     └───────────────┘
//!                         └──────────────────┘
//! ```
//!
//! JavaScript and TypeScript are parsed with tree-sitter and fall back to
//! patterns when the parse fails. Python, Java and Go use patterns only.

mod complexity;
mod facts;
mod languages;
mod source;

pub use complexity::cyclomatic_complexity;
pub use facts::{FileAnalysis, Language, Symbols};
pub use languages::{extract, extract_with_patterns, Extraction, Grammar};
pub use source::{analyze_file, analyze_files_parallel, analyze_source};
