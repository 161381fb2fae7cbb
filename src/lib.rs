//! Archscope - repository architecture reconstruction.
//!
//! Archscope combines per-file static analysis, a file-to-file dependency
//! graph built from resolved imports, and git history mining.
//!
//! # Architecture
//!
//! - `analysis`: per-file extraction (imports, declarations, exports,
//!   complexity) with tree-sitter for JavaScript/TypeScript and patterns
//!   for Python, Java and Go
//! - `graph`: import resolution (relative paths, tsconfig aliases, base
//!   root, directory indexes) and the call graph
//! - `detect`: dead-code detection
//! - `history`: single-pass git log index with ownership, change frequency
//!   and co-change
//! - `analyzer`: orchestration with batched history enrichment
//! - `insights`: risk score, categories and features
//! - `config`, `report`, `cli`: configuration and presentation

pub mod analysis;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod detect;
pub mod graph;
pub mod history;
pub mod insights;
pub mod paths;
pub mod report;
pub mod walk;

pub use analysis::{analyze_file, analyze_source, FileAnalysis, Language};
pub use analyzer::{AnalysisResult, AnalyzeError, AnalyzeOptions, EnrichedFile, RepositoryAnalyzer};
pub use config::AnalyzerConfig;
pub use detect::{detect_dead_code, DeadCodeEntry};
pub use graph::{CallGraph, ImportResolver};
pub use history::{FileOwnership, HistoryError, HistoryIndex};
