//! Repository analysis orchestration.
//!
//! Walks the tree, analyzes every supported file, builds the call graph,
//! runs dead-code detection and enriches each file with git history in
//! bounded batches.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::analysis::{analyze_files_parallel, FileAnalysis, Language};
use crate::config::AnalyzerConfig;
use crate::detect::{detect_dead_code, DeadCodeEntry, DeadCodeOptions};
use crate::graph::{AliasConfig, CallGraph, GraphNode, ImportResolver};
use crate::history::{CoChange, FileOwnership, HistoryIndex, RecentFile, UNKNOWN_OWNER};
use crate::walk::{walk_files, IgnoreRules};

/// Contributors kept in [`AnalysisResult::top_contributors`].
pub const TOP_CONTRIBUTORS: usize = 10;

/// Fatal analysis failures. Everything else degrades to defaults.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("repository root does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("repository root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("cannot read repository root {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Per-run switches, usually taken from [`AnalyzerConfig`].
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub include_tests: bool,
    pub cochange: bool,
    pub cochange_threshold: f64,
    pub cochange_limit: usize,
    pub batch_size: usize,
    pub recent_days: i64,
    pub extra_entry_points: Vec<String>,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self::from(&AnalyzerConfig::default())
    }
}

impl From<&AnalyzerConfig> for AnalyzeOptions {
    fn from(config: &AnalyzerConfig) -> Self {
        Self {
            include_tests: config.include_tests,
            cochange: config.cochange,
            cochange_threshold: config.cochange_threshold,
            cochange_limit: config.cochange_limit,
            batch_size: config.batch_size,
            recent_days: config.recent_days,
            extra_entry_points: config.entry_points.clone(),
        }
    }
}

/// A file's analysis plus history and graph information.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedFile {
    #[serde(flatten)]
    pub analysis: FileAnalysis,
    pub ownership: FileOwnership,
    pub change_frequency: f64,
    pub co_changes: Vec<CoChange>,
    #[serde(flatten)]
    pub graph: GraphNode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageStats {
    pub count: usize,
    pub total_lines: usize,
    pub total_size: u64,
}

/// Repository-wide contributor totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    pub name: String,
    pub commits: usize,
    /// Files this author is the primary owner of.
    pub files_owned: usize,
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub root: PathBuf,
    pub total_files: usize,
    pub files: Vec<EnrichedFile>,
    pub call_graph: CallGraph,
    pub dead_code: Vec<DeadCodeEntry>,
    pub language_stats: BTreeMap<Language, LanguageStats>,
    pub top_contributors: Vec<Contributor>,
    pub recently_modified: Vec<RecentFile>,
    pub timestamp: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn file(&self, path: &Path) -> Option<&EnrichedFile> {
        self.files.iter().find(|f| f.analysis.path == path)
    }
}

/// Analyzes one repository root.
pub struct RepositoryAnalyzer {
    root: PathBuf,
    config: AnalyzerConfig,
    resolver: ImportResolver,
    history: HistoryIndex,
}

impl RepositoryAnalyzer {
    /// Create an analyzer; fails only when `root` is not a usable directory.
    pub fn new(root: impl AsRef<Path>, config: AnalyzerConfig) -> Result<Self, AnalyzeError> {
        let root = check_root(root.as_ref())?;
        let aliases = AliasConfig::load(&root, config.alias_config.as_deref());
        debug!(
            rules = aliases.rules.len(),
            base_url = ?aliases.base_url,
            "path aliases loaded"
        );

        Ok(Self {
            resolver: ImportResolver::new(aliases),
            history: HistoryIndex::new(&root),
            root,
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryIndex {
        &self.history
    }

    /// Walk the tree and analyze every supported file, in walk order.
    pub fn analyze_files(&self) -> Vec<FileAnalysis> {
        let rules = IgnoreRules::new(&self.config.ignore);
        let paths = walk_files(&self.root, &rules);
        debug!(candidates = paths.len(), "walk finished");
        analyze_files_parallel(&paths)
    }

    /// Run the full analysis.
    pub async fn analyze(&self, options: &AnalyzeOptions) -> Result<AnalysisResult, AnalyzeError> {
        let started = Instant::now();
        check_root(&self.root)?;

        let files = self.analyze_files();
        let graph = CallGraph::build(&files, &self.resolver);
        let dead_code = detect_dead_code(
            &files,
            &graph,
            &self.root,
            &DeadCodeOptions {
                include_tests: options.include_tests,
                extra_entry_points: options.extra_entry_points.clone(),
            },
        );

        let batch_size = options.batch_size.max(1);
        let mut enriched = Vec::with_capacity(files.len());
        for batch in files.chunks(batch_size) {
            let results = join_all(batch.iter().map(|file| self.enrich(file, &graph, options))).await;
            enriched.extend(results);
        }

        let recently_modified = self.history.recently_modified_files(options.recent_days).await;

        let result = AnalysisResult {
            root: self.root.clone(),
            total_files: enriched.len(),
            language_stats: language_stats(&enriched),
            top_contributors: top_contributors(&enriched),
            files: enriched,
            call_graph: graph,
            dead_code,
            recently_modified,
            timestamp: Utc::now(),
        };

        info!(
            files = result.total_files,
            edges = result.call_graph.edge_count(),
            dead = result.dead_code.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "analysis complete"
        );
        Ok(result)
    }

    async fn enrich(
        &self,
        file: &FileAnalysis,
        graph: &CallGraph,
        options: &AnalyzeOptions,
    ) -> EnrichedFile {
        let co_changes = async {
            if !options.cochange {
                return Vec::new();
            }
            let mut related = self
                .history
                .files_changed_together(&file.path, options.cochange_threshold)
                .await;
            related.truncate(options.cochange_limit);
            related
        };

        let (ownership, change_frequency, co_changes) = tokio::join!(
            self.history.file_ownership(&file.path),
            self.history.change_frequency(&file.path),
            co_changes,
        );

        EnrichedFile {
            analysis: file.clone(),
            ownership,
            change_frequency,
            co_changes,
            graph: graph.node(&file.path).cloned().unwrap_or_default(),
        }
    }
}

fn check_root(root: &Path) -> Result<PathBuf, AnalyzeError> {
    let canonical = fs::canonicalize(root).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => AnalyzeError::RootNotFound(root.to_path_buf()),
        _ => AnalyzeError::Walk {
            path: root.to_path_buf(),
            source,
        },
    })?;

    if !canonical.is_dir() {
        return Err(AnalyzeError::NotADirectory(canonical));
    }
    fs::read_dir(&canonical).map_err(|source| AnalyzeError::Walk {
        path: canonical.clone(),
        source,
    })?;

    Ok(canonical)
}

/// Per-language file count, line and byte totals.
pub fn language_stats(files: &[EnrichedFile]) -> BTreeMap<Language, LanguageStats> {
    let mut stats: BTreeMap<Language, LanguageStats> = BTreeMap::new();
    for file in files {
        let entry = stats.entry(file.analysis.language).or_default();
        entry.count += 1;
        entry.total_lines += file.analysis.lines;
        entry.total_size += file.analysis.size;
    }
    stats
}

/// Merge per-file ownership into the top contributors by commit count.
pub fn top_contributors(files: &[EnrichedFile]) -> Vec<Contributor> {
    let mut totals: HashMap<&str, Contributor> = HashMap::new();

    for file in files {
        for c in &file.ownership.contributors {
            totals
                .entry(c.name.as_str())
                .or_insert_with(|| Contributor {
                    name: c.name.clone(),
                    commits: 0,
                    files_owned: 0,
                })
                .commits += c.commits;
        }

        let primary = file.ownership.primary.as_str();
        if primary != UNKNOWN_OWNER {
            if let Some(owner) = totals.get_mut(primary) {
                owner.files_owned += 1;
            }
        }
    }

    let mut contributors: Vec<Contributor> = totals.into_values().collect();
    contributors.sort_by(|a, b| b.commits.cmp(&a.commits).then_with(|| a.name.cmp(&b.name)));
    contributors.truncate(TOP_CONTRIBUTORS);
    contributors
}
