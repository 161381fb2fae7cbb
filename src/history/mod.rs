//! Git history mining.
//!
//! The whole commit log is read once, on first need, into a
//! [`RepositoryIndex`]; ownership, change frequency and co-change are
//! projections over it. Concurrent first callers share a single in-flight
//! build. When the full build fails, single-file queries fall back to a
//! per-file `git log --follow`.
//!
//! Every query degrades to its empty default when the root is not a git
//! repository or git is unavailable.

mod error;
mod git;
mod parse;
mod stats;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::paths::relative_slash_path;

pub use error::{HistoryError, Result};
pub use git::GitExecutor;
pub use parse::{parse_log, unquote_path, CoChange, Commit, RecentFile, RepositoryIndex, LOG_FORMAT};
pub use stats::{change_frequency, ownership, ContributorCount, FileOwnership, UNKNOWN_OWNER};

/// Minimum co-change correlation reported by default.
pub const DEFAULT_COCHANGE_THRESHOLD: f64 = 0.3;

/// Default window for [`HistoryIndex::recently_modified_files`].
pub const DEFAULT_RECENT_DAYS: i64 = 90;

type SharedBuild = Shared<BoxFuture<'static, Result<Arc<RepositoryIndex>>>>;

enum IndexSlot {
    Empty,
    Pending { generation: u64, build: SharedBuild },
    Ready(Arc<RepositoryIndex>),
}

/// History queries for one repository root.
pub struct HistoryIndex {
    root: PathBuf,
    git: GitExecutor,
    /// Repository toplevel, or why there is none. Resolved once.
    toplevel: OnceCell<Result<PathBuf>>,
    slot: Mutex<IndexSlot>,
    generation: AtomicU64,
    file_cache: Mutex<HashMap<String, Arc<Vec<Commit>>>>,
}

impl HistoryIndex {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        Self {
            git: GitExecutor::new(&root),
            root,
            toplevel: OnceCell::new(),
            slot: Mutex::new(IndexSlot::Empty),
            generation: AtomicU64::new(0),
            file_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Verify the root is inside a git work tree; returns the toplevel.
    ///
    /// Runs git at most once per instance. A failure is logged once and the
    /// same error is returned to every later caller.
    pub async fn check_repository(&self) -> Result<&Path> {
        let result = self
            .toplevel
            .get_or_init(|| async {
                let toplevel = match self.git.run(&["rev-parse", "--show-toplevel"]).await {
                    Ok(out) if !out.trim().is_empty() => {
                        let toplevel = PathBuf::from(out.trim());
                        Ok(std::fs::canonicalize(&toplevel).unwrap_or(toplevel))
                    }
                    Ok(_) | Err(HistoryError::CommandFailed { .. }) => {
                        Err(HistoryError::NotARepository(self.root.clone()))
                    }
                    Err(e) => Err(e),
                };
                if let Err(e) = &toplevel {
                    warn!(root = %self.root.display(), error = %e, "git history unavailable");
                }
                toplevel
            })
            .await;

        result.as_deref().map_err(Clone::clone)
    }

    pub async fn is_repository(&self) -> bool {
        self.check_repository().await.is_ok()
    }

    /// The shared repository index, built on first call.
    ///
    /// Concurrent callers await the same build. A failed build is forgotten
    /// so a later call may retry.
    pub async fn index(&self) -> Result<Arc<RepositoryIndex>> {
        let toplevel = self.check_repository().await?.to_path_buf();

        let (generation, build) = {
            let mut slot = lock(&self.slot);
            match &*slot {
                IndexSlot::Ready(index) => return Ok(Arc::clone(index)),
                IndexSlot::Pending { generation, build } => (*generation, build.clone()),
                IndexSlot::Empty => {
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                    let build = build_index(GitExecutor::new(toplevel)).boxed().shared();
                    *slot = IndexSlot::Pending {
                        generation,
                        build: build.clone(),
                    };
                    (generation, build)
                }
            }
        };

        let result = build.await;

        let mut slot = lock(&self.slot);
        if matches!(&*slot, IndexSlot::Pending { generation: g, .. } if *g == generation) {
            *slot = match &result {
                Ok(index) => IndexSlot::Ready(Arc::clone(index)),
                Err(_) => IndexSlot::Empty,
            };
        }
        result
    }

    /// Commits touching `path`, most recent first.
    ///
    /// Relative paths are taken relative to the analyzed root. Paths outside
    /// the repository, and any failure, give an empty history.
    pub async fn file_history(&self, path: &Path) -> Vec<Commit> {
        match self.cached_history(path).await {
            Ok(history) => history.as_ref().clone(),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no history for file");
                Vec::new()
            }
        }
    }

    async fn cached_history(&self, path: &Path) -> Result<Arc<Vec<Commit>>> {
        let toplevel = self.check_repository().await?;
        let Some(key) = self.relative_key(toplevel, path) else {
            return Ok(Arc::default());
        };

        if let Some(cached) = lock(&self.file_cache).get(&key) {
            return Ok(Arc::clone(cached));
        }

        let history = match self.index().await {
            Ok(index) => index.history(&key),
            Err(e) => {
                debug!(file = %key, error = %e, "index unavailable, reading per-file log");
                file_log(&GitExecutor::new(toplevel), &key).await?
            }
        };

        let history = Arc::new(history);
        lock(&self.file_cache).insert(key, Arc::clone(&history));
        Ok(history)
    }

    pub async fn file_ownership(&self, path: &Path) -> FileOwnership {
        ownership(&self.file_history(path).await)
    }

    /// Commits per day over the file's lifetime; 0 with fewer than two commits.
    pub async fn change_frequency(&self, path: &Path) -> f64 {
        change_frequency(&self.file_history(path).await)
    }

    /// Files that share at least `threshold` of `path`'s commits.
    pub async fn files_changed_together(&self, path: &Path, threshold: f64) -> Vec<CoChange> {
        let Ok(toplevel) = self.check_repository().await else {
            return Vec::new();
        };
        let Some(key) = self.relative_key(toplevel, path) else {
            return Vec::new();
        };

        match self.index().await {
            Ok(index) => index.files_changed_together(&key, threshold),
            Err(e) => {
                debug!(file = %key, error = %e, "co-change needs the repository index");
                Vec::new()
            }
        }
    }

    /// Files touched in the last `days` days, most recently touched first.
    pub async fn recently_modified_files(&self, days: i64) -> Vec<RecentFile> {
        match self.index().await {
            Ok(index) => index.recently_modified(recent_cutoff(days)),
            Err(e) => {
                debug!(error = %e, "recent files unavailable");
                Vec::new()
            }
        }
    }

    /// Repository-relative paths of every file git tracks.
    pub async fn all_tracked_files(&self) -> Vec<String> {
        let Ok(toplevel) = self.check_repository().await else {
            return Vec::new();
        };
        match GitExecutor::new(toplevel).run(&["ls-files", "-z"]).await {
            Ok(out) => out
                .split('\0')
                .filter(|f| !f.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) => {
                debug!(error = %e, "git ls-files failed");
                Vec::new()
            }
        }
    }

    /// Forward-slash key relative to the toplevel, `None` when outside it.
    fn relative_key(&self, toplevel: &Path, path: &Path) -> Option<String> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        relative_slash_path(toplevel, &absolute)
    }
}

async fn build_index(git: GitExecutor) -> Result<Arc<RepositoryIndex>> {
    let started = Instant::now();
    let output = git
        .run(&["log", "--name-only", "--no-renames", LOG_FORMAT])
        .await?;
    let index = parse_log(&output);

    info!(
        commits = index.commits().len(),
        files = index.file_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "repository index built"
    );
    Ok(Arc::new(index))
}

async fn file_log(git: &GitExecutor, key: &str) -> Result<Vec<Commit>> {
    let output = git
        .run(&["log", "--follow", "--name-only", LOG_FORMAT, "--", key])
        .await?;
    Ok(parse_log(&output).commits().to_vec())
}

/// `now - days`, or the earliest representable time when that overflows.
fn recent_cutoff(days: i64) -> DateTime<Utc> {
    Duration::try_days(days)
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use tempfile::TempDir;

    /// Run git in `dir`; `false` when git is not installed.
    fn git(dir: &Path, args: &[&str]) -> bool {
        let Ok(out) = Command::new("git")
            .args(["-c", "commit.gpgsign=false", "-c", "core.hooksPath=/dev/null"])
            .args(["-c", "user.name=Dev", "-c", "user.email=dev@example.com"])
            .args(args)
            .current_dir(dir)
            .output()
        else {
            return false;
        };
        assert!(out.status.success(), "git {args:?}: {}", String::from_utf8_lossy(&out.stderr));
        true
    }

    fn commit_file(dir: &Path, file: &str, content: &str) {
        std::fs::write(dir.join(file), content).unwrap();
        git(dir, &["add", "-A"]);
        git(dir, &["commit", "-q", "-m", file]);
    }

    #[tokio::test]
    async fn test_failed_build_is_retried() {
        let temp = TempDir::new().unwrap();
        if !git(temp.path(), &["init", "-q"]) {
            return;
        }
        let history = HistoryIndex::new(temp.path());
        let file = history.root().join("a.js");

        // no commits yet: the full log fails, and so does the per-file log
        assert!(history.check_repository().await.is_ok());
        assert!(history.index().await.is_err());
        assert!(history.file_history(&file).await.is_empty());

        commit_file(history.root(), "a.js", "x");
        let index = history.index().await.unwrap();
        assert_eq!(index.commits().len(), 1);
        // the earlier failure was not cached
        assert_eq!(history.file_history(&file).await.len(), 1);
    }

    #[tokio::test]
    async fn test_per_file_log_when_index_unavailable() {
        let temp = TempDir::new().unwrap();
        if !git(temp.path(), &["init", "-q"]) {
            return;
        }
        let root = std::fs::canonicalize(temp.path()).unwrap();
        commit_file(&root, "a.js", "one");
        git(&root, &["mv", "a.js", "b.js"]);
        git(&root, &["commit", "-q", "-m", "rename"]);
        commit_file(&root, "b.js", "two");

        let history = HistoryIndex::new(&root);
        history.check_repository().await.unwrap();

        // a build that fails for every waiter
        *lock(&history.slot) = IndexSlot::Pending {
            generation: u64::MAX,
            build: futures::future::ready(Err(HistoryError::Io("log failed".into())))
                .boxed()
                .shared(),
        };

        // --follow reaches across the rename
        let commits = history.file_history(&root.join("b.js")).await;
        let messages: Vec<_> = commits.iter().map(|c| c.message.as_str()).collect();
        assert_eq!(messages, vec!["b.js", "rename", "a.js"]);
        assert!(matches!(*lock(&history.slot), IndexSlot::Empty));

        // co-change has no per-file fallback, but the slot was cleared and
        // the next query rebuilds
        assert!(history.index().await.is_ok());
        assert!(matches!(*lock(&history.slot), IndexSlot::Ready(_)));
    }

    #[test]
    fn test_recent_cutoff_saturates() {
        let week = recent_cutoff(7);
        assert!(week < Utc::now());
        assert!(week > Utc::now() - Duration::days(8));
        assert_eq!(recent_cutoff(100_000_000), DateTime::<Utc>::MIN_UTC);
        assert_eq!(recent_cutoff(i64::MAX), DateTime::<Utc>::MIN_UTC);
    }

    #[tokio::test]
    async fn test_non_repository_returns_defaults() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.js"), "x").unwrap();
        let history = HistoryIndex::new(temp.path());

        // inside an enclosing checkout this is not the case under test
        if history.is_repository().await {
            return;
        }

        let file = temp.path().join("a.js");
        assert!(history.check_repository().await.is_err());
        assert!(history.file_history(&file).await.is_empty());
        assert_eq!(history.file_ownership(&file).await, FileOwnership::default());
        assert_eq!(history.change_frequency(&file).await, 0.0);
        assert!(history.files_changed_together(&file, 0.3).await.is_empty());
        assert!(history.recently_modified_files(90).await.is_empty());
        assert!(history.all_tracked_files().await.is_empty());
        assert!(history.index().await.is_err());
    }
}
