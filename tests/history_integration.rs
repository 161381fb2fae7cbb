//! Integration tests for the git history index.
//!
//! Each test builds a throwaway repository with the `git` binary and is
//! skipped when git is not installed.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use archscope::history::{FileOwnership, HistoryIndex};
use tempfile::TempDir;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

struct Repo {
    _temp: TempDir,
    root: PathBuf,
}

impl Repo {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = fs::canonicalize(temp.path()).unwrap();
        let repo = Repo { _temp: temp, root };
        repo.git(&["init", "-q"], "Setup", None);
        repo
    }

    fn git(&self, args: &[&str], author: &str, date: Option<&str>) {
        let mut cmd = Command::new("git");
        cmd.args(["-c", "commit.gpgsign=false", "-c", "core.hooksPath=/dev/null"])
            .args(args)
            .current_dir(&self.root)
            .env("GIT_AUTHOR_NAME", author)
            .env("GIT_AUTHOR_EMAIL", format!("{}@example.com", author.to_lowercase()))
            .env("GIT_COMMITTER_NAME", author)
            .env("GIT_COMMITTER_EMAIL", format!("{}@example.com", author.to_lowercase()));
        if let Some(date) = date {
            cmd.env("GIT_AUTHOR_DATE", date).env("GIT_COMMITTER_DATE", date);
        }
        let out = cmd.output().unwrap();
        assert!(
            out.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&out.stderr)
        );
    }

    /// Write `files` (appending a line) and commit them.
    fn commit(&self, files: &[&str], author: &str, date: Option<&str>, message: &str) {
        for file in files {
            let path = self.root.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            let mut content = fs::read_to_string(&path).unwrap_or_default();
            content.push_str(&format!("// {message}\n"));
            fs::write(&path, content).unwrap();
        }
        self.git(&["add", "-A"], author, date);
        self.git(&["commit", "-q", "-m", message], author, date);
    }

    fn path(&self, file: &str) -> PathBuf {
        self.root.join(file)
    }
}

macro_rules! require_git {
    () => {
        if !git_available() {
            eprintln!("git not available, skipping");
            return;
        }
    };
}

#[tokio::test]
async fn test_cochange_threshold() {
    require_git!();
    let repo = Repo::new();
    repo.commit(&["a.js", "b.js"], "Alice", Some("2024-01-01T10:00:00+00:00"), "one");
    repo.commit(&["a.js"], "Alice", Some("2024-01-02T10:00:00+00:00"), "two");

    let history = HistoryIndex::new(&repo.root);
    let a = repo.path("a.js");

    assert!(history.files_changed_together(&a, 0.6).await.is_empty());

    let related = history.files_changed_together(&a, 0.3).await;
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].file, "b.js");
    assert_eq!(related[0].count, 1);
    assert!((related[0].correlation - 0.5).abs() < 1e-9);
    assert!(related.iter().all(|c| c.file != "a.js"));
}

#[tokio::test]
async fn test_ownership_and_change_frequency() {
    require_git!();
    let repo = Repo::new();
    repo.commit(&["src/a.js"], "Alice", Some("2024-01-01T00:00:00+00:00"), "start");
    repo.commit(&["src/a.js"], "Bob", Some("2024-01-06T00:00:00+00:00"), "tweak");
    repo.commit(&["src/a.js", "src/b.js"], "Alice", Some("2024-01-11T00:00:00+00:00"), "more");

    let history = HistoryIndex::new(&repo.root);
    let a = repo.path("src/a.js");

    let commits = history.file_history(&a).await;
    let messages: Vec<_> = commits.iter().map(|c| c.message.as_str()).collect();
    assert_eq!(messages, vec!["more", "tweak", "start"]);

    let owner = history.file_ownership(&a).await;
    assert_eq!(owner.primary, "Alice");
    assert_eq!(owner.total_commits, 3);
    assert_eq!(owner.contributors[0].commits, 2);
    assert_eq!(owner.contributors[1].name, "Bob");

    assert!((history.change_frequency(&a).await - 0.3).abs() < 1e-9);
    // one commit only
    assert_eq!(history.change_frequency(&repo.path("src/b.js")).await, 0.0);

    // relative paths are taken from the root
    assert_eq!(history.file_history(Path::new("src/a.js")).await.len(), 3);
}

#[tokio::test]
async fn test_paths_outside_or_unknown_have_no_history() {
    require_git!();
    let repo = Repo::new();
    repo.commit(&["a.js"], "Alice", None, "one");

    let history = HistoryIndex::new(&repo.root);
    assert!(history.file_history(Path::new("../outside.js")).await.is_empty());
    assert!(history.file_history(&repo.path("missing.js")).await.is_empty());
    assert_eq!(
        history.file_ownership(&repo.path("missing.js")).await,
        FileOwnership::default()
    );
    assert!(history
        .files_changed_together(&repo.path("missing.js"), 0.0)
        .await
        .is_empty());
}

#[tokio::test]
async fn test_concurrent_first_access_shares_one_index() {
    require_git!();
    let repo = Repo::new();
    for i in 0..3 {
        repo.commit(&["a.js", &format!("f{i}.js")], "Alice", None, &format!("c{i}"));
    }

    let history = HistoryIndex::new(&repo.root);
    let paths: Vec<PathBuf> = (0..3).map(|i| PathBuf::from(format!("f{i}.js"))).collect();
    let (first, second, histories) = tokio::join!(
        history.index(),
        history.index(),
        futures::future::join_all(paths.iter().map(|p| history.file_history(p)))
    );

    let (first, second) = (first.unwrap(), second.unwrap());
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first, &history.index().await.unwrap()));
    assert_eq!(first.commits().len(), 3);
    assert!(histories.iter().all(|h| h.len() == 1));
}

#[tokio::test]
async fn test_tracked_and_recent_files() {
    require_git!();
    let repo = Repo::new();
    repo.commit(&["old.js"], "Alice", Some("2015-06-01T00:00:00+00:00"), "old");
    repo.commit(&["new.js"], "Bob", None, "new");

    let history = HistoryIndex::new(&repo.root);

    let mut tracked = history.all_tracked_files().await;
    tracked.sort();
    assert_eq!(tracked, vec!["new.js", "old.js"]);

    let recent = history.recently_modified_files(90).await;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].file, "new.js");
    assert_eq!(recent[0].commits[0].author, "Bob");
}

#[tokio::test]
async fn test_subdirectory_root_maps_to_repository_paths() {
    require_git!();
    let repo = Repo::new();
    repo.commit(&["app/src/a.js", "other.js"], "Alice", None, "one");

    let history = HistoryIndex::new(repo.path("app"));
    assert_eq!(history.check_repository().await.unwrap(), repo.root.as_path());
    assert_eq!(history.file_history(Path::new("src/a.js")).await.len(), 1);
    // siblings of the analyzed root are still inside the repository
    assert_eq!(history.file_history(&repo.path("other.js")).await.len(), 1);
}

#[tokio::test]
async fn test_non_ascii_paths_keep_their_names() {
    require_git!();
    let repo = Repo::new();
    repo.commit(&["src/café.js", "src/plain.js"], "Alice", None, "one");
    repo.commit(&["src/café.js"], "Alice", None, "two");

    let history = HistoryIndex::new(&repo.root);
    let cafe = repo.path("src/café.js");

    assert_eq!(history.file_history(&cafe).await.len(), 2);
    assert_eq!(history.file_ownership(&cafe).await.primary, "Alice");

    let related = history
        .files_changed_together(&repo.path("src/plain.js"), 0.3)
        .await;
    assert_eq!(related.len(), 1);
    assert_eq!(related[0].file, "src/café.js");

    let mut tracked = history.all_tracked_files().await;
    tracked.sort();
    assert_eq!(tracked, vec!["src/café.js", "src/plain.js"]);
}

#[tokio::test]
async fn test_oversized_recent_window_keeps_everything() {
    require_git!();
    let repo = Repo::new();
    repo.commit(&["old.js"], "Alice", Some("1990-01-01T00:00:00+00:00"), "old");

    let history = HistoryIndex::new(&repo.root);
    let recent = history.recently_modified_files(100_000_000).await;
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].file, "old.js");
}
