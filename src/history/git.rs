//! Async git command execution.

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::debug;

use super::error::{HistoryError, Result};

/// Runs git subcommands inside one working directory.
#[derive(Debug, Clone)]
pub struct GitExecutor {
    repo_path: PathBuf,
}

impl GitExecutor {
    pub fn new(repo_path: impl AsRef<Path>) -> Self {
        Self {
            repo_path: repo_path.as_ref().to_path_buf(),
        }
    }

    /// Run `git <args>` and return its stdout.
    ///
    /// Paths are printed verbatim (`core.quotepath=off`); only names with
    /// control characters, quotes or backslashes still come back C-quoted.
    pub async fn run(&self, args: &[&str]) -> Result<String> {
        debug!(args = ?args, cwd = %self.repo_path.display(), "running git");

        let output = Command::new("git")
            .args(["-c", "core.quotepath=off"])
            .args(args)
            .current_dir(&self.repo_path)
            .kill_on_drop(true)
            .output()
            .await?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(HistoryError::CommandFailed {
                command: args.first().copied().unwrap_or_default().to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }
}
