//! History subsystem errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from querying git history.
///
/// `Clone` so one failed shared index build can be handed to every waiter.
#[derive(Debug, Clone, Error)]
pub enum HistoryError {
    #[error("not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("failed to run git: {0}")]
    Io(String),
}

impl From<std::io::Error> for HistoryError {
    fn from(err: std::io::Error) -> Self {
        HistoryError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HistoryError>;
