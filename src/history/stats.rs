//! Ownership and change-frequency projections over a file's history.

use std::collections::HashMap;

use serde::Serialize;

use super::parse::Commit;

/// Primary owner reported when history is unavailable.
pub const UNKNOWN_OWNER: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributorCount {
    pub name: String,
    pub commits: usize,
}

/// Who changed a file and how often.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOwnership {
    pub primary: String,
    /// Sorted by descending commit count.
    pub contributors: Vec<ContributorCount>,
    pub total_commits: usize,
}

impl Default for FileOwnership {
    fn default() -> Self {
        Self {
            primary: UNKNOWN_OWNER.to_string(),
            contributors: Vec::new(),
            total_commits: 0,
        }
    }
}

impl FileOwnership {
    pub fn is_known(&self) -> bool {
        self.primary != UNKNOWN_OWNER || self.total_commits > 0
    }
}

/// Aggregate authors over `history`.
///
/// Ties on commit count keep the order in which authors were first seen.
pub fn ownership(history: &[Commit]) -> FileOwnership {
    if history.is_empty() {
        return FileOwnership::default();
    }

    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut contributors: Vec<ContributorCount> = Vec::new();
    for commit in history {
        let slot = *slots.entry(commit.author.as_str()).or_insert_with(|| {
            contributors.push(ContributorCount {
                name: commit.author.clone(),
                commits: 0,
            });
            contributors.len() - 1
        });
        contributors[slot].commits += 1;
    }

    // stable: equal counts keep first-seen order
    contributors.sort_by(|a, b| b.commits.cmp(&a.commits));

    FileOwnership {
        primary: contributors[0].name.clone(),
        contributors,
        total_commits: history.len(),
    }
}

/// Commits per day between the oldest and newest commit.
///
/// 0 with fewer than two commits, unparseable dates, or a span under a day.
pub fn change_frequency(history: &[Commit]) -> f64 {
    if history.len() < 2 {
        return 0.0;
    }

    let timestamps: Option<Vec<_>> = history.iter().map(Commit::timestamp).collect();
    let Some(timestamps) = timestamps else {
        return 0.0;
    };
    let (Some(oldest), Some(newest)) = (timestamps.iter().min(), timestamps.iter().max()) else {
        return 0.0;
    };

    let days = (*newest - *oldest).num_days();
    if days <= 0 {
        return 0.0;
    }
    history.len() as f64 / days as f64
}
