//! Grouping files into features by directory.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::risk::risk_score;
use crate::analyzer::EnrichedFile;
use crate::graph::CallGraph;
use crate::history::UNKNOWN_OWNER;
use crate::paths::relative_slash_path;

/// Source roots whose children name features.
const SOURCE_ROOTS: &[&str] = &["src", "lib", "app"];

/// Feature for root-level files with no grouped neighbours.
pub const ROOT_FEATURE: &str = "root";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub name: String,
    pub files: Vec<PathBuf>,
    pub total_lines: usize,
    /// Known authors across the feature's files, sorted.
    pub contributors: Vec<String>,
    pub average_risk: f64,
}

/// Feature directory for a root-relative path, `None` for root-level files.
///
/// `src/auth/login.ts` -> `auth`, `packages/ui/src/button.tsx` -> `ui`,
/// `scripts/build.js` -> `scripts`, `src/index.ts` -> `None`.
pub fn feature_key(relative: &str) -> Option<String> {
    let mut dirs: Vec<&str> = relative.split('/').filter(|s| !s.is_empty()).collect();
    dirs.pop();

    match dirs.as_slice() {
        [] => None,
        ["packages", name, ..] => Some(name.to_string()),
        [root] if SOURCE_ROOTS.contains(root) => None,
        [root, feature, ..] if SOURCE_ROOTS.contains(root) => Some(feature.to_string()),
        [first, ..] => Some(first.to_string()),
    }
}

/// Group files into features, sorted by name.
///
/// Root-level files join the feature most of their graph neighbours belong
/// to, or [`ROOT_FEATURE`] when none is grouped.
pub fn identify_features(files: &[EnrichedFile], graph: &CallGraph, root: &Path) -> Vec<Feature> {
    let keys: HashMap<&Path, Option<String>> = files
        .iter()
        .map(|f| {
            let key = relative_slash_path(root, &f.analysis.path).and_then(|r| feature_key(&r));
            (f.analysis.path.as_path(), key)
        })
        .collect();

    let mut grouped: BTreeMap<String, Vec<&EnrichedFile>> = BTreeMap::new();
    for file in files {
        let name = match keys.get(file.analysis.path.as_path()).cloned().flatten() {
            Some(name) => name,
            None => neighbour_feature(&file.analysis.path, graph, &keys)
                .unwrap_or_else(|| ROOT_FEATURE.to_string()),
        };
        grouped.entry(name).or_default().push(file);
    }

    grouped
        .into_iter()
        .map(|(name, members)| {
            let contributors: BTreeSet<&str> = members
                .iter()
                .flat_map(|f| f.ownership.contributors.iter().map(|c| c.name.as_str()))
                .filter(|n| *n != UNKNOWN_OWNER)
                .collect();
            let total_risk: i32 = members.iter().map(|f| risk_score(f).score).sum();

            Feature {
                name,
                files: members.iter().map(|f| f.analysis.path.clone()).collect(),
                total_lines: members.iter().map(|f| f.analysis.lines).sum(),
                contributors: contributors.into_iter().map(str::to_string).collect(),
                average_risk: total_risk as f64 / members.len() as f64,
            }
        })
        .collect()
}

fn neighbour_feature(
    path: &Path,
    graph: &CallGraph,
    keys: &HashMap<&Path, Option<String>>,
) -> Option<String> {
    let node = graph.node(path)?;
    let mut votes: BTreeMap<&str, usize> = BTreeMap::new();
    for neighbour in node.calls.iter().chain(&node.called_by) {
        if let Some(Some(key)) = keys.get(neighbour.as_path()) {
            *votes.entry(key.as_str()).or_default() += 1;
        }
    }

    // most votes, then alphabetical
    votes
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (key, n)| match best {
            Some((_, m)) if m >= n => best,
            _ => Some((key, n)),
        })
        .map(|(key, _)| key.to_string())
}
