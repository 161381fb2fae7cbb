//! Cross-file dependency graph.
//!
//! Import specifiers from every analyzed file are resolved to files on disk
//! and kept as edges when the target was analyzed too. Unresolved imports
//! and targets outside the analyzed set (external packages, ignored files)
//! produce no edge.

mod aliases;
mod resolver;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::analysis::FileAnalysis;

pub use aliases::{strip_jsonc, AliasConfig, AliasTarget, PathAliasRule, DEFAULT_ALIAS_FILES};
pub use resolver::{expand_candidates, ImportResolver, RESOLVABLE_EXTENSIONS};

/// Outgoing and incoming edges of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub calls: BTreeSet<PathBuf>,
    #[serde(rename = "calledBy")]
    pub called_by: BTreeSet<PathBuf>,
}

/// File-to-file dependency graph over the analyzed files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CallGraph {
    nodes: BTreeMap<PathBuf, GraphNode>,
}

impl CallGraph {
    /// Build the graph. Every analyzed file gets a node, edges or not.
    pub fn build(files: &[FileAnalysis], resolver: &ImportResolver) -> Self {
        let analyzed: HashSet<&Path> = files.iter().map(|f| f.path.as_path()).collect();

        let resolved: Vec<(&Path, Vec<PathBuf>)> = files
            .par_iter()
            .map(|file| {
                let targets = file
                    .imports
                    .iter()
                    .filter_map(|spec| resolver.resolve(&file.path, spec))
                    .filter(|target| analyzed.contains(target.as_path()))
                    .collect();
                (file.path.as_path(), targets)
            })
            .collect();

        let mut graph = Self {
            nodes: files
                .iter()
                .map(|f| (f.path.clone(), GraphNode::default()))
                .collect(),
        };
        for (source, targets) in resolved {
            for target in targets {
                graph.insert_edge(source, &target);
            }
        }

        debug!(nodes = graph.len(), edges = graph.edge_count(), "call graph built");
        graph
    }

    /// Record `source` importing `target` on both nodes.
    pub fn insert_edge(&mut self, source: &Path, target: &Path) {
        self.nodes
            .entry(source.to_path_buf())
            .or_default()
            .calls
            .insert(target.to_path_buf());
        self.nodes
            .entry(target.to_path_buf())
            .or_default()
            .called_by
            .insert(source.to_path_buf());
    }

    pub fn node(&self, path: &Path) -> Option<&GraphNode> {
        self.nodes.get(path)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&PathBuf, &GraphNode)> {
        self.nodes.iter()
    }

    /// Number of files that import `path`.
    pub fn in_degree(&self, path: &Path) -> usize {
        self.node(path).map_or(0, |n| n.called_by.len())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.values().map(|n| n.calls.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_file;
    use std::fs;
    use tempfile::TempDir;

    fn analyzed(root: &Path, files: &[(&str, &str)]) -> Vec<FileAnalysis> {
        files
            .iter()
            .map(|(name, content)| {
                let path = root.join(name);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(&path, content).unwrap();
                path
            })
            .collect::<Vec<_>>()
            .iter()
            .filter_map(|p| analyze_file(p))
            .collect()
    }

    #[test]
    fn test_require_creates_symmetric_edge() {
        let temp = TempDir::new().unwrap();
        let root = fs::canonicalize(temp.path()).unwrap();
        let files = analyzed(
            &root,
            &[("a.js", "const x = require('./b')"), ("b.js", "module.exports = {}")],
        );

        let graph = CallGraph::build(&files, &ImportResolver::default());
        let a = root.join("a.js");
        let b = root.join("b.js");

        assert_eq!(graph.node(&a).unwrap().calls, BTreeSet::from([b.clone()]));
        assert_eq!(graph.node(&b).unwrap().called_by, BTreeSet::from([a.clone()]));
        assert!(graph.node(&a).unwrap().called_by.is_empty());
        assert_eq!(graph.in_degree(&b), 1);
    }

    #[test]
    fn test_unanalyzed_targets_produce_no_edges() {
        let temp = TempDir::new().unwrap();
        let root = fs::canonicalize(temp.path()).unwrap();
        let files = analyzed(
            &root,
            &[(
                "src/app.ts",
                "import React from 'react';\nimport data from './data.json';\nimport { x } from './gone';\n",
            )],
        );
        fs::write(root.join("src/data.json"), "{}").unwrap();

        let graph = CallGraph::build(&files, &ImportResolver::default());
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_graph_symmetry() {
        let temp = TempDir::new().unwrap();
        let root = fs::canonicalize(temp.path()).unwrap();
        let files = analyzed(
            &root,
            &[
                ("src/index.ts", "import { a } from './a';\nimport b from './b';\n"),
                ("src/a.ts", "import b from './b';\nexport const a = b;\n"),
                ("src/b.ts", "export default function b() {}\n"),
                ("src/c.py", "from . import b\n"),
                ("go/main.go", "package main\nimport \"fmt\"\n"),
            ],
        );

        let graph = CallGraph::build(&files, &ImportResolver::default());
        assert_eq!(graph.len(), files.len());
        for (path, node) in graph.nodes() {
            for callee in &node.calls {
                assert!(graph.node(callee).unwrap().called_by.contains(path));
            }
            for caller in &node.called_by {
                assert!(graph.node(caller).unwrap().calls.contains(path));
            }
        }
        assert_eq!(graph.in_degree(&root.join("src/b.ts")), 2);
    }
}
