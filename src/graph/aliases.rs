//! Path-alias configuration from `tsconfig.json` / `jsconfig.json`.
//!
//! Reads `compilerOptions.baseUrl` and `compilerOptions.paths`, following the
//! `extends` chain. The chain is linearized depth-first (with a visited set
//! against cycles) and applied root-to-leaf, so the leaf overrides its
//! ancestors. Missing or malformed configuration yields no aliases.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::paths::normalize;

/// Config files probed at the repository root, in order.
pub const DEFAULT_ALIAS_FILES: &[&str] = &["tsconfig.json", "jsconfig.json"];

/// One resolved substitution target of an alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasTarget {
    /// Absolute path template; `*` marks where the captured suffix goes.
    pub template: String,
    pub wildcard: bool,
}

impl AliasTarget {
    /// Template text before the wildcard.
    pub fn prefix(&self) -> &str {
        self.template.split('*').next().unwrap_or("")
    }
}

/// A path-mapping rule such as `@/*` -> `<root>/src/*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathAliasRule {
    pub pattern: String,
    /// Pattern text before the wildcard.
    pub prefix: String,
    /// Pattern text after the wildcard.
    pub suffix: String,
    pub wildcard: bool,
    pub targets: Vec<AliasTarget>,
}

impl PathAliasRule {
    /// Build a rule, resolving target templates against `base`.
    pub fn new(pattern: &str, targets: &[String], base: &Path) -> Self {
        let (prefix, suffix, wildcard) = match pattern.split_once('*') {
            Some((p, s)) => (p.to_string(), s.to_string(), true),
            None => (pattern.to_string(), String::new(), false),
        };

        let targets = targets
            .iter()
            .map(|t| AliasTarget {
                template: normalize(&base.join(t)).to_string_lossy().into_owned(),
                wildcard: t.contains('*'),
            })
            .collect();

        Self {
            pattern: pattern.to_string(),
            prefix,
            suffix,
            wildcard,
            targets,
        }
    }

    /// The part of `spec` matched by the wildcard (empty for exact rules).
    pub fn capture<'s>(&self, spec: &'s str) -> Option<&'s str> {
        if !self.wildcard {
            return (spec == self.pattern).then_some("");
        }
        if spec.len() < self.prefix.len() + self.suffix.len() {
            return None;
        }
        spec.strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())
    }

    /// Substitute `spec` into every target.
    pub fn substitute(&self, spec: &str) -> Option<Vec<PathBuf>> {
        let captured = self.capture(spec)?;
        Some(
            self.targets
                .iter()
                .map(|t| {
                    let path = if t.wildcard {
                        t.template.replacen('*', captured, 1)
                    } else {
                        t.template.clone()
                    };
                    normalize(Path::new(&path))
                })
                .collect(),
        )
    }
}

/// Effective alias configuration for a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasConfig {
    /// Resolution root for non-relative, alias-free specifiers.
    pub base_url: Option<PathBuf>,
    /// Rules, most specific first.
    pub rules: Vec<PathAliasRule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawConfig {
    #[serde(default)]
    extends: Option<Extends>,
    #[serde(default)]
    compiler_options: Option<RawCompilerOptions>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Extends {
    One(String),
    Many(Vec<String>),
}

impl Extends {
    fn specs(&self) -> Vec<&str> {
        match self {
            Extends::One(s) => vec![s.as_str()],
            Extends::Many(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCompilerOptions {
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    paths: Option<BTreeMap<String, Vec<String>>>,
}

impl AliasConfig {
    /// Load the alias configuration for `root`.
    ///
    /// Uses `explicit` when given, otherwise the first of
    /// [`DEFAULT_ALIAS_FILES`] that exists.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Self {
        let file = match explicit {
            Some(path) if path.is_absolute() => Some(path.to_path_buf()),
            Some(path) => Some(root.join(path)),
            None => DEFAULT_ALIAS_FILES
                .iter()
                .map(|name| root.join(name))
                .find(|p| p.is_file()),
        };

        match file {
            Some(file) => Self::from_file(&file),
            None => Self::default(),
        }
    }

    /// Load from one config file and its `extends` chain.
    pub fn from_file(path: &Path) -> Self {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        linearize(path, &mut visited, &mut chain);
        Self::merge(chain)
    }

    /// Apply a root-to-leaf chain; later entries override earlier ones.
    fn merge(chain: Vec<(PathBuf, RawConfig)>) -> Self {
        let mut base_url = None;
        let mut paths: BTreeMap<String, (Vec<String>, PathBuf)> = BTreeMap::new();

        for (file, raw) in chain {
            let dir = file.parent().map(Path::to_path_buf).unwrap_or_default();
            let Some(options) = raw.compiler_options else {
                continue;
            };
            if let Some(url) = options.base_url {
                base_url = Some(normalize(&dir.join(url)));
            }
            for (pattern, targets) in options.paths.unwrap_or_default() {
                paths.insert(pattern, (targets, dir.clone()));
            }
        }

        let mut rules: Vec<PathAliasRule> = paths
            .into_iter()
            .filter(|(_, (targets, _))| !targets.is_empty())
            .map(|(pattern, (targets, dir))| {
                let base = base_url.clone().unwrap_or(dir);
                PathAliasRule::new(&pattern, &targets, &base)
            })
            .collect();

        // Exact patterns first, then longest prefix.
        rules.sort_by(|a, b| {
            a.wildcard
                .cmp(&b.wildcard)
                .then(b.prefix.len().cmp(&a.prefix.len()))
                .then(a.pattern.cmp(&b.pattern))
        });

        Self { base_url, rules }
    }

    /// Whether any alias or base root is configured.
    pub fn is_empty(&self) -> bool {
        self.base_url.is_none() && self.rules.is_empty()
    }
}

/// Depth-first expansion of `extends`, parents before children.
fn linearize(path: &Path, visited: &mut HashSet<PathBuf>, chain: &mut Vec<(PathBuf, RawConfig)>) {
    let Ok(canonical) = fs::canonicalize(path) else {
        debug!(path = %path.display(), "alias config not found");
        return;
    };
    if !visited.insert(canonical.clone()) {
        debug!(path = %canonical.display(), "alias config extends cycle");
        return;
    }

    let raw = match read_config(&canonical) {
        Ok(raw) => raw,
        Err(e) => {
            debug!(path = %canonical.display(), error = %e, "ignoring malformed alias config");
            return;
        }
    };

    let dir = canonical.parent().map(Path::to_path_buf).unwrap_or_default();
    if let Some(extends) = &raw.extends {
        for spec in extends.specs() {
            match resolve_extends(&dir, spec) {
                Some(parent) => linearize(&parent, visited, chain),
                None => debug!(spec, "unresolved alias config extends"),
            }
        }
    }

    chain.push((canonical, raw));
}

fn read_config(path: &Path) -> anyhow::Result<RawConfig> {
    let content = fs::read_to_string(path)?;
    let raw = serde_json::from_str(&strip_jsonc(&content))?;
    Ok(raw)
}

/// Locate the file an `extends` entry refers to.
fn resolve_extends(dir: &Path, spec: &str) -> Option<PathBuf> {
    if spec.starts_with('.') || Path::new(spec).is_absolute() {
        return probe_config(&dir.join(spec));
    }

    // Bare specifier: a package in some ancestor's node_modules
    dir.ancestors()
        .map(|a| a.join("node_modules").join(spec))
        .find_map(|candidate| probe_config(&candidate))
}

fn probe_config(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    let mut with_json = path.as_os_str().to_os_string();
    with_json.push(".json");
    let with_json = PathBuf::from(with_json);
    if with_json.is_file() {
        return Some(with_json);
    }
    let nested = path.join("tsconfig.json");
    nested.is_file().then_some(nested)
}

/// Strip `//` and `/* */` comments and trailing commas from JSON text.
pub fn strip_jsonc(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    let mut in_string = false;

    while i < chars.len() {
        let c = chars[i];

        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(&next) = chars.get(i + 1) {
                    out.push(next);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match (c, chars.get(i + 1)) {
            ('"', _) => {
                in_string = true;
                out.push(c);
                i += 1;
            }
            ('/', Some('/')) => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
            }
            ('/', Some('*')) => {
                i += 2;
                while i < chars.len() && !(chars[i] == '*' && chars.get(i + 1) == Some(&'/')) {
                    i += 1;
                }
                i += 2;
            }
            (',', _) => {
                let next = chars[i + 1..]
                    .iter()
                    .position(|ch| !ch.is_whitespace())
                    .map(|offset| chars[i + 1 + offset]);
                // A comment between the comma and the bracket is not looked through.
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
                i += 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    out
}
