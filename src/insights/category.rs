//! File categorization by path conventions.

use serde::Serialize;

use crate::detect::{is_test_file, DEFAULT_ENTRY_POINTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Test,
    Config,
    Entry,
    Component,
    Route,
    Model,
    Service,
    Util,
    Types,
    Other,
}

impl FileCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Test => "test",
            FileCategory::Config => "config",
            FileCategory::Entry => "entry",
            FileCategory::Component => "component",
            FileCategory::Route => "route",
            FileCategory::Model => "model",
            FileCategory::Service => "service",
            FileCategory::Util => "util",
            FileCategory::Types => "types",
            FileCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for FileCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directory names and basename fragments for each convention-based category.
const RULES: &[(FileCategory, &[&str], &[&str])] = &[
    (
        FileCategory::Config,
        &["config", "configs", "settings"],
        &["config", "settings"],
    ),
    (
        FileCategory::Component,
        &["components", "component", "widgets", "views"],
        &["component", "widget", "view"],
    ),
    (
        FileCategory::Route,
        &["routes", "router", "pages", "api", "controllers", "handlers", "endpoints"],
        &["route", "router", "controller", "handler", "endpoint"],
    ),
    (
        FileCategory::Model,
        &["models", "model", "entities", "schemas", "domain"],
        &["model", "entity", "schema"],
    ),
    (
        FileCategory::Service,
        &["services", "service", "providers", "repositories", "clients"],
        &["service", "provider", "repository", "client", "store"],
    ),
    (
        FileCategory::Util,
        &["utils", "util", "helpers", "helper", "lib", "common", "shared"],
        &["util", "helper"],
    ),
    (
        FileCategory::Types,
        &["types", "typings", "interfaces"],
        &["types", "typings", "interfaces"],
    ),
];

/// Assign a category to a root-relative, forward-slash path.
///
/// Checks run in a fixed order and the first match wins: tests, then
/// config, entry points, and the directory/name conventions.
pub fn categorize(relative: &str) -> FileCategory {
    let lowered = relative.to_lowercase();
    let mut segments: Vec<&str> = lowered.split('/').filter(|s| !s.is_empty()).collect();
    let Some(file_name) = segments.pop() else {
        return FileCategory::Other;
    };
    let stem = file_name.split('.').next().unwrap_or(file_name);

    if is_test_file(relative) || stem.ends_with("_test") || stem.starts_with("test_") {
        return FileCategory::Test;
    }
    // webpack.config.js, .eslintrc.js
    if file_name.contains(".config.") || file_name.starts_with('.') {
        return FileCategory::Config;
    }
    if DEFAULT_ENTRY_POINTS.contains(&stem) && segments.len() <= 1 {
        return FileCategory::Entry;
    }
    if file_name.ends_with(".d.ts") {
        return FileCategory::Types;
    }

    for (category, dirs, fragments) in RULES {
        if segments.iter().any(|s| dirs.contains(s))
            || fragments.iter().any(|f| stem == *f || stem.ends_with(f))
        {
            return *category;
        }
    }

    if file_name.ends_with(".tsx") || file_name.ends_with(".jsx") {
        return FileCategory::Component;
    }
    FileCategory::Other
}
