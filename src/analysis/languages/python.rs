//! Pattern-based Python extraction.

use lazy_static::lazy_static;
use regex::Regex;

use crate::analysis::Symbols;

lazy_static! {
    // import a.b, c as d
    static ref IMPORT_RE: Regex = Regex::new(r"^\s*import\s+(.+)$").unwrap();
    // from .pkg.mod import x, y
    static ref FROM_IMPORT_RE: Regex =
        Regex::new(r"^\s*from\s+(\.*[A-Za-z_][\w.]*|\.+)\s+import\b(.*)$").unwrap();
    static ref NAME_RE: Regex = Regex::new(r"^[A-Za-z_]\w*$").unwrap();
    static ref DEF_RE: Regex = Regex::new(r"^(\s*)(?:async\s+)?def\s+([A-Za-z_]\w*)\s*\(").unwrap();
    static ref CLASS_RE: Regex = Regex::new(r"^(\s*)class\s+([A-Za-z_]\w*)").unwrap();
    static ref ALL_RE: Regex =
        Regex::new(r"(?s)__all__\s*=\s*[\[(](.*?)[\])]").unwrap();
    static ref QUOTED_RE: Regex = Regex::new(r#"['"]([A-Za-z_]\w*)['"]"#).unwrap();
}

/// Extract symbols from Python source.
///
/// Exports are the names listed in `__all__` when present, otherwise every
/// public top-level function and class.
pub fn extract(source: &str) -> Symbols {
    let mut symbols = Symbols::default();
    let mut public_top_level = Vec::new();
    // relative module of an open `from . import (` list
    let mut open_list: Option<String> = None;

    for line in code_lines(source) {
        if let Some(module) = open_list.take() {
            let (names, closed) = match line.split_once(')') {
                Some((names, _)) => (names, true),
                None => (line, false),
            };
            add_submodules(&mut symbols, &module, names);
            if !closed {
                open_list = Some(module);
            }
            continue;
        }

        if let Some(caps) = FROM_IMPORT_RE.captures(line) {
            let module = &caps[1];
            symbols.imports.insert(module.to_string());

            // `from . import views` may name sibling modules
            if module.starts_with('.') {
                let names = caps[2].trim();
                match names.strip_prefix('(') {
                    Some(rest) => match rest.split_once(')') {
                        Some((inner, _)) => add_submodules(&mut symbols, module, inner),
                        None => {
                            add_submodules(&mut symbols, module, rest);
                            open_list = Some(module.to_string());
                        }
                    },
                    None => add_submodules(&mut symbols, module, names),
                }
            }
        } else if let Some(caps) = IMPORT_RE.captures(line) {
            for item in caps[1].split(',') {
                let module = item.split_whitespace().next().unwrap_or("");
                if !module.is_empty() {
                    symbols.imports.insert(module.to_string());
                }
            }
        }

        if let Some(caps) = DEF_RE.captures(line) {
            let name = caps[2].to_string();
            if caps[1].is_empty() && !name.starts_with('_') {
                public_top_level.push(name.clone());
            }
            symbols.functions.insert(name);
        }
        if let Some(caps) = CLASS_RE.captures(line) {
            let name = caps[2].to_string();
            if caps[1].is_empty() && !name.starts_with('_') {
                public_top_level.push(name.clone());
            }
            symbols.classes.insert(name);
        }
    }

    match ALL_RE.captures(source) {
        Some(caps) => {
            for name in QUOTED_RE.captures_iter(&caps[1]) {
                symbols.exports.insert(name[1].to_string());
            }
        }
        None => symbols.exports.extend(public_top_level),
    }

    symbols
}

/// Record `<module>.<name>` for each imported name; unresolvable ones
/// simply produce no edge later.
fn add_submodules(symbols: &mut Symbols, module: &str, names: &str) {
    let sep = if module.chars().all(|c| c == '.') { "" } else { "." };
    for item in names.split(',') {
        let name = item.split_whitespace().next().unwrap_or("");
        if NAME_RE.is_match(name) {
            symbols.imports.insert(format!("{module}{sep}{name}"));
        }
    }
}

/// Lines outside triple-quoted strings, with comment-only lines dropped.
fn code_lines(source: &str) -> impl Iterator<Item = &str> {
    let mut in_docstring: Option<&'static str> = None;

    source.lines().filter(move |line| {
        let trimmed = line.trim();

        if let Some(delim) = in_docstring {
            if trimmed.contains(delim) {
                in_docstring = None;
            }
            return false;
        }

        for delim in [r#"""""#, "'''"] {
            if let Some(rest) = trimmed.strip_prefix(delim) {
                if !rest.contains(delim) {
                    in_docstring = Some(delim);
                }
                return false;
            }
        }

        !trimmed.is_empty() && !trimmed.starts_with('#')
    })
}
