//! Pattern-based JavaScript/TypeScript extraction.
//!
//! Used only when the syntax tree cannot be built. Line comments and block
//! comments are blanked out first; string contents are not, so a specifier
//! that appears inside a string literal can still be picked up here.

use lazy_static::lazy_static;
use regex::Regex;

use crate::analysis::Symbols;

lazy_static! {
    static ref BLOCK_COMMENT_RE: Regex = Regex::new(r"(?s)/\*.*?\*/").unwrap();
    static ref LINE_COMMENT_RE: Regex = Regex::new(r"(?m)(^|[^:\\])//.*$").unwrap();

    // import x from 'a' | import { x } from 'a' | import 'a' | export ... from 'a'
    static ref STATIC_IMPORT_RE: Regex = Regex::new(
        r#"(?m)^\s*(import|export)\s+(type\s+)?(?:[\w*{}\s,$]+?\s+from\s+)?['"]([^'"]+)['"]"#
    ).unwrap();
    // require('a') | import('a')
    static ref CALL_IMPORT_RE: Regex = Regex::new(
        r#"\b(?:require|import)\s*\(\s*['"`]([^'"`$]+)['"`]\s*\)"#
    ).unwrap();

    static ref EXPORT_DEFAULT_RE: Regex = Regex::new(r"(?m)^\s*export\s+default\b").unwrap();
    static ref EXPORT_STAR_RE: Regex = Regex::new(r"(?m)^\s*export\s+\*\s+from\b").unwrap();
    static ref EXPORT_STAR_AS_RE: Regex =
        Regex::new(r"(?m)^\s*export\s+\*\s+as\s+([\w$]+)").unwrap();
    static ref EXPORT_DECL_RE: Regex = Regex::new(
        r"(?m)^\s*export\s+(?:declare\s+)?(?:async\s+)?(?:abstract\s+)?(?:function\*?|class|const|let|var|interface|type|enum|namespace)\s+([\w$]+)"
    ).unwrap();
    static ref EXPORT_CLAUSE_RE: Regex =
        Regex::new(r"(?m)^\s*export\s+(?:type\s+)?\{([^}]*)\}").unwrap();
    static ref MODULE_EXPORTS_RE: Regex =
        Regex::new(r"\bmodule\.exports\s*=\s*([^;\n]*)").unwrap();
    static ref NAMED_EXPORTS_RE: Regex =
        Regex::new(r"\b(?:module\.)?exports\.([\w$]+)\s*=").unwrap();

    static ref FUNCTION_RE: Regex =
        Regex::new(r"\bfunction\*?\s+([\w$]+)\s*\(").unwrap();
    static ref ARROW_FUNCTION_RE: Regex = Regex::new(
        r"\b(?:const|let|var)\s+([\w$]+)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:function\b|\([^)]*\)\s*(?::[^=]+)?=>|[\w$]+\s*=>)"
    ).unwrap();
    static ref CLASS_RE: Regex = Regex::new(r"\bclass\s+([\w$]+)").unwrap();
    static ref INTERFACE_RE: Regex = Regex::new(r"(?m)^\s*(?:export\s+)?(?:declare\s+)?interface\s+([\w$]+)").unwrap();
    static ref IDENT_RE: Regex = Regex::new(r"^[A-Za-z_$][\w$]*$").unwrap();
}

/// Extract symbols with regular expressions.
pub fn extract(source: &str) -> Symbols {
    let without_blocks = BLOCK_COMMENT_RE.replace_all(source, "");
    let code = LINE_COMMENT_RE.replace_all(&without_blocks, "$1");

    let mut symbols = Symbols::default();

    for caps in STATIC_IMPORT_RE.captures_iter(&code) {
        let type_only = caps.get(2).is_some();
        if !type_only {
            symbols.imports.insert(caps[3].to_string());
        }
    }
    for caps in CALL_IMPORT_RE.captures_iter(&code) {
        symbols.imports.insert(caps[1].to_string());
    }

    collect_exports(&code, &mut symbols);

    for caps in FUNCTION_RE.captures_iter(&code) {
        symbols.functions.insert(caps[1].to_string());
    }
    for caps in ARROW_FUNCTION_RE.captures_iter(&code) {
        symbols.functions.insert(caps[1].to_string());
    }
    for caps in CLASS_RE.captures_iter(&code) {
        symbols.classes.insert(caps[1].to_string());
    }
    for caps in INTERFACE_RE.captures_iter(&code) {
        symbols.interfaces.insert(caps[1].to_string());
    }

    symbols
}

fn collect_exports(code: &str, symbols: &mut Symbols) {
    if EXPORT_DEFAULT_RE.is_match(code) {
        symbols.exports.insert("default".to_string());
    }
    if EXPORT_STAR_RE.is_match(code) {
        symbols.exports.insert("*".to_string());
    }
    for caps in EXPORT_STAR_AS_RE.captures_iter(code) {
        symbols.exports.insert(caps[1].to_string());
    }
    for caps in EXPORT_DECL_RE.captures_iter(code) {
        symbols.exports.insert(caps[1].to_string());
    }
    for caps in EXPORT_CLAUSE_RE.captures_iter(code) {
        for item in caps[1].split(',') {
            // `a as b` exports `b`
            let name = item.split_whitespace().last().unwrap_or("");
            if IDENT_RE.is_match(name) {
                symbols.exports.insert(name.to_string());
            }
        }
    }
    for caps in MODULE_EXPORTS_RE.captures_iter(code) {
        insert_assigned(caps[1].trim(), symbols);
    }
    for caps in NAMED_EXPORTS_RE.captures_iter(code) {
        symbols.exports.insert(caps[1].to_string());
    }
}

/// Approximate export-name inference for `module.exports = <value>`.
fn insert_assigned(value: &str, symbols: &mut Symbols) {
    let value = value.trim_end_matches(';').trim();

    if let Some(body) = value.strip_prefix('{') {
        let body = body.trim_end_matches('}');
        for member in body.split(',') {
            let key = member
                .split(':')
                .next()
                .unwrap_or("")
                .trim()
                .trim_matches(|c| c == '"' || c == '\'');
            let key = key.split('(').next().unwrap_or("").trim();
            if IDENT_RE.is_match(key) {
                symbols.exports.insert(key.to_string());
            }
        }
        return;
    }

    let name = value
        .strip_prefix("class ")
        .or_else(|| value.strip_prefix("function "))
        .map(|rest| {
            rest.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
                .next()
                .unwrap_or("")
        })
        .or_else(|| IDENT_RE.is_match(value).then_some(value))
        .filter(|n| !n.is_empty())
        .unwrap_or("default");
    symbols.exports.insert(name.to_string());
}
