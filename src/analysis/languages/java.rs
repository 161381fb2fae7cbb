//! Pattern-based Java extraction.

use lazy_static::lazy_static;
use regex::Regex;

use crate::analysis::Symbols;

lazy_static! {
    static ref BLOCK_COMMENT_RE: Regex = Regex::new(r"(?s)/\*.*?\*/").unwrap();
    static ref LINE_COMMENT_RE: Regex = Regex::new(r"(?m)//.*$").unwrap();
    static ref IMPORT_RE: Regex =
        Regex::new(r"(?m)^\s*import\s+(?:static\s+)?([\w.]+(?:\.\*)?)\s*;").unwrap();
    static ref TYPE_RE: Regex = Regex::new(
        r"(?m)^\s*((?:(?:public|protected|private|abstract|final|static|sealed|non-sealed|strictfp)\s+)*)(?:class|interface|enum|record|@interface)\s+([A-Za-z_]\w*)"
    ).unwrap();
    static ref METHOD_RE: Regex = Regex::new(
        r"(?m)^\s*(?:(?:public|protected|private|static|final|abstract|synchronized|native|default)\s+)*(?:<[^>]+>\s+)?[\w<>\[\],.?\s]+?\s+([a-z_]\w*)\s*\([^)]*\)\s*(?:throws\s+[\w.,\s]+)?\{"
    ).unwrap();
}

const NOT_METHODS: &[&str] = &["if", "for", "while", "switch", "catch", "return", "new", "else"];

/// Extract symbols from Java source.
///
/// Types (classes, interfaces, enums, records) are reported as classes;
/// public types are the file's exports.
pub fn extract(source: &str) -> Symbols {
    let without_blocks = BLOCK_COMMENT_RE.replace_all(source, "");
    let code = LINE_COMMENT_RE.replace_all(&without_blocks, "");

    let mut symbols = Symbols::default();

    for caps in IMPORT_RE.captures_iter(&code) {
        symbols.imports.insert(caps[1].to_string());
    }

    for caps in TYPE_RE.captures_iter(&code) {
        let name = caps[2].to_string();
        if caps[1].split_whitespace().any(|m| m == "public") {
            symbols.exports.insert(name.clone());
        }
        symbols.classes.insert(name);
    }

    for caps in METHOD_RE.captures_iter(&code) {
        let name = &caps[1];
        if !NOT_METHODS.contains(&name) {
            symbols.functions.insert(name.to_string());
        }
    }

    symbols
}
