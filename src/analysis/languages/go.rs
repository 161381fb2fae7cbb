//! Pattern-based Go extraction.

use lazy_static::lazy_static;
use regex::Regex;

use crate::analysis::Symbols;

lazy_static! {
    static ref BLOCK_COMMENT_RE: Regex = Regex::new(r"(?s)/\*.*?\*/").unwrap();
    static ref LINE_COMMENT_RE: Regex = Regex::new(r"(?m)//.*$").unwrap();
    // Single import: import "pkg" | import alias "pkg"
    static ref SINGLE_IMPORT_RE: Regex =
        Regex::new(r#"(?m)^\s*import\s+(?:[\w.]+\s+)?"([^"]+)""#).unwrap();
    // Import block: import ( "pkg1" "pkg2" )
    static ref IMPORT_BLOCK_RE: Regex = Regex::new(r"(?s)\bimport\s*\((.*?)\)").unwrap();
    // Individual import within block, with optional alias, `_` or `.`
    static ref BLOCK_ITEM_RE: Regex = Regex::new(r#"(?m)^\s*(?:[\w.]+\s+)?"([^"]+)""#).unwrap();
    // func Name( | func (r *Recv) Name( | func Name[T any](
    static ref FUNC_RE: Regex =
        Regex::new(r"(?m)^func\s+(?:\([^)]*\)\s*)?([A-Za-z_]\w*)\s*[\[(]").unwrap();
    // type Name[T any] struct {  (top level only)
    static ref TYPE_DECL_RE: Regex =
        Regex::new(r"(?m)^type\s+([A-Za-z_]\w*)(?:\[[^\]]*\])?\s*(.*)$").unwrap();
    // type ( ... ) groups; the closing paren sits at column 0
    static ref TYPE_BLOCK_RE: Regex = Regex::new(r"(?ms)^type\s*\((.*?)^\)").unwrap();
    static ref TYPE_MEMBER_RE: Regex =
        Regex::new(r"^\s*([A-Za-z_]\w*)(?:\[[^\]]*\])?\s+(.*)$").unwrap();
    static ref TOP_LEVEL_VALUE_RE: Regex =
        Regex::new(r"(?m)^(?:var|const)\s+([A-Za-z_]\w*)").unwrap();
}

/// Extract symbols from Go source.
///
/// Exports are the capitalized top-level functions, types and values.
pub fn extract(source: &str) -> Symbols {
    let without_blocks = BLOCK_COMMENT_RE.replace_all(source, "");
    let code = LINE_COMMENT_RE.replace_all(&without_blocks, "");

    let mut symbols = Symbols::default();

    for caps in SINGLE_IMPORT_RE.captures_iter(&code) {
        symbols.imports.insert(caps[1].to_string());
    }
    for block in IMPORT_BLOCK_RE.captures_iter(&code) {
        for caps in BLOCK_ITEM_RE.captures_iter(&block[1]) {
            symbols.imports.insert(caps[1].to_string());
        }
    }

    for caps in FUNC_RE.captures_iter(&code) {
        let name = caps[1].to_string();
        // Methods are exported through their receiver type, not on their own
        let is_method = caps[0].trim_start_matches("func").trim_start().starts_with('(');
        if is_exported(&name) && !is_method {
            symbols.exports.insert(name.clone());
        }
        symbols.functions.insert(name);
    }

    for caps in TYPE_DECL_RE.captures_iter(&code) {
        declare_type(&mut symbols, &caps[1], &caps[2]);
    }
    for block in TYPE_BLOCK_RE.captures_iter(&code) {
        // only members of the group itself, not fields of their bodies
        let mut depth = 0usize;
        for line in block[1].lines() {
            if depth == 0 {
                if let Some(caps) = TYPE_MEMBER_RE.captures(line) {
                    declare_type(&mut symbols, &caps[1], &caps[2]);
                }
            }
            for c in line.chars() {
                match c {
                    '{' => depth += 1,
                    '}' => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }
        }
    }
    for caps in TOP_LEVEL_VALUE_RE.captures_iter(&code) {
        if is_exported(&caps[1]) {
            symbols.exports.insert(caps[1].to_string());
        }
    }

    symbols
}

fn declare_type(symbols: &mut Symbols, name: &str, definition: &str) {
    if definition.trim_start().starts_with("struct") {
        symbols.structs.insert(name.to_string());
    }
    if is_exported(name) {
        symbols.exports.insert(name.to_string());
    }
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouped_and_single_imports_are_merged() {
        let symbols = extract(
            r#"
package main

import (
    "fmt"
    str "strings"
    _ "github.com/lib/pq"
    "github.com/acme/app/internal/store"
)

import "os"
import log "github.com/sirupsen/logrus"
import "fmt"
"#,
        );

        let imports: Vec<&str> = symbols.imports.iter().map(String::as_str).collect();
        assert_eq!(
            imports,
            vec![
                "fmt",
                "github.com/acme/app/internal/store",
                "github.com/lib/pq",
                "github.com/sirupsen/logrus",
                "os",
                "strings",
            ]
        );
    }

    #[test]
    fn test_declarations_and_exports() {
        let symbols = extract(
            r#"
package store

type Store struct {
    db *DB
}

type cache struct{}

type Reader interface {
    Read() error
}

var ErrMissing = errors.New("missing")

func New() *Store { return &Store{} }

func (s *Store) Get(id string) error { return nil }

func helper() {}

func Map[T any](xs []T) []T { return xs }
"#,
        );

        let structs = symbols.structs.clone();
        assert!(structs.contains("Store"));
        assert!(structs.contains("cache"));
        assert!(!structs.contains("Reader"));

        for f in ["New", "Get", "helper", "Map"] {
            assert!(symbols.functions.contains(f), "missing {f}");
        }
        for e in ["Store", "Reader", "ErrMissing", "New", "Map"] {
            assert!(symbols.exports.contains(e), "missing export {e}");
        }
        assert!(!symbols.exports.contains("Get"));
        assert!(!symbols.exports.contains("cache"));
        assert!(!symbols.exports.contains("helper"));
    }

    #[test]
    fn test_nested_fields_are_not_types() {
        let symbols = extract(
            r#"
package config

type Config struct {
    Server struct {
        Port int
    }
    Limits interface{ Max() int }
}

type (
    ID string
    Pair[T any] struct {
        Left, Right T
        Meta struct {
            Note string
        }
    }
    handler interface {
        Serve()
    }
)
"#,
        );

        let structs: Vec<&str> = symbols.structs.iter().map(String::as_str).collect();
        assert_eq!(structs, vec!["Config", "Pair"]);
        let exports: Vec<&str> = symbols.exports.iter().map(String::as_str).collect();
        assert_eq!(exports, vec!["Config", "ID", "Pair"]);
    }
}
