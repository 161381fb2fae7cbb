//! JavaScript/TypeScript extraction using tree-sitter.
//!
//! Walking the syntax tree separates real module constructs from text that
//! only looks like one (inside strings, template literals or comments).

use anyhow::Context;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Parser, Query, QueryCursor, Tree};

use crate::analysis::Symbols;

/// Declarations in plain JavaScript.
const JS_DECLARATION_QUERY: &str = r#"
(function_declaration name: (identifier) @function)
(generator_function_declaration name: (identifier) @function)
(variable_declarator
  name: (identifier) @function
  value: [(arrow_function) (function_expression)])
(class_declaration name: (identifier) @class)
"#;

/// Declarations in TypeScript and TSX.
const TS_DECLARATION_QUERY: &str = r#"
(function_declaration name: (identifier) @function)
(generator_function_declaration name: (identifier) @function)
(variable_declarator
  name: (identifier) @function
  value: [(arrow_function) (function_expression)])
(class_declaration name: (type_identifier) @class)
(abstract_class_declaration name: (type_identifier) @class)
(interface_declaration name: (type_identifier) @interface)
"#;

/// Tree-sitter grammar used for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    JavaScript,
    TypeScript,
    Tsx,
}

impl Grammar {
    fn language(&self) -> tree_sitter::Language {
        match self {
            Grammar::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Grammar::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Grammar::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    fn declaration_query(&self) -> &'static str {
        match self {
            Grammar::JavaScript => JS_DECLARATION_QUERY,
            Grammar::TypeScript | Grammar::Tsx => TS_DECLARATION_QUERY,
        }
    }
}

/// Parsed tree plus the bytes it was parsed from.
struct ParsedSource<'a> {
    tree: Tree,
    source: &'a [u8],
}

impl<'a> ParsedSource<'a> {
    fn text(&self, node: Node) -> &'a str {
        node.utf8_text(self.source).unwrap_or("")
    }
}

/// Extract symbols by walking the syntax tree.
///
/// Fails when the grammar cannot be loaded or the source contains syntax
/// errors; the caller then falls back to pattern extraction.
pub fn extract(grammar: Grammar, source: &str) -> anyhow::Result<Symbols> {
    let language = grammar.language();
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .context("loading tree-sitter grammar")?;

    let tree = parser
        .parse(source, None)
        .context("tree-sitter returned no tree")?;
    if tree.root_node().has_error() {
        anyhow::bail!("source contains syntax errors");
    }

    let parsed = ParsedSource {
        tree,
        source: source.as_bytes(),
    };

    let mut symbols = Symbols::default();
    collect_declarations(&parsed, &language, grammar, &mut symbols)?;
    collect_module_facts(&parsed, &mut symbols);
    Ok(symbols)
}

fn collect_declarations(
    parsed: &ParsedSource,
    language: &tree_sitter::Language,
    grammar: Grammar,
    symbols: &mut Symbols,
) -> anyhow::Result<()> {
    let query = Query::new(language, grammar.declaration_query())?;
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, parsed.tree.root_node(), parsed.source);

    while let Some(m) = matches.next() {
        for capture in m.captures {
            let name = parsed.text(capture.node).to_string();
            match query.capture_names()[capture.index as usize] {
                "function" => {
                    symbols.functions.insert(name);
                }
                "class" => {
                    symbols.classes.insert(name);
                }
                "interface" => {
                    symbols.interfaces.insert(name);
                }
                _ => {}
            }
        }
    }

    Ok(())
}

/// Walk every node collecting imports, requires and exports.
fn collect_module_facts(parsed: &ParsedSource, symbols: &mut Symbols) {
    let mut stack = vec![parsed.tree.root_node()];

    while let Some(node) = stack.pop() {
        match node.kind() {
            "import_statement" => visit_import(parsed, node, symbols),
            "export_statement" => visit_export(parsed, node, symbols),
            "call_expression" => visit_call(parsed, node, symbols),
            "assignment_expression" => visit_assignment(parsed, node, symbols),
            _ => {}
        }

        let mut cursor = node.walk();
        stack.extend(node.children(&mut cursor));
    }
}

/// `import type ...` and `export type ...` carry an anonymous `type` token.
fn is_type_only(node: Node) -> bool {
    let mut cursor = node.walk();
    let result = node
        .children(&mut cursor)
        .any(|c| !c.is_named() && c.kind() == "type");
    result
}

/// Literal value of a string or substitution-free template string.
fn string_value(parsed: &ParsedSource, node: Node) -> Option<String> {
    let value = match node.kind() {
        "string" => Some(trim_quotes(parsed.text(node)).to_string()),
        "template_string" => {
            let mut cursor = node.walk();
            let dynamic = node
                .named_children(&mut cursor)
                .any(|c| c.kind() == "template_substitution");
            (!dynamic).then(|| parsed.text(node).trim_matches('`').to_string())
        }
        _ => None,
    };
    value.filter(|s| !s.is_empty())
}

fn trim_quotes(text: &str) -> &str {
    text.trim_matches(|c| c == '"' || c == '\'')
}

fn first_named_child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find(|c| c.kind() == kind);
    found
}

fn visit_import(parsed: &ParsedSource, node: Node, symbols: &mut Symbols) {
    if is_type_only(node) {
        return;
    }

    // `import fs = require('fs')` keeps its source inside the require clause
    let source = node.child_by_field_name("source").or_else(|| {
        first_named_child_of_kind(node, "import_require_clause").and_then(|clause| {
            clause
                .child_by_field_name("source")
                .or_else(|| first_named_child_of_kind(clause, "string"))
        })
    });

    if let Some(spec) = source.and_then(|s| string_value(parsed, s)) {
        symbols.imports.insert(spec);
    }
}

fn visit_export(parsed: &ParsedSource, node: Node, symbols: &mut Symbols) {
    let type_only = is_type_only(node);

    if let Some(spec) = node
        .child_by_field_name("source")
        .and_then(|s| string_value(parsed, s))
    {
        if !type_only {
            symbols.imports.insert(spec);
        }
    }

    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    let is_default = children.iter().any(|c| c.kind() == "default");
    if is_default {
        symbols.exports.insert("default".to_string());
    }

    for (i, child) in children.iter().enumerate() {
        match child.kind() {
            "*" => {
                symbols.exports.insert("*".to_string());
            }
            "namespace_export" => {
                let mut inner = child.walk();
                let name = child
                    .named_children(&mut inner)
                    .last()
                    .map(|n| trim_quotes(parsed.text(n)).to_string());
                if let Some(name) = name {
                    symbols.exports.insert(name);
                }
            }
            "export_clause" => {
                let mut inner = child.walk();
                for spec in child
                    .named_children(&mut inner)
                    .filter(|n| n.kind() == "export_specifier")
                {
                    let exported = spec
                        .child_by_field_name("alias")
                        .or_else(|| spec.child_by_field_name("name"));
                    if let Some(n) = exported {
                        symbols.exports.insert(trim_quotes(parsed.text(n)).to_string());
                    }
                }
            }
            // TypeScript `export = value`
            "=" => {
                if let Some(value) = children[i + 1..].iter().find(|c| c.is_named()) {
                    insert_assigned_names(parsed, *value, symbols);
                }
            }
            _ => {}
        }
    }

    if !is_default {
        if let Some(decl) = node.child_by_field_name("declaration") {
            insert_declaration_names(parsed, decl, symbols);
        }
    }
}

/// Names introduced by an exported declaration.
fn insert_declaration_names(parsed: &ParsedSource, decl: Node, symbols: &mut Symbols) {
    match decl.kind() {
        "lexical_declaration" | "variable_declaration" => {
            let mut cursor = decl.walk();
            for declarator in decl
                .named_children(&mut cursor)
                .filter(|n| n.kind() == "variable_declarator")
            {
                if let Some(name) = declarator.child_by_field_name("name") {
                    insert_binding_names(parsed, name, symbols);
                }
            }
        }
        "ambient_declaration" => {
            let mut cursor = decl.walk();
            for inner in decl.named_children(&mut cursor) {
                insert_declaration_names(parsed, inner, symbols);
            }
        }
        _ => {
            if let Some(name) = decl.child_by_field_name("name") {
                symbols.exports.insert(parsed.text(name).to_string());
            }
        }
    }
}

/// Identifiers bound by a declarator name, including destructuring patterns.
fn insert_binding_names(parsed: &ParsedSource, pattern: Node, symbols: &mut Symbols) {
    let mut stack = vec![pattern];
    while let Some(node) = stack.pop() {
        match node.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => {
                symbols.exports.insert(parsed.text(node).to_string());
            }
            // `{ key: local }` binds `local`, not `key`
            "pair_pattern" => {
                if let Some(value) = node.child_by_field_name("value") {
                    stack.push(value);
                }
            }
            _ => {
                let mut cursor = node.walk();
                stack.extend(node.named_children(&mut cursor));
            }
        }
    }
}

fn visit_call(parsed: &ParsedSource, node: Node, symbols: &mut Symbols) {
    let Some(function) = node.child_by_field_name("function") else {
        return;
    };

    let is_loader = match function.kind() {
        "import" => true,
        "identifier" => parsed.text(function) == "require",
        _ => false,
    };
    if !is_loader {
        return;
    }

    let spec = node.child_by_field_name("arguments").and_then(|args| {
        let mut cursor = args.walk();
        let first = args.named_children(&mut cursor).next();
        first.and_then(|arg| string_value(parsed, arg))
    });
    if let Some(spec) = spec {
        symbols.imports.insert(spec);
    }
}

/// CommonJS `module.exports = X`, `exports.X = Y` and `module.exports.X = Y`.
fn visit_assignment(parsed: &ParsedSource, node: Node, symbols: &mut Symbols) {
    let (Some(left), Some(right)) = (
        node.child_by_field_name("left"),
        node.child_by_field_name("right"),
    ) else {
        return;
    };
    if left.kind() != "member_expression" {
        return;
    }
    let (Some(object), Some(property)) = (
        left.child_by_field_name("object"),
        left.child_by_field_name("property"),
    ) else {
        return;
    };
    let property = parsed.text(property);

    if is_identifier(parsed, object, "module") && property == "exports" {
        insert_assigned_names(parsed, right, symbols);
    } else if is_identifier(parsed, object, "exports") || is_module_exports(parsed, object) {
        symbols.exports.insert(property.to_string());
    }
}

fn is_identifier(parsed: &ParsedSource, node: Node, name: &str) -> bool {
    node.kind() == "identifier" && parsed.text(node) == name
}

fn is_module_exports(parsed: &ParsedSource, node: Node) -> bool {
    node.kind() == "member_expression"
        && node
            .child_by_field_name("object")
            .is_some_and(|o| is_identifier(parsed, o, "module"))
        && node
            .child_by_field_name("property")
            .is_some_and(|p| parsed.text(p) == "exports")
}

/// Export names inferred from an assigned value.
///
/// Identifiers, functions and classes export their name (`default` when
/// anonymous); object literals export each key; anything else is `default`.
fn insert_assigned_names(parsed: &ParsedSource, value: Node, symbols: &mut Symbols) {
    match value.kind() {
        "identifier" => {
            symbols.exports.insert(parsed.text(value).to_string());
        }
        "function_expression" | "function" | "generator_function" | "arrow_function"
        | "class" => {
            let name = value
                .child_by_field_name("name")
                .map(|n| parsed.text(n).to_string())
                .unwrap_or_else(|| "default".to_string());
            symbols.exports.insert(name);
        }
        "object" => {
            let mut cursor = value.walk();
            for member in value.named_children(&mut cursor) {
                let key = match member.kind() {
                    "pair" => member.child_by_field_name("key"),
                    "method_definition" => member.child_by_field_name("name"),
                    "shorthand_property_identifier" => Some(member),
                    _ => None,
                };
                if let Some(key) = key {
                    symbols.exports.insert(trim_quotes(parsed.text(key)).to_string());
                }
            }
        }
        "parenthesized_expression" => {
            let mut cursor = value.walk();
            let inner = value.named_children(&mut cursor).next();
            match inner {
                Some(inner) => insert_assigned_names(parsed, inner, symbols),
                None => {
                    symbols.exports.insert("default".to_string());
                }
            }
        }
        _ => {
            symbols.exports.insert("default".to_string());
        }
    }
}
