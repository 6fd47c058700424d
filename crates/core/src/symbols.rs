//! Symbol extraction: per-definition records (byte range, kind, qualified
//! name, signature) driven by each language handler's tree-sitter query.

use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Parser, Query, QueryCursor};

use crate::handlers::block_type_from_capture;
use crate::types::{ByteRange, FileParseStatus, Symbol};

/// Node kinds treated as an enclosing scope when building a qualified name.
/// Checked against every ancestor of a captured definition node; shared
/// across languages since most tree-sitter grammars reuse these names.
const CONTAINER_KINDS: &[&str] = &[
    "impl_item",
    "class_declaration",
    "class_definition",
    "class_body",
    "trait_item",
    "struct_item",
    "enum_item",
    "interface_declaration",
    "mod_item",
    "namespace_declaration",
];

/// Result of running a language handler's symbol query over one file.
pub struct ExtractionResult {
    /// Every definition the query captured, in document order.
    pub symbols: Vec<Symbol>,
    /// Parse-health classification for this file.
    pub status: FileParseStatus,
}

/// Parse `text` with `ts_language` and run `query_src` over it, producing
/// one [`Symbol`] per `@definition.<kind>` capture with a sibling `@name`.
///
/// `qualifier_separator` joins an enclosing scope's name with a nested
/// definition's (`"."` for most languages, `"::"` for Rust).
#[must_use]
pub fn extract_symbols(text: &str, ts_language: &tree_sitter::Language, query_src: &str, qualifier_separator: &str) -> ExtractionResult {
    let mut parser = Parser::new();
    if parser.set_language(ts_language).is_err() {
        return ExtractionResult { symbols: Vec::new(), status: FileParseStatus::Error };
    }

    let Some(tree) = parser.parse(text, None) else {
        return ExtractionResult { symbols: Vec::new(), status: FileParseStatus::Error };
    };

    let root = tree.root_node();
    let has_error = root.has_error();

    let Ok(query) = Query::new(ts_language, query_src) else {
        return ExtractionResult { symbols: Vec::new(), status: if has_error { FileParseStatus::Partial } else { FileParseStatus::Ok } };
    };

    let mut symbols = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, root, text.as_bytes());
    while let Some(m) = matches.next() {
        let Some(def_capture) = m.captures.iter().find(|c| {
            query.capture_names()[c.index as usize].starts_with("definition.")
        }) else {
            continue;
        };
        let capture_name = query.capture_names()[def_capture.index as usize];
        let Some(kind) = block_type_from_capture(capture_name) else { continue };

        let Some(name_capture) = m.captures.iter().find(|c| query.capture_names()[c.index as usize] == "name") else {
            continue;
        };
        let name = text[name_capture.node.start_byte()..name_capture.node.end_byte()].to_string();

        let node = def_capture.node;
        let qualified_name = qualified_name(node, text, qualifier_separator, &name);
        let signature = extract_signature(node, text);
        let range = node_range(node);

        symbols.push(Symbol { kind, name, qualified_name, signature, range });
    }

    symbols.sort_by_key(|s| s.range.start);

    let status = if has_error { FileParseStatus::Partial } else { FileParseStatus::Ok };
    ExtractionResult { symbols, status }
}

/// Walk `node`'s ancestors, collecting enclosing-scope names, to build a
/// fully qualified name like `TypeName.method` or `module::Type::method`.
fn qualified_name(node: Node<'_>, source: &str, separator: &str, leaf_name: &str) -> String {
    let mut scopes = Vec::new();

    // Go methods bind their receiver as a field on the method node itself
    // rather than nesting inside a container node (spec §4.5's "receiver-
    // method binding"); no other supported language shapes methods this way.
    if let Some(receiver) = node.child_by_field_name("receiver") {
        let receiver_text = &source[receiver.start_byte()..receiver.end_byte()];
        let type_name = receiver_text.trim_start_matches('(').trim_end_matches(')').trim().trim_start_matches('*');
        if let Some(type_name) = type_name.split_whitespace().last() {
            scopes.push(type_name.trim_start_matches('*').to_string());
        }
    }

    let mut current = node.parent();
    while let Some(ancestor) = current {
        if CONTAINER_KINDS.contains(&ancestor.kind()) {
            let name_field = if ancestor.kind() == "impl_item" { "type" } else { "name" };
            if let Some(name_node) = ancestor.child_by_field_name(name_field) {
                scopes.push(source[name_node.start_byte()..name_node.end_byte()].to_string());
            }
        }
        current = ancestor.parent();
    }
    scopes.reverse();
    scopes.push(leaf_name.to_string());
    scopes.join(separator)
}

/// The declaration prefix up to (not including) the opening body delimiter;
/// for colon-terminated grammars (e.g. Python) the slice naturally includes
/// the colon since it precedes the body node.
fn extract_signature(node: Node<'_>, source: &str) -> String {
    if let Some(body) = node.child_by_field_name("body") {
        return source[node.start_byte()..body.start_byte()].trim_end().to_string();
    }
    let text = &source[node.start_byte()..node.end_byte()];
    text.lines().next().unwrap_or(text).trim_end().to_string()
}

fn node_range(node: Node<'_>) -> ByteRange {
    ByteRange {
        start: node.start_byte(),
        end: node.end_byte(),
        start_line: node.start_position().row + 1,
        end_line: node.end_position().row + 1,
    }
}

/// Classify a file whose language has no registered handler, or whose
/// parser failed to initialise at all -- callers that never reach
/// [`extract_symbols`] still need a parse-results row.
#[must_use]
pub fn unsupported() -> ExtractionResult {
    ExtractionResult { symbols: Vec::new(), status: FileParseStatus::Unsupported }
}
