//! Reads a package's public-name -> location table from its `__init__.py`.
//!
//! The table must be a literal `{"name": "pkg.module.func", ...}` dictionary.
//! Anything computed (names, calls, f-strings, splats, non-string values) is
//! treated as if the table were absent.

use std::collections::VecDeque;
use std::path::Path;

use indexmap::IndexMap;
use tree_sitter::Node;

use crate::error::{Result, SchemaError};
use crate::python::{node_text, parse_python, string_literal_value};

/// Public tool name -> dotted location of the callable.
pub type Manifest = IndexMap<String, String>;

pub const MANIFEST_VARIABLE: &str = "_function_map";

/// Find the first assignment to `variable` (breadth-first, as Python's
/// `ast.walk` visits) and read its value as a literal string table.
pub fn extract_literal_table(source: &str, variable: &str) -> Result<Option<Manifest>> {
    let tree = parse_python(source)?;
    let root = tree.root_node();
    if root.has_error() {
        tracing::debug!(variable, "source has syntax errors, ignoring table");
        return Ok(None);
    }
    let src = source.as_bytes();

    let mut queue = VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        if node.kind() == "assignment"
            && let Some(left) = node.child_by_field_name("left")
            && left.kind() == "identifier"
            && node_text(&left, src) == variable
        {
            return Ok(node
                .child_by_field_name("right")
                .and_then(|right| literal_table(&right, src)));
        }

        let mut cursor = node.walk();
        queue.extend(node.named_children(&mut cursor));
    }

    Ok(None)
}

fn literal_table(node: &Node, src: &[u8]) -> Option<Manifest> {
    if node.kind() != "dictionary" {
        return None;
    }

    let mut table = Manifest::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "comment" => continue,
            "pair" => {
                let key = child
                    .child_by_field_name("key")
                    .and_then(|k| string_literal_value(&k, src))?;
                let value = child
                    .child_by_field_name("value")
                    .and_then(|v| string_literal_value(&v, src))?;
                table.insert(key, value);
            }
            _ => return None,
        }
    }
    Some(table)
}

/// Read the manifest declared in `init_path`.
///
/// `Ok(None)` means the file has no literal table.
pub fn load_manifest(init_path: &Path) -> Result<Option<Manifest>> {
    let source =
        std::fs::read_to_string(init_path).map_err(|e| SchemaError::io(init_path, e))?;
    extract_literal_table(&source, MANIFEST_VARIABLE)
}
