//! Tree-sitter helpers shared by the manifest and source readers.

use tree_sitter::{Node, Parser, Tree};

use crate::error::{Result, SchemaError};

pub(crate) fn parse_python(source: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|e| SchemaError::ParseError(format!("failed to set language: {e}")))?;
    parser
        .parse(source, None)
        .ok_or_else(|| SchemaError::ParseError("tree-sitter parse returned None".into()))
}

pub(crate) fn node_text<'a>(node: &Node, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}

/// The `function_definition` or `class_definition` behind a statement,
/// looking through decorators.
pub(crate) fn definition<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    if node.kind() == kind {
        return Some(node);
    }
    if node.kind() == "decorated_definition" {
        return node
            .child_by_field_name("definition")
            .filter(|def| def.kind() == kind);
    }
    None
}

pub(crate) fn name_of<'a>(node: &Node, src: &'a [u8]) -> Option<&'a str> {
    node.child_by_field_name("name").map(|name| node_text(&name, src))
}

// ---------------------------------------------------------------------------
// String literals
// ---------------------------------------------------------------------------

/// Value of a plain string literal expression.
///
/// Handles `r`/`u` prefixes, triple quotes, implicit concatenation and
/// parentheses. f-strings and bytes are not plain values and yield `None`.
pub(crate) fn string_literal_value(node: &Node, src: &[u8]) -> Option<String> {
    match node.kind() {
        "string" => parse_string_literal(node_text(node, src)),
        "concatenated_string" => {
            let mut out = String::new();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() == "comment" {
                    continue;
                }
                out.push_str(&string_literal_value(&child, src)?);
            }
            Some(out)
        }
        "parenthesized_expression" => {
            let mut cursor = node.walk();
            let mut inner = node
                .named_children(&mut cursor)
                .filter(|c| c.kind() != "comment");
            let value = inner.next()?;
            if inner.next().is_some() {
                return None;
            }
            string_literal_value(&value, src)
        }
        _ => None,
    }
}

fn parse_string_literal(text: &str) -> Option<String> {
    let prefix_len = text.find(['"', '\''])?;
    let prefix = text[..prefix_len].to_ascii_lowercase();
    if !prefix.chars().all(|c| c == 'r' || c == 'u') {
        return None;
    }

    let body = &text[prefix_len..];
    let quote = ["\"\"\"", "'''", "\"", "'"]
        .into_iter()
        .find(|q| body.len() >= 2 * q.len() && body.starts_with(q) && body.ends_with(q))?;
    let inner = &body[quote.len()..body.len() - quote.len()];

    if prefix.contains('r') {
        Some(inner.to_string())
    } else {
        Some(unescape(inner))
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\n') => {}
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some(kind @ ('x' | 'u' | 'U')) => {
                let width = match kind {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = (0..width)
                    .filter_map(|_| chars.next_if(char::is_ascii_hexdigit))
                    .collect();
                match u32::from_str_radix(&digits, 16)
                    .ok()
                    .and_then(char::from_u32)
                {
                    Some(decoded) if digits.len() == width => out.push(decoded),
                    _ => {
                        out.push('\\');
                        out.push(kind);
                        out.push_str(&digits);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
