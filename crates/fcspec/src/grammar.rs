//! Type-annotation grammar.
//!
//! Maps the textual form of a Python annotation (`Optional[List[Dict[str, Any]]]`)
//! to a [`SchemaNode`]. Both entry points are total: anything unrecognised
//! falls back to an open object shell rather than failing.

use crate::types::SchemaNode;

// ---------------------------------------------------------------------------
// Splitting
// ---------------------------------------------------------------------------

/// Split on commas that are not nested inside `[...]` or `(...)`.
///
/// Parts are trimmed and empty parts are dropped.
pub fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '[' | '(' => depth += 1,
            ']' | ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Strip one layer of wrapping parentheses: `(str, optional)` -> `str, optional`.
pub fn strip_outer_parens(s: &str) -> &str {
    let s = s.trim();
    match s.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
        Some(inner) => inner.trim(),
        None => s,
    }
}

/// Text between `prefix` and the final `]`, if `s` has that shape.
fn generic_inner<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    s.strip_prefix(prefix)
        .map(|rest| rest.strip_suffix(']').unwrap_or(rest).trim())
}

fn is_none_token(s: &str) -> bool {
    s.eq_ignore_ascii_case("none") || s.eq_ignore_ascii_case("nonetype")
}

/// Members of a `Union[...]` / `Optional[...]` body with `None` removed.
pub fn non_none_members(inner: &str) -> Vec<&str> {
    split_top_level(inner)
        .into_iter()
        .filter(|m| !is_none_token(m))
        .collect()
}

// ---------------------------------------------------------------------------
// Type mapping
// ---------------------------------------------------------------------------

fn primitive(s: &str) -> Option<SchemaNode> {
    let node = match s {
        "str" | "bytes" | "UUID" => SchemaNode::string(),
        "int" => SchemaNode::integer(),
        "float" => SchemaNode::number(),
        "bool" => SchemaNode::boolean(),
        "list" | "List" | "tuple" | "Tuple" => SchemaNode::array(None),
        "dict" | "Dict" | "Any" => SchemaNode::object_shell(),
        _ => return None,
    };
    Some(node)
}

fn unquote(s: &str) -> Option<&str> {
    if s.len() < 2 {
        return None;
    }
    ['\'', '"']
        .into_iter()
        .find_map(|q| s.strip_prefix(q).and_then(|rest| rest.strip_suffix(q)))
}

/// Map a type annotation to its schema fragment.
///
/// `Optional[X]` maps exactly like `X`; optionality is reported separately by
/// [`is_optional`]. Unions keep only their first non-`None` member, tuples map
/// their whole inner text as a single item type, and dictionaries always
/// become an open object shell.
pub fn map_type(type_string: Option<&str>) -> SchemaNode {
    let s = type_string.map(str::trim).unwrap_or("");
    if s.is_empty() {
        return SchemaNode::object_shell();
    }

    if let Some(node) = primitive(s) {
        return node;
    }

    if let Some(inner) = unquote(s) {
        return map_type(Some(inner));
    }

    if let Some(inner) = generic_inner(s, "Optional[").or_else(|| generic_inner(s, "Union[")) {
        return match non_none_members(inner).first() {
            Some(first) => map_type(Some(first)),
            None => SchemaNode::null(),
        };
    }

    if !s.ends_with(']') {
        return SchemaNode::object_shell();
    }

    if let Some(inner) = generic_inner(s, "List[").or_else(|| generic_inner(s, "list[")) {
        let items = (!inner.is_empty()).then(|| map_type(Some(inner)));
        return SchemaNode::array(items);
    }

    if let Some(inner) = generic_inner(s, "Tuple[").or_else(|| generic_inner(s, "tuple[")) {
        let items = (!inner.is_empty()).then(|| map_type(Some(inner)));
        return SchemaNode::array(items);
    }

    if s.starts_with("Dict[") || s.starts_with("dict[") {
        return SchemaNode::object_shell();
    }

    if let Some(inner) = generic_inner(s, "Literal[") {
        return if inner.chars().any(|c| c.is_ascii_digit()) {
            SchemaNode::integer()
        } else {
            SchemaNode::string()
        };
    }

    SchemaNode::object_shell()
}

// ---------------------------------------------------------------------------
// Optionality
// ---------------------------------------------------------------------------

/// Index of the `]` closing the `[` at byte offset `open`.
fn matching_bracket(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s[open..].char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Whether a type string declares its value optional.
///
/// True for `Optional[...]` with a balanced bracket, a `Union[...]` that
/// includes `None`, or a free-text `(str, optional)` style marker.
pub fn is_optional(type_string: Option<&str>) -> bool {
    let Some(raw) = type_string else {
        return false;
    };
    let s = strip_outer_parens(raw);

    if s.starts_with("Optional[") && matching_bracket(s, "Optional".len()).is_some() {
        return true;
    }

    if s.starts_with("Union[")
        && let Some(close) = matching_bracket(s, "Union".len())
        && split_top_level(&s["Union[".len()..close])
            .iter()
            .any(|m| is_none_token(m))
    {
        return true;
    }

    split_top_level(s)
        .iter()
        .any(|m| m.eq_ignore_ascii_case("optional"))
}
