//! Indentation-driven nested property parser.
//!
//! Mines `name (type): description` lines out of free-text documentation and
//! arranges them into an object shape. Nesting comes from indentation: a
//! property belongs to the closest earlier, shallower property whose own type
//! can carry properties (an object, or an array of objects).
//!
//! ```text
//! user (object): The user record.
//!   id (str): Unique id.
//!   roles (List[str]): Assigned roles.
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::grammar::{is_optional, map_type, non_none_members, split_top_level};
use crate::types::{ObjectShape, SchemaNode, clean_description};

static OPTIONALITY_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i),?\s*(optional|required)\s*").expect("valid regex")
});

/// A `name (type): description` line and the continuation text bound to it.
#[derive(Debug)]
struct PropertyLine<'a> {
    name: String,
    type_string: &'a str,
    inline_description: &'a str,
    indent: usize,
    order_index: usize,
    continuation: Vec<&'a str>,
}

impl PropertyLine<'_> {
    /// Inline text followed by every continuation line.
    fn full_description(&self) -> String {
        let continuation = self
            .continuation
            .iter()
            .map(|line| line.trim_end())
            .collect::<Vec<_>>()
            .join("\n");
        match (self.inline_description.is_empty(), continuation.is_empty()) {
            (_, true) => self.inline_description.to_string(),
            (true, false) => continuation,
            (false, false) => format!("{}\n{continuation}", self.inline_description),
        }
    }
}

/// A property line resolved into its schema node.
struct Resolved {
    name: String,
    node: SchemaNode,
    required: bool,
}

// ---------------------------------------------------------------------------
// Line classification
// ---------------------------------------------------------------------------

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}

fn strip_name_quotes(name: &str) -> &str {
    if name.len() < 2 {
        return name;
    }
    ['"', '\'', '`']
        .into_iter()
        .find_map(|q| name.strip_prefix(q).and_then(|rest| rest.strip_suffix(q)))
        .unwrap_or(name)
}

/// Split a property-definition line into `(name, type, inline description)`.
///
/// Returns `None` for prose: the text before `(` must be a bare (optionally
/// quoted) identifier and the parenthesised type must be non-empty.
fn parse_property_line(line: &str) -> Option<(&str, &str, &str)> {
    let stripped = line.trim();
    let content = match stripped.strip_prefix('-') {
        Some(rest) => rest.trim(),
        None => stripped,
    };

    let close = content.find("):")?;
    let open = content[..close].rfind('(')?;
    let type_string = content[open + 1..close].trim();
    let name = content[..open].trim();
    if type_string.is_empty() || name.is_empty() {
        return None;
    }

    let name = strip_name_quotes(name);
    if !is_identifier(name) {
        return None;
    }

    Some((name, type_string, content[close + 2..].trim()))
}

/// The type a property line maps to once optionality markers are removed.
fn property_type(raw: &str) -> Cow<'_, str> {
    if let Some(inner) = raw
        .strip_prefix("Optional[")
        .and_then(|rest| rest.strip_suffix(']'))
    {
        return Cow::Borrowed(inner.trim());
    }
    if let Some(inner) = raw
        .strip_prefix("Union[")
        .and_then(|rest| rest.strip_suffix(']'))
    {
        let first = non_none_members(inner).first().copied().unwrap_or("Any");
        return Cow::Borrowed(first);
    }
    match split_top_level(raw).as_slice() {
        [first, _, ..] => Cow::Borrowed(*first),
        _ => Cow::Owned(OPTIONALITY_MARKER.replace_all(raw, "").trim().to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse nested properties out of `text`.
///
/// Returns the text that is neither a property line nor bound to one (cleaned),
/// plus the discovered properties. When `text` holds no property lines the
/// whole cleaned text comes back with `None`.
pub fn parse_object_properties(text: &str) -> (String, Option<ObjectShape>) {
    if text.is_empty() {
        return (String::new(), None);
    }

    let mut props: Vec<PropertyLine> = Vec::new();
    // indent -> indices into `props`, in order of appearance
    let mut levels: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    let mut leftover: Vec<&str> = Vec::new();
    // (indent, target) of the current continuation run; a `None` target is
    // the leftover description
    let mut run: Option<(usize, Option<usize>)> = None;

    for (order_index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let indent = indent_of(line);

        if let Some((name, type_string, inline_description)) = parse_property_line(line) {
            run = None;
            levels.entry(indent).or_default().push(props.len());
            props.push(PropertyLine {
                name: name.to_string(),
                type_string,
                inline_description,
                indent,
                order_index,
                continuation: Vec::new(),
            });
            continue;
        }

        let target = match run {
            Some((run_indent, target)) if indent > run_indent => target,
            _ => {
                run = None;
                levels
                    .range(..indent)
                    .next_back()
                    .and_then(|(_, stack)| stack.last().copied())
            }
        };

        match target {
            Some(i) => props[i].continuation.push(line),
            None => leftover.push(line),
        }
        if run.is_none() {
            run = Some((indent, target));
        }
    }

    if props.is_empty() {
        return (clean_description(text), None);
    }

    let order: Vec<usize> = levels.values().flatten().copied().collect();
    let resolved: Vec<Resolved> = props.iter().map(resolve_property).collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); props.len()];
    let mut roots = Vec::new();
    for &i in &order {
        match find_parent(i, &props, &resolved) {
            Some(parent) => children[parent].push(i),
            None => roots.push(i),
        }
    }

    let mut slots: Vec<Option<SchemaNode>> = Vec::with_capacity(resolved.len());
    let mut meta = Vec::with_capacity(resolved.len());
    for Resolved {
        name,
        node,
        required,
    } in resolved
    {
        slots.push(Some(node));
        meta.push((name, required));
    }

    let mut shape = ObjectShape::default();
    for i in roots {
        if let Some(node) = materialize(i, &mut slots, &children, &meta) {
            let (name, required) = &meta[i];
            shape.insert(name.clone(), node, *required);
        }
    }

    (clean_description(&leftover.join("\n")), Some(shape))
}

fn resolve_property(prop: &PropertyLine) -> Resolved {
    let full_description = prop.full_description();
    let mut node = map_type(Some(&property_type(prop.type_string)));
    if node.can_host_properties() {
        let (leftover, nested) = parse_object_properties(&full_description);
        node.set_description(leftover);
        if let Some(nested) = nested
            && let Some(host) = node.host_mut()
        {
            host.absorb(nested);
        }
    } else {
        node.set_description(clean_description(&full_description));
    }

    Resolved {
        name: prop.name.clone(),
        node,
        required: !is_optional(Some(prop.type_string)),
    }
}

/// The closest earlier, shallower property able to host `child`.
///
/// Deeper indentation wins; ties go to the later line.
fn find_parent(child: usize, props: &[PropertyLine], resolved: &[Resolved]) -> Option<usize> {
    let current = &props[child];
    props
        .iter()
        .enumerate()
        .filter(|(j, candidate)| {
            candidate.order_index < current.order_index
                && candidate.indent < current.indent
                && resolved[*j].node.can_host_properties()
        })
        .max_by_key(|(_, candidate)| (candidate.indent, candidate.order_index))
        .map(|(j, _)| j)
}

fn materialize(
    i: usize,
    slots: &mut [Option<SchemaNode>],
    children: &[Vec<usize>],
    meta: &[(String, bool)],
) -> Option<SchemaNode> {
    let mut node = slots[i].take()?;
    for &child in &children[i] {
        if let Some(child_node) = materialize(child, slots, children, meta)
            && let Some(host) = node.host_mut()
        {
            let (name, required) = &meta[child];
            host.insert(name.clone(), child_node, *required);
        }
    }
    Some(node)
}
