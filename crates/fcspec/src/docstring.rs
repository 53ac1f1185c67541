//! Google-style docstring reader.
//!
//! Splits a docstring into its short and long description and the items of
//! its `Args:`-like sections. Item descriptions keep the relative indentation
//! of their continuation lines so nested `name (type): description` lines
//! survive for the property parser.

use std::sync::LazyLock;

use regex::Regex;

static SECTION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z][A-Za-z ]*?):[ \t]*$").expect("valid regex"));
static TYPED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(.+?)\s*\(\s*(.*\S)\s*\)").expect("valid regex"));
static OPTIONAL_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*,\s*optional\s*$").expect("valid regex"));
/// `<text>. Defaults to <value>.` on the first description line.
static DEFAULT_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*\. Defaults to (.+)\.").expect("valid regex"));

const PARAM_SECTIONS: &[&str] = &[
    "Args",
    "Arguments",
    "Parameters",
    "Params",
    "Attributes",
    "Keyword Args",
    "Keyword Arguments",
    "Kwargs",
];

const OTHER_SECTIONS: &[&str] = &[
    "Raises",
    "Exceptions",
    "Except",
    "Returns",
    "Return",
    "Yields",
    "Yield",
    "Example",
    "Examples",
    "Note",
    "Notes",
    "Warning",
    "Warnings",
    "See Also",
    "Todo",
    "References",
];

/// A parsed docstring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Docstring {
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub params: Vec<DocParam>,
}

/// One item of a parameter section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocParam {
    pub name: String,
    pub type_name: Option<String>,
    pub description: String,
    /// `(type, optional)` or `(type?)`.
    pub is_optional: bool,
    /// Value named by a `Defaults to ...` phrase.
    pub default: Option<String>,
}

impl DocParam {
    /// The documentation itself says the argument may be omitted.
    pub fn marked_optional(&self) -> bool {
        self.is_optional || self.default.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Params,
    Other,
}

fn section_of(line: &str) -> Option<Section> {
    let caps = SECTION_HEADER.captures(line)?;
    let title = caps.get(1)?.as_str();
    if PARAM_SECTIONS.contains(&title) {
        Some(Section::Params)
    } else if OTHER_SECTIONS.contains(&title) {
        Some(Section::Other)
    } else {
        None
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Remove the indentation common to every non-blank line.
fn dedent(lines: &[&str]) -> Vec<String> {
    let margin = lines
        .iter()
        .filter(|l| !is_blank(l))
        .map(|l| indent_of(l))
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| {
            if is_blank(l) {
                String::new()
            } else {
                l.get(margin..).unwrap_or(l.trim_start()).trim_end().to_string()
            }
        })
        .collect()
}

fn trim_blank_edges(mut lines: Vec<String>) -> Vec<String> {
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    let first = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
    lines.split_off(first)
}

/// Replace tabs with spaces up to the next multiple-of-8 column.
fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let pad = 8 - column % 8;
            out.extend(std::iter::repeat_n(' ', pad));
            column += pad;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}

/// Normalise docstring indentation the way Python's `inspect.cleandoc` does:
/// the first line loses its leading whitespace, later lines lose their
/// common indentation, and blank leading/trailing lines are removed.
pub fn clean_docstring(text: &str) -> String {
    let expanded: Vec<String> = text.lines().map(expand_tabs).collect();
    let lines: Vec<&str> = expanded.iter().map(String::as_str).collect();
    let Some((first, rest)) = lines.split_first() else {
        return String::new();
    };

    let mut cleaned = vec![first.trim().to_string()];
    cleaned.extend(dedent(rest));
    trim_blank_edges(cleaned).join("\n")
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a Google-style docstring.
pub fn parse_google(text: &str) -> Docstring {
    let cleaned = clean_docstring(text);
    let lines: Vec<&str> = cleaned.lines().collect();

    let first_header = lines
        .iter()
        .position(|l| section_of(l).is_some())
        .unwrap_or(lines.len());

    let mut doc = Docstring::default();
    let (short, long) = split_description(&lines[..first_header]);
    doc.short_description = short;
    doc.long_description = long;

    let mut i = first_header;
    while i < lines.len() {
        let Some(section) = section_of(lines[i]) else {
            i += 1;
            continue;
        };
        let start = i + 1;
        let mut end = start;
        // A section runs until the next unindented, non-blank line.
        while end < lines.len() && (is_blank(lines[end]) || indent_of(lines[end]) > 0) {
            end += 1;
        }
        if section == Section::Params {
            doc.params.extend(parse_items(&lines[start..end]));
        }
        i = end;
    }

    doc
}

fn split_description(lines: &[&str]) -> (Option<String>, Option<String>) {
    let Some((first, rest)) = lines.split_first() else {
        return (None, None);
    };
    let non_empty = |s: String| (!s.is_empty()).then_some(s);
    let short = non_empty(first.trim().to_string());
    let long = non_empty(rest.join("\n").trim().to_string());
    (short, long)
}

/// Split a parameter section body into items at its base indentation.
fn parse_items(body: &[&str]) -> Vec<DocParam> {
    let Some(base) = body.iter().find(|l| !is_blank(l)).map(|l| indent_of(l)) else {
        return Vec::new();
    };

    let mut items: Vec<Vec<&str>> = Vec::new();
    for &line in body {
        if !is_blank(line) && indent_of(line) <= base {
            items.push(vec![line]);
        } else if let Some(current) = items.last_mut() {
            current.push(line);
        }
    }

    items.iter().map(|item| parse_item(item)).collect()
}

fn parse_item(lines: &[&str]) -> DocParam {
    let head = lines.first().map(|l| l.trim()).unwrap_or_default();
    let (before, first_line) = match head.split_once(':') {
        Some((before, after)) => (before, after.trim()),
        None => (head, ""),
    };

    let rest = trim_blank_edges(dedent(lines.get(1..).unwrap_or_default()));
    let description = match (first_line.is_empty(), rest.is_empty()) {
        (_, true) => first_line.to_string(),
        (true, false) => rest.join("\n"),
        (false, false) => format!("{first_line}\n{}", rest.join("\n")),
    };

    let (name, type_name, is_optional) = match TYPED_ITEM.captures(before) {
        Some(caps) => {
            let name = caps.get(1).map_or("", |m| m.as_str());
            let raw_type = caps.get(2).map_or("", |m| m.as_str());
            let (type_name, optional) = match OPTIONAL_SUFFIX.find(raw_type) {
                Some(m) => (&raw_type[..m.start()], true),
                None => match raw_type.strip_suffix('?') {
                    Some(t) => (t.trim_end(), true),
                    None => (raw_type, false),
                },
            };
            (name.trim(), Some(type_name.to_string()), optional)
        }
        None => (before.trim(), None, false),
    };

    let default = DEFAULT_PHRASE
        .captures(&description)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    DocParam {
        name: name.to_string(),
        type_name,
        description,
        is_optional,
        default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"Create a new ticket.

    Tickets are routed to the owning team.
    Routing happens asynchronously.

    Args:
        title (str): Short summary.
        fields (Dict[str, Any]): Extra fields.
            priority (str): One of low, high.
            labels (Optional[List[str]]): Labels.
        assignee (str, optional): User to assign.
        notify (bool?): Send email.
        limit (int): Max retries. Defaults to 3.
        raw: Untyped value.

    Returns:
        Dict[str, Any]: The created ticket.
    "#;

    #[test]
    fn test_clean_docstring_matches_cleandoc() {
        let text = "  First.\n\n      indented\n    body\n  ";
        assert_eq!(clean_docstring(text), "First.\n\n  indented\nbody");
        assert_eq!(clean_docstring(""), "");
        assert_eq!(clean_docstring("\n\n   Only.\n"), "Only.");
    }

    #[test]
    fn test_tabs_expand_to_tab_stops() {
        assert_eq!(expand_tabs("  \tA"), "        A");
        assert_eq!(expand_tabs("ab\tc\t"), "ab      c       ");
        assert_eq!(clean_docstring("First.\n  \tA\n\tB"), "First.\nA\nB");
    }

    #[test]
    fn test_descriptions() {
        let doc = parse_google(SAMPLE);
        assert_eq!(doc.short_description.as_deref(), Some("Create a new ticket."));
        assert_eq!(
            doc.long_description.as_deref(),
            Some("Tickets are routed to the owning team.\nRouting happens asynchronously.")
        );
    }

    #[test]
    fn test_param_items() {
        let doc = parse_google(SAMPLE);
        let names: Vec<_> = doc.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["title", "fields", "assignee", "notify", "limit", "raw"]);

        let title = &doc.params[0];
        assert_eq!(title.type_name.as_deref(), Some("str"));
        assert_eq!(title.description, "Short summary.");
        assert!(!title.marked_optional());

        let fields = &doc.params[1];
        assert_eq!(fields.type_name.as_deref(), Some("Dict[str, Any]"));
        assert_eq!(
            fields.description,
            "Extra fields.\npriority (str): One of low, high.\nlabels (Optional[List[str]]): Labels."
        );

        assert!(doc.params[2].is_optional);
        assert_eq!(doc.params[2].type_name.as_deref(), Some("str"));
        assert!(doc.params[3].is_optional);
        assert_eq!(doc.params[3].type_name.as_deref(), Some("bool"));

        let limit = &doc.params[4];
        assert_eq!(limit.default.as_deref(), Some("3"));
        assert!(limit.marked_optional());

        assert_eq!(doc.params[5].type_name, None);
        assert_eq!(doc.params[5].description, "Untyped value.");
    }

    #[test]
    fn test_nested_indentation_is_relative() {
        let text = "Do it.\n\nArgs:\n    spec (dict): Spec.\n        outer (object): Outer.\n            inner (int): Inner.\n";
        let doc = parse_google(text);
        assert_eq!(
            doc.params[0].description,
            "Spec.\nouter (object): Outer.\n    inner (int): Inner."
        );
    }

    #[test]
    fn test_no_sections() {
        let doc = parse_google("Just a summary.");
        assert_eq!(doc.short_description.as_deref(), Some("Just a summary."));
        assert_eq!(doc.long_description, None);
        assert!(doc.params.is_empty());
    }

    #[test]
    fn test_unknown_header_is_description() {
        let doc = parse_google("Summary.\n\nUsage:\n    call it\n\nArgs:\n    x (int): X.");
        assert_eq!(doc.long_description.as_deref(), Some("Usage:\n    call it"));
        assert_eq!(doc.params.len(), 1);
    }

    #[test]
    fn test_default_phrases() {
        for (text, expected) in [
            ("Page size. Defaults to 50.", Some("50")),
            ("Timeout in seconds. Defaults to 2.5.", Some("2.5")),
            ("Mode. Default: strict", None),
            ("Required. No default: caller must choose.", None),
            ("Sort order (default: asc) applied to results.", None),
            ("Whether to retry.\n        Defaults to False.", None),
            ("Defaults to 3.", None),
            ("Uses default settings", None),
        ] {
            let doc = parse_google(&format!("S.\n\nArgs:\n    x (str): {text}"));
            assert_eq!(doc.params[0].default.as_deref(), expected, "{text}");
        }
    }
}
