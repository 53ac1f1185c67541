//! Source introspection: dotted location -> callable documentation.
//!
//! The compiler only sees [`SourceIntrospector`]. [`PythonIntrospector`]
//! implements it by reading Python sources with tree-sitter, never importing
//! or executing them.

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tree_sitter::Node;

use crate::docstring::{Docstring, parse_google};
use crate::error::{Result, SchemaError};
use crate::python::{definition, name_of, node_text, parse_python, string_literal_value};
use crate::types::{ParameterDoc, RawDoc};

/// Capability the compiler needs from whatever can look up callables.
pub trait SourceIntrospector: Send + Sync {
    type Handle;

    /// Locate the callable named by a dotted `location`.
    fn resolve(&self, location: &str) -> Result<Self::Handle>;

    /// Function-level documentation, or `None` when the callable has none.
    fn doc_of(&self, handle: &Self::Handle) -> Option<RawDoc>;

    /// Documented parameters in declaration order.
    fn params_of(&self, handle: &Self::Handle) -> Vec<ParameterDoc>;
}

// ---------------------------------------------------------------------------
// Python sources
// ---------------------------------------------------------------------------

/// A callable found in a Python source file.
#[derive(Debug, Clone)]
pub struct PythonCallable {
    pub location: String,
    pub file: PathBuf,
    pub docstring: Option<Docstring>,
    /// Parameters declared with a default value in the signature.
    pub defaults: HashSet<String>,
}

/// Resolves dotted locations against a source root such as `./APIs`.
#[derive(Debug)]
pub struct PythonIntrospector {
    root: PathBuf,
    sources: DashMap<PathBuf, Arc<str>>,
}

impl PythonIntrospector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            sources: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Source file for `location`, trying the longest module prefix first:
    /// `a/b/c.py`, then `a/b/c/__init__.py`, then `a/b.py`, and so on.
    pub fn resolve_file(&self, location: &str) -> Option<PathBuf> {
        let parts: Vec<&str> = location.split('.').filter(|p| !p.is_empty()).collect();
        (1..=parts.len()).rev().find_map(|len| {
            let module = parts[..len]
                .iter()
                .fold(self.root.clone(), |path, part| path.join(part));
            let file = module.with_extension("py");
            if file.is_file() {
                return Some(file);
            }
            let init = module.join("__init__.py");
            init.is_file().then_some(init)
        })
    }

    fn source(&self, path: &Path) -> Result<Arc<str>> {
        if let Some(source) = self.sources.get(path) {
            return Ok(Arc::clone(source.value()));
        }
        let text = std::fs::read_to_string(path).map_err(|e| SchemaError::io(path, e))?;
        let source: Arc<str> = Arc::from(text);
        self.sources.insert(path.to_path_buf(), Arc::clone(&source));
        Ok(source)
    }
}

impl SourceIntrospector for PythonIntrospector {
    type Handle = PythonCallable;

    fn resolve(&self, location: &str) -> Result<PythonCallable> {
        let file = self
            .resolve_file(location)
            .ok_or_else(|| SchemaError::UnresolvableLocation(location.to_string()))?;
        let source = self.source(&file)?;
        let tree = parse_python(&source)?;
        let src = source.as_bytes();

        let mut segments = location.rsplit('.');
        let function_name = segments.next().unwrap_or(location);
        let module_stem = file.file_stem().and_then(|s| s.to_str());
        let class_name = segments.next().filter(|name| Some(*name) != module_stem);

        let root = tree.root_node();
        let scope = class_name
            .and_then(|name| find_class_body(root, src, name))
            .unwrap_or(root);

        let func = find_function(scope, src, function_name).ok_or_else(|| {
            SchemaError::CallableNotFound {
                name: location.to_string(),
                file: file.clone(),
            }
        })?;

        let docstring = docstring_of(&func, src).map(|text| parse_google(&text));

        tracing::trace!(
            location,
            file = %file.display(),
            documented = docstring.is_some(),
            "resolved callable"
        );

        Ok(PythonCallable {
            location: location.to_string(),
            file,
            docstring,
            defaults: defaulted_parameters(&func, src),
        })
    }

    fn doc_of(&self, handle: &PythonCallable) -> Option<RawDoc> {
        handle.docstring.as_ref().map(|doc| RawDoc {
            short_description: doc.short_description.clone(),
            long_description: doc.long_description.clone(),
        })
    }

    fn params_of(&self, handle: &PythonCallable) -> Vec<ParameterDoc> {
        let Some(doc) = &handle.docstring else {
            return Vec::new();
        };
        doc.params
            .iter()
            .map(|param| ParameterDoc {
                name: param.name.clone(),
                type_string: param.type_name.clone(),
                description: param.description.clone(),
                has_default: handle
                    .defaults
                    .contains(param.name.trim_matches(['"', '\'', '`'])),
                marked_optional: param.marked_optional(),
            })
            .collect()
    }
}

/// Body of the first class named `name` anywhere in the file.
fn find_class_body<'a>(root: Node<'a>, src: &[u8], name: &str) -> Option<Node<'a>> {
    let mut queue = VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        if node.kind() == "class_definition" && name_of(&node, src) == Some(name) {
            return node.child_by_field_name("body");
        }
        let mut cursor = node.walk();
        queue.extend(node.named_children(&mut cursor));
    }
    None
}

/// A function defined directly in `scope` (module or class body).
fn find_function<'a>(scope: Node<'a>, src: &[u8], name: &str) -> Option<Node<'a>> {
    let mut cursor = scope.walk();
    scope
        .named_children(&mut cursor)
        .filter_map(|stmt| definition(stmt, "function_definition"))
        .find(|func| name_of(func, src) == Some(name))
}

/// The raw text of a function's docstring, if its first statement is a string.
fn docstring_of(func: &Node, src: &[u8]) -> Option<String> {
    let body = func.child_by_field_name("body")?;
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|stmt| stmt.kind() != "comment")?;
    if first.kind() != "expression_statement" {
        return None;
    }
    let expr = first.named_child(0)?;
    string_literal_value(&expr, src).filter(|text| !text.trim().is_empty())
}

fn defaulted_parameters(func: &Node, src: &[u8]) -> HashSet<String> {
    let Some(params) = func.child_by_field_name("parameters") else {
        return HashSet::new();
    };
    let mut cursor = params.walk();
    params
        .named_children(&mut cursor)
        .filter(|p| matches!(p.kind(), "default_parameter" | "typed_default_parameter"))
        .filter_map(|p| p.child_by_field_name("name"))
        .map(|name| node_text(&name, src).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const USERS: &str = r#"
import functools


def create_user(name: str, email: str, role: str = "member", *, notify=True):
    """Create a user.

    Users start inactive.

    Args:
        name (str): Display name.
        email (str): Contact address.
        role (str): Initial role.
        notify (bool): Send a welcome mail.
    """
    return {}


def undocumented(x):
    return x


class UserApi:
    @functools.lru_cache
    async def delete(self, user_id: str, hard: bool = False):
        # comment before docstring
        """Delete a user.

        Args:
            user_id (str): Id of the user.
            hard (bool, optional): Remove permanently.
        """
"#;

    fn fixture() -> (tempfile::TempDir, PythonIntrospector) {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("crm");
        fs::create_dir_all(pkg.join("billing")).unwrap();
        fs::write(pkg.join("__init__.py"), "").unwrap();
        fs::write(pkg.join("users.py"), USERS).unwrap();
        fs::write(
            pkg.join("billing").join("__init__.py"),
            "def charge(amount):\n    \"\"\"Charge.\"\"\"\n",
        )
        .unwrap();
        let introspector = PythonIntrospector::new(dir.path());
        (dir, introspector)
    }

    #[test]
    fn test_resolve_file_prefers_longest_module() {
        let (dir, introspector) = fixture();
        assert_eq!(
            introspector.resolve_file("crm.users.create_user"),
            Some(dir.path().join("crm").join("users.py"))
        );
        assert_eq!(
            introspector.resolve_file("crm.billing.charge"),
            Some(dir.path().join("crm").join("billing").join("__init__.py"))
        );
        assert_eq!(introspector.resolve_file("nope.thing"), None);
    }

    #[test]
    fn test_module_function() {
        let (_dir, introspector) = fixture();
        let handle = introspector.resolve("crm.users.create_user").unwrap();

        let doc = introspector.doc_of(&handle).unwrap();
        assert_eq!(doc.short_description.as_deref(), Some("Create a user."));
        assert_eq!(doc.long_description.as_deref(), Some("Users start inactive."));

        let params = introspector.params_of(&handle);
        let defaults: Vec<_> = params.iter().map(|p| (p.name.as_str(), p.has_default)).collect();
        assert_eq!(
            defaults,
            [("name", false), ("email", false), ("role", true), ("notify", true)]
        );
    }

    #[test]
    fn test_decorated_async_method() {
        let (_dir, introspector) = fixture();
        let handle = introspector.resolve("crm.users.UserApi.delete").unwrap();
        let params = introspector.params_of(&handle);
        assert_eq!(params.len(), 2);
        assert!(params[1].has_default);
        assert!(params[1].marked_optional);
        assert_eq!(params[1].type_string.as_deref(), Some("bool"));
    }

    #[test]
    fn test_package_init_function() {
        let (_dir, introspector) = fixture();
        let handle = introspector.resolve("crm.billing.charge").unwrap();
        assert_eq!(
            introspector.doc_of(&handle).unwrap().short_description.as_deref(),
            Some("Charge.")
        );
    }

    #[test]
    fn test_missing_docstring_and_callable() {
        let (_dir, introspector) = fixture();
        let handle = introspector.resolve("crm.users.undocumented").unwrap();
        assert!(introspector.doc_of(&handle).is_none());
        assert!(introspector.params_of(&handle).is_empty());

        let err = introspector.resolve("crm.users.missing").unwrap_err();
        assert!(matches!(err, SchemaError::CallableNotFound { .. }));

        let err = introspector.resolve("ledger.ghost.run").unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvableLocation(_)));
    }
}
