//! Schema data model.
//!
//! A `SchemaNode` is the JSON-Schema-shaped fragment produced for one type.
//! Serialization is hand-written so that every node emits `description`
//! first, then `type`, then the kind-specific keys (`items`, or `properties`
//! followed by `required`). Downstream tool-calling consumers read the
//! artifacts in that order.

use indexmap::{IndexMap, IndexSet};
use serde::ser::{Serialize, SerializeMap, Serializer};

// ---------------------------------------------------------------------------
// Schema nodes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaKind {
    String,
    Integer,
    Number,
    Boolean,
    Null,
    /// `items: None` is the unconstrained item schema, serialised as `{}`.
    Array { items: Option<Box<SchemaNode>> },
    Object(ObjectShape),
}

/// Properties and required names of an object node.
///
/// Both are always serialised, even when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectShape {
    pub properties: IndexMap<String, SchemaNode>,
    pub required: IndexSet<String>,
}

impl ObjectShape {
    /// Insert (or replace in place) a property, marking it required if asked.
    pub fn insert(&mut self, name: impl Into<String>, node: SchemaNode, required: bool) {
        let name = name.into();
        if required {
            self.required.insert(name.clone());
        }
        self.properties.insert(name, node);
    }

    /// Replace the properties with `other`'s, and the required set too when
    /// `other` names any required fields.
    pub fn absorb(&mut self, other: ObjectShape) {
        self.properties = other.properties;
        if !other.required.is_empty() {
            self.required = other.required;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNode {
    pub description: Option<String>,
    pub kind: SchemaKind,
}

impl SchemaNode {
    pub fn new(kind: SchemaKind) -> Self {
        Self {
            description: None,
            kind,
        }
    }

    pub fn string() -> Self {
        Self::new(SchemaKind::String)
    }

    pub fn integer() -> Self {
        Self::new(SchemaKind::Integer)
    }

    pub fn number() -> Self {
        Self::new(SchemaKind::Number)
    }

    pub fn boolean() -> Self {
        Self::new(SchemaKind::Boolean)
    }

    pub fn null() -> Self {
        Self::new(SchemaKind::Null)
    }

    /// `{type: object, properties: {}, required: []}`, the universal fallback.
    pub fn object_shell() -> Self {
        Self::new(SchemaKind::Object(ObjectShape::default()))
    }

    pub fn array(items: Option<SchemaNode>) -> Self {
        Self::new(SchemaKind::Array {
            items: items.map(Box::new),
        })
    }

    /// The JSON Schema `type` keyword for this node.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            SchemaKind::String => "string",
            SchemaKind::Integer => "integer",
            SchemaKind::Number => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Null => "null",
            SchemaKind::Array { .. } => "array",
            SchemaKind::Object(_) => "object",
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, SchemaKind::Object(_))
    }

    pub fn is_array_of_object(&self) -> bool {
        matches!(&self.kind, SchemaKind::Array { items: Some(items) } if items.is_object())
    }

    /// Object nodes and arrays of objects may carry nested properties.
    pub fn can_host_properties(&self) -> bool {
        self.is_object() || self.is_array_of_object()
    }

    /// The object shape nested properties belong in: the node itself for an
    /// object, its `items` for an array of objects.
    pub fn host_mut(&mut self) -> Option<&mut ObjectShape> {
        match &mut self.kind {
            SchemaKind::Object(shape) => Some(shape),
            SchemaKind::Array { items: Some(items) } => match &mut items.kind {
                SchemaKind::Object(shape) => Some(shape),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn items(&self) -> Option<&SchemaNode> {
        match &self.kind {
            SchemaKind::Array { items } => items.as_deref(),
            _ => None,
        }
    }

    pub fn object(&self) -> Option<&ObjectShape> {
        match &self.kind {
            SchemaKind::Object(shape) => Some(shape),
            _ => None,
        }
    }

    /// Attach a description; empty text leaves the node without one.
    pub fn set_description(&mut self, description: impl Into<String>) {
        let description = description.into();
        self.description = if description.is_empty() {
            None
        } else {
            Some(description)
        };
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.set_description(description);
        self
    }
}

impl Serialize for SchemaNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if let Some(description) = &self.description {
            map.serialize_entry("description", description)?;
        }
        map.serialize_entry("type", self.type_name())?;
        match &self.kind {
            SchemaKind::Array { items } => match items {
                Some(items) => map.serialize_entry("items", items)?,
                None => map.serialize_entry("items", &serde_json::Map::new())?,
            },
            SchemaKind::Object(shape) => {
                map.serialize_entry("properties", &shape.properties)?;
                map.serialize_entry("required", &shape.required)?;
            }
            _ => {}
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Compiler inputs and outputs
// ---------------------------------------------------------------------------

/// One documented parameter of a callable, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterDoc {
    pub name: String,
    /// Raw type annotation text, e.g. `Optional[List[Dict[str, Any]]]`.
    pub type_string: Option<String>,
    /// Raw, possibly multi-line documentation text.
    pub description: String,
    /// The signature declares a default value.
    pub has_default: bool,
    /// The documentation itself marks the parameter optional
    /// (`(str, optional)`, `Defaults to ...`).
    pub marked_optional: bool,
}

/// Function-level documentation as read from source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDoc {
    pub short_description: Option<String>,
    pub long_description: Option<String>,
}

/// The compiled schema for one public function.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct FunctionSchema {
    pub name: String,
    pub description: String,
    pub parameters: SchemaNode,
}

/// Whitespace-normalise description text: each line trimmed, blank lines
/// dropped, the rest joined with `\n`.
pub fn clean_description(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
