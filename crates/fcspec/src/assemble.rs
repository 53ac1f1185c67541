//! Function schema assembly.

use crate::grammar::{is_optional, map_type, strip_outer_parens};
use crate::properties::parse_object_properties;
use crate::types::{FunctionSchema, ObjectShape, ParameterDoc, SchemaKind, SchemaNode, clean_description};

/// Remove one pair of matching quotes around a parameter name.
fn clean_name(name: &str) -> &str {
    let name = name.trim();
    if name.len() < 2 {
        return name;
    }
    ['"', '\'', '`']
        .into_iter()
        .find_map(|q| name.strip_prefix(q).and_then(|rest| rest.strip_suffix(q)))
        .map(str::trim)
        .unwrap_or(name)
}

/// Schema node for one documented parameter.
///
/// Object and array-of-object parameters have their description mined for
/// nested properties; everything else keeps its cleaned description.
pub fn parameter_schema(param: &ParameterDoc) -> SchemaNode {
    let type_string = param.type_string.as_deref().map(strip_outer_parens);
    let mut node = map_type(type_string);

    if node.can_host_properties() {
        let (leftover, nested) = parse_object_properties(&param.description);
        node.set_description(leftover);
        if let Some(nested) = nested
            && let Some(host) = node.host_mut()
        {
            host.absorb(nested);
        }
    } else {
        node.set_description(clean_description(&param.description));
    }
    node
}

/// Whether the parameter must appear in `required`.
pub fn parameter_required(param: &ParameterDoc) -> bool {
    let type_string = param.type_string.as_deref().map(strip_outer_parens);
    !(param.has_default || param.marked_optional || is_optional(type_string))
}

/// Assemble the schema of one function from its documentation.
pub fn build_schema(
    public_name: &str,
    short_description: Option<&str>,
    long_description: Option<&str>,
    params: &[ParameterDoc],
) -> FunctionSchema {
    let description = [short_description, long_description]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut shape = ObjectShape::default();
    for param in params {
        let name = clean_name(&param.name);
        shape.insert(name, parameter_schema(param), parameter_required(param));
    }

    FunctionSchema {
        name: public_name.to_string(),
        description: description.trim().to_string(),
        parameters: SchemaNode::new(SchemaKind::Object(shape)),
    }
}
