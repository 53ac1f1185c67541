//! Per-package compilation over a manifest.

use rayon::prelude::*;

use crate::assemble::build_schema;
use crate::error::{Result, SchemaError};
use crate::introspect::SourceIntrospector;
use crate::manifest::Manifest;
use crate::types::FunctionSchema;

/// Compile the schema of the callable at `location`, published as `public_name`.
pub fn compile_function<I: SourceIntrospector>(
    public_name: &str,
    location: &str,
    introspector: &I,
) -> Result<FunctionSchema> {
    let handle = introspector.resolve(location)?;
    let doc = introspector
        .doc_of(&handle)
        .ok_or_else(|| SchemaError::MissingDocumentation(location.to_string()))?;
    let params = introspector.params_of(&handle);

    Ok(build_schema(
        public_name,
        doc.short_description.as_deref(),
        doc.long_description.as_deref(),
        &params,
    ))
}

/// Compile every manifest entry, skipping the ones that fail.
///
/// Entries are compiled in parallel; the result is sorted by name so it does
/// not depend on scheduling.
pub fn compile_package<I: SourceIntrospector>(
    manifest: &Manifest,
    introspector: &I,
) -> Vec<FunctionSchema> {
    let mut schemas: Vec<FunctionSchema> = manifest
        .par_iter()
        .filter_map(|(public_name, location)| {
            match compile_function(public_name, location, introspector) {
                Ok(schema) => Some(schema),
                Err(e) => {
                    tracing::warn!(function = %public_name, %location, error = %e, "skipping function");
                    None
                }
            }
        })
        .collect();

    schemas.sort_by(|a, b| a.name.cmp(&b.name));
    schemas
}
