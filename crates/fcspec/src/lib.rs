pub mod assemble;
pub mod batch;
pub mod config;
pub mod docstring;
pub mod driver;
pub mod error;
pub mod grammar;
pub mod introspect;
pub mod manifest;
pub mod package;
pub mod properties;
mod python;
pub mod types;

pub use crate::batch::{BatchOptions, BatchReport, compile_all};
pub use crate::config::{Config, DocMode};
pub use crate::driver::{compile_function, compile_package};
pub use crate::error::SchemaError;
pub use crate::introspect::{PythonIntrospector, SourceIntrospector};
pub use crate::package::{PackageOptions, generate_package};
pub use crate::types::{FunctionSchema, SchemaNode};

/// High-level API: compile one package directory into `output_dir`.
///
/// `package_dir`: directory holding `__init__.py` with the `_function_map` table
/// `output_dir`: where `<package>.json` is written
pub fn generate_schema(
    package_dir: &std::path::Path,
    output_dir: &std::path::Path,
) -> Result<Vec<std::path::PathBuf>, SchemaError> {
    generate_package(package_dir, output_dir, &PackageOptions::default())
}
