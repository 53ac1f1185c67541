//! Package directory -> schema artifact(s).
//!
//! A package is a directory with an `__init__.py` declaring the manifest.
//! Depending on its [`DocMode`] the artifact is compiled from source or
//! copied from `SimulationEngine/alternate_fcds/`. Directories under
//! `mutations/` are compiled as variants into a sibling `MutationSchemas/`
//! tree.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::DocMode;
use crate::driver::compile_package;
use crate::error::{Result, SchemaError};
use crate::introspect::PythonIntrospector;
use crate::manifest::load_manifest;
use crate::types::FunctionSchema;

pub const MUTATIONS_DIR: &str = "mutations";
pub const MUTATION_SCHEMAS_DIR: &str = "MutationSchemas";

#[derive(Debug, Clone, Default)]
pub struct PackageOptions {
    pub doc_mode: DocMode,
    /// Directory dotted locations resolve against. Defaults to the package's
    /// parent directory.
    pub source_root: Option<PathBuf>,
    /// Overrides the artifact file name derived from the doc mode.
    pub output_file_name: Option<String>,
}

/// Generate the artifact for one package and its mutation variants.
///
/// Returns every file written. A package that compiles to no functions
/// writes nothing, not even its mutation variants.
pub fn generate_package(
    package_dir: &Path,
    output_dir: &Path,
    options: &PackageOptions,
) -> Result<Vec<PathBuf>> {
    let package_dir =
        std::path::absolute(package_dir).map_err(|e| SchemaError::io(package_dir, e))?;
    let output_dir =
        std::path::absolute(output_dir).map_err(|e| SchemaError::io(output_dir, e))?;
    let package = package_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| {
            SchemaError::Other(format!("not a package directory: {}", package_dir.display()))
        })?;

    let init_path = package_dir.join("__init__.py");
    if !init_path.is_file() {
        return Err(SchemaError::PackageInitMissing(package_dir));
    }

    let source_root = match &options.source_root {
        Some(root) => root.clone(),
        None => package_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    let artifact_name = options.doc_mode.artifact_name(&package);
    let output_file =
        output_dir.join(options.output_file_name.as_deref().unwrap_or(&artifact_name));

    let mut written = Vec::new();
    match options.doc_mode {
        DocMode::RawDocstring => {
            let manifest = load_manifest(&init_path)?
                .filter(|manifest| !manifest.is_empty())
                .ok_or_else(|| SchemaError::ManifestMissing(init_path.clone()))?;

            tracing::debug!(
                %package,
                functions = manifest.len(),
                root = %source_root.display(),
                "compiling package"
            );
            let introspector = PythonIntrospector::new(&source_root);
            let schemas = compile_package(&manifest, &introspector);

            if schemas.is_empty() {
                tracing::warn!(%package, "no schemas were generated, skipping mutations");
                return Ok(written);
            }
            write_artifact(&output_file, &schemas)?;
            tracing::info!(
                %package,
                functions = schemas.len(),
                path = %output_file.display(),
                "wrote schema"
            );
            written.push(output_file);
        }
        mode => {
            let alternate = package_dir
                .join("SimulationEngine")
                .join("alternate_fcds")
                .join(&artifact_name);
            if !alternate.is_file() {
                return Err(SchemaError::AlternateSchemaMissing {
                    mode: mode.to_string(),
                    package,
                    expected: alternate,
                });
            }
            create_parent(&output_file)?;
            fs::copy(&alternate, &output_file).map_err(|e| SchemaError::io(&alternate, e))?;
            tracing::info!(%package, %mode, path = %output_file.display(), "copied schema");
            written.push(output_file);
        }
    }

    let file_name = options.output_file_name.clone().unwrap_or(artifact_name);
    for mutation_dir in mutation_dirs(&package_dir)? {
        let mutation = mutation_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let target = output_dir
            .parent()
            .unwrap_or(&output_dir)
            .join(MUTATION_SCHEMAS_DIR)
            .join(&mutation);
        let variant = PackageOptions {
            doc_mode: DocMode::RawDocstring,
            source_root: Some(source_root.clone()),
            output_file_name: Some(file_name.clone()),
        };

        tracing::info!(%package, %mutation, "processing mutation");
        match generate_package(&mutation_dir, &target, &variant) {
            Ok(files) => written.extend(files),
            Err(e) => tracing::warn!(%package, %mutation, error = %e, "mutation failed"),
        }
    }

    Ok(written)
}

/// Mutation variant directories of a package, sorted by name.
fn mutation_dirs(package_dir: &Path) -> Result<Vec<PathBuf>> {
    let root = package_dir.join(MUTATIONS_DIR);
    if !root.is_dir() {
        return Ok(Vec::new());
    }
    let mut dirs: Vec<PathBuf> = fs::read_dir(&root)
        .map_err(|e| SchemaError::io(&root, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir() && !is_ignored_dir(path))
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// `__pycache__` and hidden directories are never packages.
pub(crate) fn is_ignored_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_none_or(|name| name == "__pycache__" || name.starts_with('.'))
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SchemaError::io(parent, e))?;
    }
    Ok(())
}

/// Write `schemas` as pretty-printed JSON.
pub fn write_artifact(path: &Path, schemas: &[FunctionSchema]) -> Result<()> {
    create_parent(path)?;
    let json = serde_json::to_string_pretty(schemas)?;
    fs::write(path, json).map_err(|e| SchemaError::io(path, e))
}
