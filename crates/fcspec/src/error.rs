use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse Python source: {0}")]
    ParseError(String),

    #[error("could not resolve a source file for '{0}'")]
    UnresolvableLocation(String),

    #[error("callable '{name}' not found in {file}")]
    CallableNotFound { name: String, file: PathBuf },

    #[error("no documentation found for '{0}'")]
    MissingDocumentation(String),

    #[error("__init__.py not found in package {0}")]
    PackageInitMissing(PathBuf),

    #[error("no literal _function_map table in {0}")]
    ManifestMissing(PathBuf),

    #[error("{mode} schema does not exist for {package} (expected {expected})")]
    AlternateSchemaMissing {
        mode: String,
        package: String,
        expected: PathBuf,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl SchemaError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;
