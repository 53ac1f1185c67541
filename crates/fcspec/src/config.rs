//! Documentation modes and the optional JSON configuration that selects them.
//!
//! ```json
//! {
//!   "documentation": {
//!     "global": {"doc_mode": "concise"},
//!     "services": {"crm": {"doc_mode": "raw_docstring"}}
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};

/// Where a package's schema comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocMode {
    /// Compile from the package's docstrings.
    #[default]
    RawDocstring,
    /// Copy a pre-generated concise artifact.
    Concise,
    /// Copy a pre-generated medium-detail artifact.
    MediumDetail,
}

impl DocMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DocMode::RawDocstring => "raw_docstring",
            DocMode::Concise => "concise",
            DocMode::MediumDetail => "medium_detail",
        }
    }

    /// Artifact file name for `package` in this mode.
    pub fn artifact_name(self, package: &str) -> String {
        match self {
            DocMode::RawDocstring => format!("{package}.json"),
            DocMode::Concise => format!("concise_{package}.json"),
            DocMode::MediumDetail => format!("medium_detail_{package}.json"),
        }
    }
}

impl fmt::Display for DocMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocMode {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "raw_docstring" => Ok(DocMode::RawDocstring),
            "concise" => Ok(DocMode::Concise),
            "medium_detail" => Ok(DocMode::MediumDetail),
            other => Err(SchemaError::Config(format!(
                "invalid doc mode '{other}', expected raw_docstring, concise or medium_detail"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSetting {
    pub doc_mode: DocMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentationConfig {
    #[serde(default)]
    pub global: Option<ModeSetting>,
    #[serde(default)]
    pub services: HashMap<String, ModeSetting>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub documentation: Option<DocumentationConfig>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SchemaError::io(path, e))?;
        serde_json::from_str(&text)
            .map_err(|e| SchemaError::Config(format!("{}: {e}", path.display())))
    }

    /// Mode for `package`: its service override, else the global mode, else
    /// [`DocMode::RawDocstring`].
    pub fn doc_mode_for(&self, package: &str) -> DocMode {
        let Some(docs) = &self.documentation else {
            return DocMode::default();
        };
        docs.services
            .get(package)
            .or(docs.global.as_ref())
            .map(|setting| setting.doc_mode)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_names() {
        assert_eq!(DocMode::RawDocstring.artifact_name("crm"), "crm.json");
        assert_eq!(DocMode::Concise.artifact_name("crm"), "concise_crm.json");
        assert_eq!(DocMode::MediumDetail.artifact_name("crm"), "medium_detail_crm.json");
    }

    #[test]
    fn test_parse_doc_mode() {
        assert_eq!("concise".parse::<DocMode>().unwrap(), DocMode::Concise);
        assert_eq!(DocMode::MediumDetail.to_string(), "medium_detail");
        assert!(matches!("verbose".parse::<DocMode>(), Err(SchemaError::Config(_))));
    }

    #[test]
    fn test_resolution_order() {
        let config: Config = serde_json::from_str(
            r#"{
                "documentation": {
                    "global": {"doc_mode": "concise"},
                    "services": {"crm": {"doc_mode": "medium_detail"}}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.doc_mode_for("crm"), DocMode::MediumDetail);
        assert_eq!(config.doc_mode_for("billing"), DocMode::Concise);
        assert_eq!(Config::default().doc_mode_for("crm"), DocMode::RawDocstring);
    }

    #[test]
    fn test_services_without_global() {
        let config: Config =
            serde_json::from_str(r#"{"documentation": {"services": {"crm": {"doc_mode": "concise"}}}}"#)
                .unwrap();
        assert_eq!(config.doc_mode_for("crm"), DocMode::Concise);
        assert_eq!(config.doc_mode_for("other"), DocMode::RawDocstring);
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let err = serde_json::from_str::<Config>(
            r#"{"documentation": {"global": {"doc_mode": "verbose"}}}"#,
        );
        assert!(err.is_err());
    }
}
