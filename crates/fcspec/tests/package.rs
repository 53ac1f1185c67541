use std::fs;
use std::path::{Path, PathBuf};

use fcspec::{BatchOptions, PackageOptions, SchemaError, compile_all, generate_package};

const CONTACTS: &str = r#"
def create_contact(name: str, tags: list = None):
    """Create a contact.

    Args:
        name (str): Full name.
        tags (List[str], optional): Labels.
    """
    return {}


def archive(contact_id):
    """Archive a contact.

    Args:
        contact_id (str): Contact to archive.
    """
"#;

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// `<tmp>/APIs/crm` with two valid entries and one that resolves to nothing.
fn crm_package(root: &Path) -> PathBuf {
    let pkg = root.join("APIs").join("crm");
    write(
        &pkg.join("__init__.py"),
        r#"
from .contacts import create_contact, archive

_function_map = {
    "create_contact": "crm.contacts.create_contact",
    "broken": "crm.contacts.does_not_exist",
    "archive_contact": "crm.contacts.archive",
}
"#,
    );
    write(&pkg.join("contacts.py"), CONTACTS);
    pkg
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_unresolvable_entry_is_skipped_and_output_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let pkg = crm_package(dir.path());
    let out = dir.path().join("Schemas");

    let written = generate_package(&pkg, &out, &PackageOptions::default()).unwrap();
    assert_eq!(written, [out.join("crm.json")]);

    let artifact = read_json(&written[0]);
    let names: Vec<_> = artifact
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["archive_contact", "create_contact"]);
}

#[test]
fn test_artifact_shape() {
    let dir = tempfile::tempdir().unwrap();
    let pkg = crm_package(dir.path());
    let out = dir.path().join("Schemas");
    generate_package(&pkg, &out, &PackageOptions::default()).unwrap();

    let artifact = read_json(&out.join("crm.json"));
    insta::assert_json_snapshot!(artifact[1], @r#"
    {
      "name": "create_contact",
      "description": "Create a contact.",
      "parameters": {
        "type": "object",
        "properties": {
          "name": {
            "description": "Full name.",
            "type": "string"
          },
          "tags": {
            "description": "Labels.",
            "type": "array",
            "items": {
              "type": "string"
            }
          }
        },
        "required": [
          "name"
        ]
      }
    }
    "#);
}

#[test]
fn test_mutation_variant_is_written_beside_output() {
    let dir = tempfile::tempdir().unwrap();
    let pkg = crm_package(dir.path());
    let mutation = pkg.join("mutations").join("terse");
    write(
        &mutation.join("__init__.py"),
        r#"_function_map = {"add_contact": "crm.mutations.terse.api.add"}"#,
    );
    write(
        &mutation.join("api.py"),
        "def add(name):\n    \"\"\"Add a contact.\n\n    Args:\n        name (str): Name.\n    \"\"\"\n",
    );
    fs::create_dir_all(pkg.join("mutations").join("__pycache__")).unwrap();

    let out = dir.path().join("Schemas");
    let written = generate_package(&pkg, &out, &PackageOptions::default()).unwrap();

    let variant = dir
        .path()
        .join("MutationSchemas")
        .join("terse")
        .join("crm.json");
    assert_eq!(written, [out.join("crm.json"), variant.clone()]);
    let artifact = read_json(&variant);
    assert_eq!(artifact[0]["name"], "add_contact");
    assert_eq!(artifact[0]["parameters"]["required"], serde_json::json!(["name"]));
}

#[test]
fn test_package_without_compilable_functions_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let pkg = dir.path().join("APIs").join("ghost");
    write(
        &pkg.join("__init__.py"),
        r#"_function_map = {"run": "ghost.engine.run"}"#,
    );
    let out = dir.path().join("Schemas");

    let written = generate_package(&pkg, &out, &PackageOptions::default()).unwrap();
    assert!(written.is_empty());
    assert!(!out.join("ghost.json").exists());
}

#[tokio::test]
async fn test_batch_isolates_failures_and_runs_deferred_last() {
    let dir = tempfile::tempdir().unwrap();
    crm_package(dir.path());
    let apis = dir.path().join("APIs");
    fs::create_dir_all(apis.join("billing")).unwrap();
    write(
        &apis.join("notes").join("__init__.py"),
        r#"_function_map = {"archive": "crm.contacts.archive"}"#,
    );

    let options = BatchOptions {
        source_dir: apis,
        output_dir: dir.path().join("Schemas"),
        deferred: Some("crm".into()),
        jobs: 2,
        ..Default::default()
    };
    let report = compile_all(options).await.unwrap();

    let order: Vec<_> = report.outcomes.iter().map(|o| o.package.as_str()).collect();
    assert_eq!(order, ["billing", "notes", "crm"]);
    assert!(!report.is_success());

    let failed: Vec<_> = report.failures().map(|o| o.package.as_str()).collect();
    assert_eq!(failed, ["billing"]);
    assert!(dir.path().join("Schemas").join("crm.json").is_file());
    assert!(dir.path().join("Schemas").join("notes.json").is_file());
}

#[test]
fn test_missing_package_dir_reports_init() {
    let dir = tempfile::tempdir().unwrap();
    let err = fcspec::generate_schema(&dir.path().join("absent"), &dir.path().join("Schemas"))
        .unwrap_err();
    assert!(matches!(err, SchemaError::PackageInitMissing(_)));
}
