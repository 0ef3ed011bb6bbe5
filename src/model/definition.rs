//! Asset definition documents and the `kapeta.yml` loader
//!
//! A definition file holds one or more YAML documents (or a JSON document / array). Each
//! document must carry `metadata.name`; everything else is preserved verbatim so the
//! registry sees the document as it was written.

use crate::core::error::{KapResult, ValidationError};
use crate::model::reference::split_full_name;
use crate::model::version::Attachment;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Name of the definition file inside an asset directory
pub const DEFINITION_FILE: &str = "kapeta.yml";

/// Prefix of built-in asset kinds
pub const CORE_KIND_PREFIX: &str = "core/";

/// Kind of plan assets (definition only, no artifact)
pub const PLAN_KIND: &str = "core/plan";

/// One asset document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDefinition {
  #[serde(default)]
  pub kind: String,
  pub metadata: Metadata,
  #[serde(default, skip_serializing_if = "Value::is_null")]
  pub spec: Value,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub attachments: Option<Vec<Attachment>>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
  pub name: String,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl AssetDefinition {
  /// Full `handle/name`
  pub fn name(&self) -> &str {
    &self.metadata.name
  }

  /// Handle part of `handle/name`, if the name has one
  pub fn handle(&self) -> Option<&str> {
    split_full_name(&self.metadata.name).map(|(handle, _)| handle)
  }

  /// Name part of `handle/name` (the whole name when there is no handle)
  pub fn short_name(&self) -> &str {
    split_full_name(&self.metadata.name)
      .map(|(_, name)| name)
      .unwrap_or(&self.metadata.name)
  }

  /// Merge attachments, keeping any the document already declares
  pub fn add_attachments(&mut self, attachments: &[Attachment]) {
    if attachments.is_empty() {
      return;
    }
    let existing = self.attachments.get_or_insert_with(Vec::new);
    for attachment in attachments {
      if !existing.iter().any(|a| a.filename == attachment.filename) {
        existing.push(attachment.clone());
      }
    }
  }
}

/// Is this a built-in kind (`core/...`)?
pub fn is_core_kind(kind: &str) -> bool {
  kind.to_ascii_lowercase().starts_with(CORE_KIND_PREFIX)
}

/// Load and validate every asset document in a definition file
///
/// Fails before anything else happens when the file is missing, is not a regular file,
/// or any document lacks `metadata.name`.
pub fn load_definitions(path: &Path) -> KapResult<Vec<AssetDefinition>> {
  if !path.exists() {
    return Err(ValidationError::FileNotFound { path: path.to_path_buf() }.into());
  }
  if !fs::metadata(path)?.is_file() {
    return Err(ValidationError::NotAFile { path: path.to_path_buf() }.into());
  }

  let content = fs::read_to_string(path)?;
  let documents = parse_documents(path, &content)?;
  if documents.is_empty() {
    return Err(ValidationError::Empty { path: path.to_path_buf() }.into());
  }

  let mut definitions = Vec::with_capacity(documents.len());
  let mut seen = HashSet::new();

  for (index, document) in documents.into_iter().enumerate() {
    let metadata = document
      .get("metadata")
      .filter(|m| m.is_object())
      .ok_or_else(|| ValidationError::MissingMetadata {
        path: path.to_path_buf(),
        index,
      })?;

    let has_name = metadata
      .get("name")
      .and_then(Value::as_str)
      .is_some_and(|name| !name.trim().is_empty());
    if !has_name {
      return Err(
        ValidationError::MissingName {
          path: path.to_path_buf(),
          index,
        }
        .into(),
      );
    }

    let definition: AssetDefinition = serde_json::from_value(document).map_err(|e| ValidationError::Parse {
      path: path.to_path_buf(),
      reason: e.to_string(),
    })?;

    if !seen.insert(definition.metadata.name.clone()) {
      return Err(
        ValidationError::DuplicateName {
          path: path.to_path_buf(),
          name: definition.metadata.name,
        }
        .into(),
      );
    }

    definitions.push(definition);
  }

  Ok(definitions)
}

fn parse_documents(path: &Path, content: &str) -> KapResult<Vec<Value>> {
  let parse_error = |reason: String| ValidationError::Parse {
    path: path.to_path_buf(),
    reason,
  };

  let is_json = path
    .extension()
    .and_then(|e| e.to_str())
    .is_some_and(|e| e.eq_ignore_ascii_case("json"));

  if is_json {
    let value: Value = serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?;
    return Ok(match value {
      Value::Array(items) => items,
      Value::Null => vec![],
      other => vec![other],
    });
  }

  let mut documents = Vec::new();
  for document in serde_yaml::Deserializer::from_str(content) {
    let value = Value::deserialize(document).map_err(|e| parse_error(e.to_string()))?;
    if value.is_null() {
      continue;
    }
    documents.push(value);
  }
  Ok(documents)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::error::KapError;

  fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
  }

  #[test]
  fn test_load_multi_document_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
      dir.path(),
      DEFINITION_FILE,
      "kind: core/block-type\nmetadata:\n  name: acme/x\n  title: X\nspec:\n  a: 1\n---\nkind: core/block-type\nmetadata:\n  name: acme/y\n",
    );

    let defs = load_definitions(&path).unwrap();
    assert_eq!(defs.len(), 2);
    assert_eq!(defs[0].name(), "acme/x");
    assert_eq!(defs[0].short_name(), "x");
    assert_eq!(defs[0].handle(), Some("acme"));
    assert_eq!(defs[0].metadata.extra.get("title"), Some(&Value::from("X")));
    assert_eq!(defs[1].spec, Value::Null);
  }

  #[test]
  fn test_load_json_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
      dir.path(),
      "assets.json",
      r#"[{"kind":"core/plan","metadata":{"name":"acme/p"},"spec":{}}]"#,
    );
    let defs = load_definitions(&path).unwrap();
    assert_eq!(defs[0].kind, "core/plan");
  }

  #[test]
  fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_definitions(&dir.path().join(DEFINITION_FILE)).unwrap_err();
    assert!(matches!(err, KapError::Validation(ValidationError::FileNotFound { .. })));
  }

  #[test]
  fn test_directory_is_not_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_definitions(dir.path()).unwrap_err();
    assert!(matches!(err, KapError::Validation(ValidationError::NotAFile { .. })));
  }

  #[test]
  fn test_missing_metadata_and_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "a.yml", "kind: core/plan\nspec: {}\n");
    assert!(matches!(
      load_definitions(&path).unwrap_err(),
      KapError::Validation(ValidationError::MissingMetadata { index: 0, .. })
    ));

    let path = write(
      dir.path(),
      "b.yml",
      "kind: core/plan\nmetadata:\n  name: acme/a\n---\nkind: core/plan\nmetadata:\n  title: nameless\n",
    );
    assert!(matches!(
      load_definitions(&path).unwrap_err(),
      KapError::Validation(ValidationError::MissingName { index: 1, .. })
    ));
  }

  #[test]
  fn test_duplicate_names_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
      dir.path(),
      "dup.yml",
      "kind: core/plan\nmetadata:\n  name: acme/a\n---\nkind: core/plan\nmetadata:\n  name: acme/a\n",
    );
    assert!(matches!(
      load_definitions(&path).unwrap_err(),
      KapError::Validation(ValidationError::DuplicateName { .. })
    ));
  }

  #[test]
  fn test_empty_documents_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "e.yml", "---\n---\n");
    assert!(matches!(
      load_definitions(&path).unwrap_err(),
      KapError::Validation(ValidationError::Empty { .. })
    ));
  }

  #[test]
  fn test_unknown_fields_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
      dir.path(),
      DEFINITION_FILE,
      "kind: core/plan\napiVersion: v2\nmetadata:\n  name: acme/p\n",
    );
    let defs = load_definitions(&path).unwrap();
    let json = serde_json::to_value(&defs[0]).unwrap();
    assert_eq!(json["apiVersion"], "v2");
    assert!(json.get("attachments").is_none());
  }

  #[test]
  fn test_core_kind_detection() {
    assert!(is_core_kind("core/plan"));
    assert!(is_core_kind("CORE/block-type"));
    assert!(!is_core_kind("acme/block-type-service:1.0.0"));
  }
}
