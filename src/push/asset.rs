//! Loading an asset directory: definitions, effective kind, readme and attachments

use crate::core::error::{KapResult, ResultExt, ValidationError};
use crate::model::definition::is_core_kind;
use crate::model::{
  AssetDefinition, Attachment, AttachmentContent, DEFINITION_FILE, ParsedReference, Readme, ReadmeType,
  load_definitions,
};
use crate::registry::{RegistryClient, fetch_reference};
use std::fs;
use std::path::{Path, PathBuf};

/// Kinds may point at other kinds; give up after this many hops
pub const MAX_KIND_HOPS: usize = 8;

const README_FILES: [(&str, ReadmeType); 3] = [
  ("README.md", ReadmeType::Markdown),
  ("README.txt", ReadmeType::Text),
  ("README", ReadmeType::Text),
];

const ATTACHMENT_FILES: [&str; 4] = [".env.example", ".env.defaults", "kapeta.config.yml", "kapeta.config.yaml"];

/// A validated asset directory
#[derive(Debug, Clone)]
pub struct LocalAsset {
  pub dir: PathBuf,
  pub definition_file: PathBuf,
  pub definitions: Vec<AssetDefinition>,
}

impl LocalAsset {
  /// Load from a directory (using its `kapeta.yml`) or from a definition file
  pub fn load(path: &Path) -> KapResult<Self> {
    let (dir, definition_file) = asset_paths(path);
    let definitions = load_definitions(&definition_file)?;
    Ok(Self {
      dir,
      definition_file,
      definitions,
    })
  }

  /// Nominal kind, taken from the first document
  pub fn kind(&self) -> &str {
    self.definitions.first().map(|d| d.kind.as_str()).unwrap_or_default()
  }

  pub fn names(&self) -> Vec<&str> {
    self.definitions.iter().map(AssetDefinition::name).collect()
  }
}

/// Split a push target into (asset directory, definition file)
///
/// The directory is canonicalized when it exists so the same asset reached through
/// different paths is recognized.
pub fn asset_paths(path: &Path) -> (PathBuf, PathBuf) {
  let (dir, file) = if path.is_dir() {
    (path.to_path_buf(), path.join(DEFINITION_FILE))
  } else {
    let dir = path
      .parent()
      .filter(|p| !p.as_os_str().is_empty())
      .unwrap_or_else(|| Path::new("."));
    (dir.to_path_buf(), path.to_path_buf())
  };

  match fs::canonicalize(&dir) {
    Ok(canonical) => {
      let file_name = file.file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFINITION_FILE));
      let definition_file = canonical.join(file_name);
      (canonical, definition_file)
    }
    Err(_) => (dir, file),
  }
}

/// Follow kind indirection until a built-in `core/` kind is reached
pub fn resolve_kind(registry: &dyn RegistryClient, kind: &str) -> KapResult<String> {
  let mut current = kind.to_string();

  for _ in 0..=MAX_KIND_HOPS {
    if is_core_kind(&current) {
      return Ok(current);
    }
    if current.trim().is_empty() {
      return Err(unknown_kind(kind, "the definition has no kind"));
    }

    let reference = ParsedReference::parse(&current)?;
    let version = fetch_reference(registry, &reference)?
      .ok_or_else(|| unknown_kind(kind, &format!("{} was not found in the registry", reference)))?;

    tracing::debug!(from = %current, to = %version.content.kind, "following kind reference");
    current = version.content.kind;
  }

  Err(unknown_kind(
    kind,
    &format!("kind references nest deeper than {} levels", MAX_KIND_HOPS),
  ))
}

fn unknown_kind(kind: &str, reason: &str) -> crate::core::error::KapError {
  ValidationError::UnknownKind {
    kind: kind.to_string(),
    reason: reason.to_string(),
  }
  .into()
}

/// First README found in the asset directory
pub fn read_readme(dir: &Path) -> KapResult<Option<Readme>> {
  for (file, readme_type) in README_FILES {
    let path = dir.join(file);
    if path.is_file() {
      let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
      return Ok(Some(Readme { readme_type, content }));
    }
  }
  Ok(None)
}

/// Configuration templates shipped with the asset definition
pub fn collect_attachments(dir: &Path) -> KapResult<Vec<Attachment>> {
  let mut attachments = Vec::new();
  for file in ATTACHMENT_FILES {
    let path = dir.join(file);
    if !path.is_file() {
      continue;
    }
    let value = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    attachments.push(Attachment {
      filename: file.to_string(),
      content_type: content_type(file).to_string(),
      content: AttachmentContent {
        format: "utf8".to_string(),
        value,
      },
    });
  }
  Ok(attachments)
}

fn content_type(file: &str) -> &'static str {
  if file.ends_with(".yml") || file.ends_with(".yaml") {
    "application/yaml"
  } else {
    "text/plain"
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::push::testing::{FakeRegistry, definition};

  #[test]
  fn test_asset_paths_from_file_and_dir() {
    let dir = tempfile::tempdir().unwrap();
    let canonical = fs::canonicalize(dir.path()).unwrap();

    let (asset_dir, file) = asset_paths(dir.path());
    assert_eq!(asset_dir, canonical);
    assert_eq!(file, canonical.join(DEFINITION_FILE));

    let (asset_dir, file) = asset_paths(&dir.path().join("other.yml"));
    assert_eq!(asset_dir, canonical);
    assert_eq!(file, canonical.join("other.yml"));
  }

  #[test]
  fn test_core_kind_needs_no_lookup() {
    let registry = FakeRegistry::default();
    assert_eq!(resolve_kind(&registry, "core/block-type").unwrap(), "core/block-type");
    assert!(registry.calls().is_empty());
  }

  #[test]
  fn test_kind_indirection_is_followed() {
    let registry = FakeRegistry::default();
    registry.publish("acme/java-service", "latest", definition("acme/java-service", "core/block-type-operator"));
    registry.publish("acme/service", "1.0.0", definition("acme/service", "acme/java-service"));

    assert_eq!(
      resolve_kind(&registry, "acme/service:1.0.0").unwrap(),
      "core/block-type-operator"
    );
  }

  #[test]
  fn test_kind_indirection_is_bounded() {
    let registry = FakeRegistry::default();
    registry.publish("acme/loop", "latest", definition("acme/loop", "acme/loop"));
    let err = resolve_kind(&registry, "acme/loop").unwrap_err();
    assert!(err.to_string().contains("acme/loop"));
  }

  #[test]
  fn test_missing_kind_is_validation_error() {
    let registry = FakeRegistry::default();
    let err = resolve_kind(&registry, "acme/nothing:2.0.0").unwrap_err();
    assert!(matches!(err, crate::core::error::KapError::Validation(_)));
  }

  #[test]
  fn test_readme_preference_and_attachments() {
    let dir = tempfile::tempdir().unwrap();
    assert!(read_readme(dir.path()).unwrap().is_none());

    fs::write(dir.path().join("README"), "plain").unwrap();
    fs::write(dir.path().join("README.md"), "# md").unwrap();
    let readme = read_readme(dir.path()).unwrap().unwrap();
    assert_eq!(readme.readme_type, ReadmeType::Markdown);
    assert_eq!(readme.content, "# md");

    fs::write(dir.path().join(".env.example"), "PORT=80").unwrap();
    fs::write(dir.path().join("kapeta.config.yml"), "a: 1").unwrap();
    let attachments = collect_attachments(dir.path()).unwrap();
    let names: Vec<_> = attachments.iter().map(|a| a.filename.as_str()).collect();
    assert_eq!(names, vec![".env.example", "kapeta.config.yml"]);
    assert_eq!(attachments[1].content_type, "application/yaml");
    assert_eq!(attachments[0].content.format, "utf8");
  }
}
