//! Artifact backends
//!
//! One backend per packaging ecosystem. The publish pipeline only talks to the
//! [`ArtifactHandler`] trait; [`BackendRegistry`] picks the backend for an asset from a
//! fixed-priority list of `(predicate, factory)` pairs.
//!
//! Selection order:
//! 1. kind `core/plan` → definition only
//! 2. `Dockerfile` → Docker
//! 3. `pom.xml` → Maven
//! 4. `package.json` → npm

pub mod checksum;
pub mod command;
pub mod definition;
pub mod docker;
pub mod maven;
pub mod npm;

pub use definition::DefinitionBackend;
pub use docker::DockerBackend;
pub use maven::MavenBackend;
pub use npm::NpmBackend;

use crate::core::error::{KapResult, ValidationError};
use crate::model::Artifact;
use crate::model::definition::PLAN_KIND;
use std::path::{Path, PathBuf};

/// Operations the publish pipeline needs from a packaging backend
pub trait ArtifactHandler {
  /// Short backend name for logs
  fn name(&self) -> &'static str;

  /// Check that the toolchain is installed and usable
  fn verify(&self) -> KapResult<()>;

  fn calculate_checksum(&self) -> KapResult<String>;

  fn build(&self) -> KapResult<()>;

  fn test(&self) -> KapResult<()>;

  /// Package and upload `name` (`handle/name`) as `version`
  fn push(&self, name: &str, version: &str, commit: Option<&str>) -> KapResult<Artifact>;
}

/// Picks the backend for an asset directory
pub trait BackendResolver {
  fn resolve(&self, target: &BackendTarget<'_>) -> KapResult<Box<dyn ArtifactHandler>>;
}

/// What a backend is selected for
#[derive(Debug, Clone, Copy)]
pub struct BackendTarget<'a> {
  /// Resolved (`core/...`) kind
  pub kind: &'a str,
  /// Asset directory
  pub dir: &'a Path,
  /// Definition file inside `dir`
  pub definition_file: &'a Path,
  /// Name of the first asset in the definition file
  pub asset_name: &'a str,
}

/// Tagged backend variants
pub enum ArtifactBackend {
  Definition(DefinitionBackend),
  Docker(DockerBackend),
  Maven(MavenBackend),
  Npm(NpmBackend),
}

impl ArtifactBackend {
  fn handler(&self) -> &dyn ArtifactHandler {
    match self {
      ArtifactBackend::Definition(b) => b,
      ArtifactBackend::Docker(b) => b,
      ArtifactBackend::Maven(b) => b,
      ArtifactBackend::Npm(b) => b,
    }
  }
}

impl ArtifactHandler for ArtifactBackend {
  fn name(&self) -> &'static str {
    self.handler().name()
  }

  fn verify(&self) -> KapResult<()> {
    self.handler().verify()
  }

  fn calculate_checksum(&self) -> KapResult<String> {
    self.handler().calculate_checksum()
  }

  fn build(&self) -> KapResult<()> {
    self.handler().build()
  }

  fn test(&self) -> KapResult<()> {
    self.handler().test()
  }

  fn push(&self, name: &str, version: &str, commit: Option<&str>) -> KapResult<Artifact> {
    self.handler().push(name, version, commit)
  }
}

type Predicate = fn(&BackendTarget<'_>) -> bool;
type Factory = fn(&BackendTarget<'_>, &BackendSettings) -> ArtifactBackend;

/// Settings shared by all factories
#[derive(Debug, Clone)]
pub struct BackendSettings {
  pub docker_registry: String,
}

struct BackendEntry {
  name: &'static str,
  predicate: Predicate,
  factory: Factory,
}

/// Fixed-priority list of backend factories
pub struct BackendRegistry {
  entries: Vec<BackendEntry>,
  settings: BackendSettings,
}

fn has_file(target: &BackendTarget<'_>, file: &str) -> bool {
  target.dir.join(file).is_file()
}

impl BackendRegistry {
  /// Registry with the built-in backends in selection order
  pub fn with_defaults(settings: BackendSettings) -> Self {
    let entries = vec![
      BackendEntry {
        name: "definition",
        predicate: |t| t.kind.eq_ignore_ascii_case(PLAN_KIND),
        factory: |t, _| ArtifactBackend::Definition(DefinitionBackend::new(t.definition_file)),
      },
      BackendEntry {
        name: "docker",
        predicate: |t| has_file(t, "Dockerfile"),
        factory: |t, s| ArtifactBackend::Docker(DockerBackend::new(t.dir, &s.docker_registry, t.asset_name)),
      },
      BackendEntry {
        name: "maven",
        predicate: |t| has_file(t, "pom.xml"),
        factory: |t, _| ArtifactBackend::Maven(MavenBackend::new(t.dir)),
      },
      BackendEntry {
        name: "npm",
        predicate: |t| has_file(t, "package.json"),
        factory: |t, _| ArtifactBackend::Npm(NpmBackend::new(t.dir)),
      },
    ];

    Self { entries, settings }
  }

  /// Select the first matching backend
  pub fn select(&self, target: &BackendTarget<'_>) -> KapResult<ArtifactBackend> {
    let entry = self
      .entries
      .iter()
      .find(|entry| (entry.predicate)(target))
      .ok_or_else(|| ValidationError::UnsupportedAsset {
        kind: target.kind.to_string(),
        path: PathBuf::from(target.dir),
      })?;

    tracing::debug!(backend = entry.name, kind = target.kind, "selected artifact backend");
    Ok((entry.factory)(target, &self.settings))
  }
}

impl BackendResolver for BackendRegistry {
  fn resolve(&self, target: &BackendTarget<'_>) -> KapResult<Box<dyn ArtifactHandler>> {
    Ok(Box::new(self.select(target)?))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;

  fn registry() -> BackendRegistry {
    BackendRegistry::with_defaults(BackendSettings {
      docker_registry: "docker.example.com".to_string(),
    })
  }

  fn select(dir: &Path, kind: &str) -> KapResult<ArtifactBackend> {
    let definition_file = dir.join("kapeta.yml");
    registry().select(&BackendTarget {
      kind,
      dir,
      definition_file: &definition_file,
      asset_name: "acme/users",
    })
  }

  #[test]
  fn test_plan_kind_wins_over_files() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Dockerfile"), "FROM scratch").unwrap();
    let backend = select(dir.path(), "core/plan").unwrap();
    assert_eq!(backend.name(), "definition");
  }

  #[test]
  fn test_dockerfile_before_package_json() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("Dockerfile"), "FROM scratch").unwrap();
    fs::write(dir.path().join("package.json"), "{}").unwrap();
    assert_eq!(select(dir.path(), "core/block-type").unwrap().name(), "docker");
  }

  #[test]
  fn test_probe_order_maven_then_npm() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("package.json"), "{}").unwrap();
    assert_eq!(select(dir.path(), "core/block-type").unwrap().name(), "npm");

    fs::write(dir.path().join("pom.xml"), "<project/>").unwrap();
    assert_eq!(select(dir.path(), "core/block-type").unwrap().name(), "maven");
  }

  #[test]
  fn test_no_match_is_validation_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = select(dir.path(), "core/block-type").err().unwrap();
    assert!(err.to_string().contains("core/block-type"));
  }
}
