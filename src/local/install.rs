//! Installing published assets (and their dependencies) into the local repository

use super::LocalRepository;
use crate::artifacts::command::run_tool;
use crate::core::error::{KapError, KapResult};
use crate::model::{AssetVersion, ParsedReference};
use crate::registry::{RegistryClient, fetch_reference};
use std::collections::HashSet;

pub struct Installer<'a> {
  registry: &'a dyn RegistryClient,
  repository: &'a LocalRepository,
  /// `handle/name:version` already handled in this run
  seen: HashSet<String>,
  pull_images: bool,
}

impl<'a> Installer<'a> {
  pub fn new(registry: &'a dyn RegistryClient, repository: &'a LocalRepository) -> Self {
    Self {
      registry,
      repository,
      seen: HashSet::new(),
      pull_images: true,
    }
  }

  /// Skip `docker pull` for docker artifacts
  pub fn without_images(mut self) -> Self {
    self.pull_images = false;
    self
  }

  /// Install `reference` and, unless `skip_dependencies`, everything it depends on
  ///
  /// Returns the versions newly written to the repository.
  pub fn install(&mut self, reference: &ParsedReference, skip_dependencies: bool) -> KapResult<Vec<ParsedReference>> {
    let mut installed = Vec::new();
    self.install_into(reference, skip_dependencies, &mut installed)?;
    Ok(installed)
  }

  /// Install the dependencies of an already present version
  pub fn install_dependencies(&mut self, version: &AssetVersion) -> KapResult<Vec<ParsedReference>> {
    let mut installed = Vec::new();
    self.install_dependencies_into(version, &mut installed)?;
    Ok(installed)
  }

  fn install_into(
    &mut self,
    reference: &ParsedReference,
    skip_dependencies: bool,
    installed: &mut Vec<ParsedReference>,
  ) -> KapResult<()> {
    if reference.is_local() {
      tracing::debug!(reference = %reference, "local versions are linked, not installed");
      return Ok(());
    }

    let version = fetch_reference(self.registry, reference)?.ok_or_else(|| KapError::DependencyNotFound {
      name: reference.to_string(),
      reason: "not found in the registry".to_string(),
    })?;
    let resolved = ParsedReference::new(&reference.handle, &reference.name, &version.version);
    if !self.seen.insert(resolved.to_string()) {
      return Ok(());
    }

    if self.repository.is_installed(&resolved) {
      println!("✓ {} already installed", resolved);
    } else {
      self.repository.install_definition(&version)?;
      println!("📥 Installed {}", resolved);
      if self.pull_images {
        pull_image(&version);
      }
      installed.push(resolved);
    }

    if !skip_dependencies {
      self.install_dependencies_into(&version, installed)?;
    }
    Ok(())
  }

  fn install_dependencies_into(
    &mut self,
    version: &AssetVersion,
    installed: &mut Vec<ParsedReference>,
  ) -> KapResult<()> {
    for dependency in &version.dependencies {
      let reference = dependency.parsed()?;
      self.install_into(&reference, false, installed)?;
    }
    Ok(())
  }
}

/// Best-effort `docker pull` of a docker artifact
fn pull_image(version: &AssetVersion) {
  let Some(artifact) = &version.artifact else {
    return;
  };
  if artifact.artifact_type != "docker" {
    return;
  }
  let Some(image) = artifact.details.get("primary").and_then(|v| v.as_str()) else {
    return;
  };

  let cwd = std::env::temp_dir();
  match run_tool("install", &cwd, "docker", &["pull", image]) {
    Ok(_) => println!("🐳 Pulled {}", image),
    Err(e) => tracing::warn!(image, error = %e, "failed to pull image"),
  }
}
