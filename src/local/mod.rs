//! Local asset repository
//!
//! Assets live under `<repository>/<handle>/<name>/<version>`. Published versions are
//! installed as plain directories holding their definition; working copies are linked in
//! as the `local` version so dependents can resolve them.

pub mod install;

pub use install::Installer;

use crate::core::error::{KapError, KapResult, ResultExt, ValidationError};
use crate::model::reference::LOCAL_VERSION;
use crate::model::{AssetDefinition, AssetVersion, DEFINITION_FILE, ParsedReference, load_definitions};
use std::fs;
use std::path::{Path, PathBuf};

/// Directory holding metadata next to an installed definition
const METADATA_DIR: &str = ".kapeta";
const VERSION_FILE: &str = "version.json";

/// `<repository>/<handle>/<name>/<version>`
pub fn version_path(repository: &Path, handle: &str, name: &str, version: &str) -> PathBuf {
  repository.join(handle).join(name).join(version)
}

#[derive(Debug, Clone)]
pub struct LocalRepository {
  root: PathBuf,
}

impl LocalRepository {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  pub fn path(&self, reference: &ParsedReference) -> PathBuf {
    version_path(&self.root, &reference.handle, &reference.name, &reference.version)
  }

  pub fn is_installed(&self, reference: &ParsedReference) -> bool {
    self.path(reference).symlink_metadata().is_ok()
  }

  /// Link every asset defined in `asset_dir` as its `local` version
  ///
  /// An existing link is replaced; an installed directory in the way is an error.
  pub fn link(&self, asset_dir: &Path) -> KapResult<Vec<PathBuf>> {
    let asset_dir =
      fs::canonicalize(asset_dir).with_context(|| format!("Failed to resolve {}", asset_dir.display()))?;
    let definitions = load_definitions(&asset_dir.join(DEFINITION_FILE))?;

    let mut links = Vec::with_capacity(definitions.len());
    for definition in &definitions {
      let reference = local_reference(definition)?;
      let link = self.path(&reference);

      if let Ok(meta) = link.symlink_metadata() {
        if !meta.file_type().is_symlink() {
          return Err(KapError::with_help(
            format!("{} exists and is not a link", link.display()),
            format!("Run `kapctl uninstall {}` first.", reference),
          ));
        }
        fs::remove_file(&link).with_context(|| format!("Failed to replace link {}", link.display()))?;
      }

      if let Some(parent) = link.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
      }
      symlink_dir(&asset_dir, &link).with_context(|| format!("Failed to link {}", link.display()))?;
      tracing::debug!(link = %link.display(), target = %asset_dir.display(), "linked asset");
      links.push(link);
    }
    Ok(links)
  }

  /// Remove an installed version or link. `Ok(false)` when nothing was there.
  pub fn uninstall(&self, reference: &ParsedReference) -> KapResult<bool> {
    let path = self.path(reference);
    let meta = match path.symlink_metadata() {
      Ok(meta) => meta,
      Err(_) => return Ok(false),
    };

    if meta.file_type().is_symlink() || meta.is_file() {
      remove_link(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
    } else {
      fs::remove_dir_all(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(true)
  }

  /// Write a published version into the repository
  pub fn install_definition(&self, version: &AssetVersion) -> KapResult<PathBuf> {
    let (handle, name) = split_name(&version.content)?;
    let reference = ParsedReference::new(handle, name, &version.version);
    let dir = self.path(&reference);
    let metadata_dir = dir.join(METADATA_DIR);
    fs::create_dir_all(&metadata_dir).with_context(|| format!("Failed to create {}", metadata_dir.display()))?;

    let definition = serde_yaml::to_string(&version.content)?;
    fs::write(dir.join(DEFINITION_FILE), definition)?;
    fs::write(metadata_dir.join(VERSION_FILE), serde_json::to_string_pretty(version)?)?;
    Ok(dir)
  }
}

fn split_name(definition: &AssetDefinition) -> KapResult<(&str, &str)> {
  match definition.handle() {
    Some(handle) => Ok((handle, definition.short_name())),
    None => Err(
      ValidationError::InvalidReference {
        reference: definition.name().to_string(),
      }
      .into(),
    ),
  }
}

fn local_reference(definition: &AssetDefinition) -> KapResult<ParsedReference> {
  let (handle, name) = split_name(definition)?;
  Ok(ParsedReference::new(handle, name, LOCAL_VERSION))
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
  std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
  std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(unix)]
fn remove_link(path: &Path) -> std::io::Result<()> {
  fs::remove_file(path)
}

#[cfg(windows)]
fn remove_link(path: &Path) -> std::io::Result<()> {
  fs::remove_dir(path).or_else(|_| fs::remove_file(path))
}
