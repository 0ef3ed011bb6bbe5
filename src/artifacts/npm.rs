//! npm packages
//!
//! Publishing needs the reserved version inside `package.json`. The file is rewritten
//! for the duration of `npm publish` and restored afterwards, whatever the outcome.

use super::ArtifactHandler;
use super::checksum::directory_checksum;
use super::command::run_tool;
use crate::core::error::{KapError, KapResult, ResultExt};
use crate::model::Artifact;
use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};

const PACKAGE_JSON: &str = "package.json";

pub struct NpmBackend {
  dir: PathBuf,
}

/// Restores the original `package.json` when dropped
struct PackageJsonGuard {
  path: PathBuf,
  original: Vec<u8>,
}

impl Drop for PackageJsonGuard {
  fn drop(&mut self) {
    if let Err(e) = fs::write(&self.path, &self.original) {
      tracing::error!(path = %self.path.display(), error = %e, "failed to restore package.json");
    }
  }
}

impl NpmBackend {
  pub fn new(dir: &Path) -> Self {
    Self { dir: dir.to_path_buf() }
  }

  fn package_json_path(&self) -> PathBuf {
    self.dir.join(PACKAGE_JSON)
  }

  fn read_package_json(&self) -> KapResult<Value> {
    let path = self.package_json_path();
    let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).map_err(|e| KapError::build("build", format!("invalid package.json: {}", e)))
  }

  fn has_script(&self, script: &str) -> KapResult<bool> {
    Ok(self.read_package_json()?.get("scripts").and_then(|s| s.get(script)).is_some())
  }

  /// Set `version` in package.json; the returned guard puts the original back
  fn stamp_version(&self, version: &str) -> KapResult<PackageJsonGuard> {
    let path = self.package_json_path();
    let original = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut package = self.read_package_json()?;
    package["version"] = Value::from(version);

    let guard = PackageJsonGuard {
      path: path.clone(),
      original,
    };
    fs::write(&path, serde_json::to_string_pretty(&package)?)?;
    Ok(guard)
  }
}

impl ArtifactHandler for NpmBackend {
  fn name(&self) -> &'static str {
    "npm"
  }

  fn verify(&self) -> KapResult<()> {
    run_tool("verify", &self.dir, "npm", &["--version"])?;
    Ok(())
  }

  fn calculate_checksum(&self) -> KapResult<String> {
    directory_checksum(&self.dir)
  }

  fn build(&self) -> KapResult<()> {
    if !self.has_script("build")? {
      tracing::debug!(dir = %self.dir.display(), "package.json has no build script");
      return Ok(());
    }
    run_tool("build", &self.dir, "npm", &["run", "build"])?;
    Ok(())
  }

  fn test(&self) -> KapResult<()> {
    if !self.has_script("test")? {
      tracing::debug!(dir = %self.dir.display(), "package.json has no test script");
      return Ok(());
    }
    run_tool("test", &self.dir, "npm", &["test"])?;
    Ok(())
  }

  fn push(&self, _name: &str, version: &str, _commit: Option<&str>) -> KapResult<Artifact> {
    let package = self.read_package_json()?;
    let package_name = package
      .get("name")
      .and_then(Value::as_str)
      .ok_or_else(|| KapError::build("push", "package.json has no name"))?
      .to_string();
    let registry = package
      .get("publishConfig")
      .and_then(|c| c.get("registry"))
      .cloned()
      .unwrap_or(Value::Null);

    let _guard = self.stamp_version(version)?;
    run_tool("push", &self.dir, "npm", &["publish"])?;

    Ok(Artifact {
      artifact_type: "npm".to_string(),
      details: json!({
        "name": package_name,
        "version": version,
        "registry": registry,
      }),
    })
  }
}
