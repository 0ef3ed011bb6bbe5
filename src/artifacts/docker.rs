//! Docker images: `docker build` once, then tag and push per reserved version

use super::ArtifactHandler;
use super::checksum::directory_checksum;
use super::command::run_tool;
use crate::core::error::KapResult;
use crate::model::Artifact;
use serde_json::json;
use std::path::{Path, PathBuf};

/// Tag of the locally built image before it is pushed
const LOCAL_TAG: &str = "local";

pub struct DockerBackend {
  dir: PathBuf,
  docker_registry: String,
  asset_name: String,
}

impl DockerBackend {
  pub fn new(dir: &Path, docker_registry: &str, asset_name: &str) -> Self {
    Self {
      dir: dir.to_path_buf(),
      docker_registry: docker_registry.trim_end_matches('/').to_string(),
      asset_name: asset_name.to_string(),
    }
  }

  /// `<registry>/<handle>/<name>`, lowercased as docker requires
  pub fn image_name(&self, asset_name: &str) -> String {
    format!("{}/{}", self.docker_registry, asset_name).to_lowercase()
  }

  fn local_image(&self) -> String {
    format!("{}:{}", self.image_name(&self.asset_name), LOCAL_TAG)
  }
}

impl ArtifactHandler for DockerBackend {
  fn name(&self) -> &'static str {
    "docker"
  }

  fn verify(&self) -> KapResult<()> {
    run_tool("verify", &self.dir, "docker", &["version"])?;
    Ok(())
  }

  fn calculate_checksum(&self) -> KapResult<String> {
    directory_checksum(&self.dir)
  }

  fn build(&self) -> KapResult<()> {
    let image = self.local_image();
    run_tool("build", &self.dir, "docker", &["build", "-t", &image, "."])?;
    Ok(())
  }

  fn test(&self) -> KapResult<()> {
    // Images carry no test convention; test.sh covers it when present
    tracing::debug!(dir = %self.dir.display(), "docker backend has no test step");
    Ok(())
  }

  fn push(&self, name: &str, version: &str, commit: Option<&str>) -> KapResult<Artifact> {
    let image = self.image_name(name);
    let source = self.local_image();

    let mut tags = vec![format!("{}:{}", image, version)];
    if let Some(commit) = commit {
      tags.push(format!("{}:{}", image, commit));
    }

    for tag in &tags {
      run_tool("push", &self.dir, "docker", &["tag", &source, tag])?;
      run_tool("push", &self.dir, "docker", &["push", tag])?;
    }

    Ok(Artifact {
      artifact_type: "docker".to_string(),
      details: json!({
        "name": image,
        "primary": tags[0],
        "tags": tags,
      }),
    })
  }
}
