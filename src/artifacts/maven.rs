//! Maven artifacts

use super::ArtifactHandler;
use super::checksum::directory_checksum;
use super::command::run_tool;
use crate::core::error::{KapResult, ResultExt};
use crate::model::Artifact;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

pub struct MavenBackend {
  dir: PathBuf,
}

impl MavenBackend {
  pub fn new(dir: &Path) -> Self {
    Self { dir: dir.to_path_buf() }
  }

  fn evaluate(&self, expression: &str) -> Option<String> {
    let arg = format!("-Dexpression={}", expression);
    run_tool("push", &self.dir, "mvn", &["-B", "-q", "help:evaluate", &arg, "-DforceStdout"])
      .ok()
      .map(|out| out.trim().to_string())
      .filter(|out| !out.is_empty())
  }

  fn deploy(&self, version: &str) -> KapResult<()> {
    let new_version = format!("-DnewVersion={}", version);
    run_tool(
      "push",
      &self.dir,
      "mvn",
      &["-B", "versions:set", &new_version, "-DgenerateBackupPoms=false"],
    )?;
    run_tool("push", &self.dir, "mvn", &["-B", "deploy", "-DskipTests"])?;
    Ok(())
  }
}

impl ArtifactHandler for MavenBackend {
  fn name(&self) -> &'static str {
    "maven"
  }

  fn verify(&self) -> KapResult<()> {
    run_tool("verify", &self.dir, "mvn", &["-v"])?;
    Ok(())
  }

  fn calculate_checksum(&self) -> KapResult<String> {
    directory_checksum(&self.dir)
  }

  fn build(&self) -> KapResult<()> {
    run_tool("build", &self.dir, "mvn", &["-B", "package", "-DskipTests"])?;
    Ok(())
  }

  fn test(&self) -> KapResult<()> {
    run_tool("test", &self.dir, "mvn", &["-B", "test"])?;
    Ok(())
  }

  fn push(&self, _name: &str, version: &str, _commit: Option<&str>) -> KapResult<Artifact> {
    let pom = self.dir.join("pom.xml");
    let original = fs::read(&pom).with_context(|| format!("Failed to read {}", pom.display()))?;

    let deployed = self.deploy(version);
    fs::write(&pom, &original).with_context(|| format!("Failed to restore {}", pom.display()))?;
    deployed?;

    Ok(Artifact {
      artifact_type: "maven".to_string(),
      details: json!({
        "groupId": self.evaluate("project.groupId"),
        "artifactId": self.evaluate("project.artifactId"),
        "version": version,
      }),
    })
  }
}
