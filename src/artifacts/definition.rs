//! Definition-only assets (plans): nothing to build, the document is the artifact

use super::ArtifactHandler;
use super::checksum::file_checksum;
use crate::core::error::KapResult;
use crate::model::Artifact;
use std::path::{Path, PathBuf};

pub struct DefinitionBackend {
  definition_file: PathBuf,
}

impl DefinitionBackend {
  pub fn new(definition_file: &Path) -> Self {
    Self {
      definition_file: definition_file.to_path_buf(),
    }
  }
}

impl ArtifactHandler for DefinitionBackend {
  fn name(&self) -> &'static str {
    "definition"
  }

  fn verify(&self) -> KapResult<()> {
    Ok(())
  }

  fn calculate_checksum(&self) -> KapResult<String> {
    file_checksum(&self.definition_file)
  }

  fn build(&self) -> KapResult<()> {
    Ok(())
  }

  fn test(&self) -> KapResult<()> {
    Ok(())
  }

  fn push(&self, _name: &str, _version: &str, _commit: Option<&str>) -> KapResult<Artifact> {
    Ok(Artifact::none())
  }
}
