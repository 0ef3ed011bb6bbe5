//! Per-session lookups for local dependencies
//!
//! - [`LocalMappingCache`]: local dependency -> reference it was published as
//! - [`LocalIndex`]: asset name -> directory, for definitions found under the root asset

use crate::artifacts::checksum::is_ignored;
use crate::model::{DEFINITION_FILE, load_definitions};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Resolved local dependencies of one push session. Never persisted.
#[derive(Debug, Default)]
pub struct LocalMappingCache {
  entries: HashMap<String, String>,
}

impl LocalMappingCache {
  /// `full_name` is `handle/name`
  pub fn get(&self, full_name: &str) -> Option<&str> {
    self.entries.get(full_name).map(String::as_str)
  }

  pub fn insert(&mut self, full_name: impl Into<String>, reference: impl Into<String>) {
    self.entries.insert(full_name.into(), reference.into());
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  #[cfg(test)]
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

/// Asset definitions found on disk below a root directory
#[derive(Debug, Default)]
pub struct LocalIndex {
  assets: HashMap<String, PathBuf>,
}

impl LocalIndex {
  /// Walk `root` for definition files. Unreadable definitions are skipped.
  pub fn scan(root: &Path) -> Self {
    let mut assets = HashMap::new();

    let walker = WalkDir::new(root)
      .follow_links(false)
      .sort_by_file_name()
      .into_iter()
      .filter_entry(|e| !is_ignored(e));

    for entry in walker {
      let entry = match entry {
        Ok(entry) => entry,
        Err(e) => {
          tracing::debug!(error = %e, "skipping unreadable path while indexing");
          continue;
        }
      };
      if !entry.file_type().is_file() || entry.file_name() != DEFINITION_FILE {
        continue;
      }
      let Some(dir) = entry.path().parent() else {
        continue;
      };

      match load_definitions(entry.path()) {
        Ok(definitions) => {
          for definition in definitions {
            assets
              .entry(definition.metadata.name.to_lowercase())
              .or_insert_with(|| dir.to_path_buf());
          }
        }
        Err(e) => tracing::debug!(path = %entry.path().display(), error = %e, "skipping invalid definition"),
      }
    }

    tracing::debug!(root = %root.display(), assets = assets.len(), "indexed local assets");
    Self { assets }
  }

  /// Directory holding the asset, case-insensitive on the name
  pub fn find(&self, full_name: &str) -> Option<&Path> {
    self.assets.get(&full_name.to_lowercase()).map(PathBuf::as_path)
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.assets.len()
  }
}
