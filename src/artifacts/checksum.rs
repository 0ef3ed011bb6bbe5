//! Content checksums for asset directories
//!
//! SHA-256 over sorted relative paths and file digests. Files are hashed in parallel;
//! the combined digest only depends on the sorted order.

use crate::core::error::{KapResult, ResultExt};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories never included in checksums or local scans
pub const IGNORED_DIRS: [&str; 4] = [".git", "node_modules", "target", "dist"];

/// Is this walk entry inside an ignored directory?
pub fn is_ignored(entry: &walkdir::DirEntry) -> bool {
  entry.depth() > 0
    && entry.file_type().is_dir()
    && entry
      .file_name()
      .to_str()
      .is_some_and(|name| IGNORED_DIRS.contains(&name))
}

/// Checksum of a single file
pub fn file_checksum(path: &Path) -> KapResult<String> {
  let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
  Ok(format!("{:x}", Sha256::digest(&content)))
}

/// Checksum of every file below `dir`
pub fn directory_checksum(dir: &Path) -> KapResult<String> {
  let mut files: Vec<PathBuf> = Vec::new();
  for entry in WalkDir::new(dir).follow_links(false).into_iter().filter_entry(|e| !is_ignored(e)) {
    let entry = entry?;
    if entry.file_type().is_file() {
      files.push(entry.path().strip_prefix(dir)?.to_path_buf());
    }
  }
  files.sort();

  let digests: Vec<(String, String)> = files
    .par_iter()
    .map(|relative| -> KapResult<(String, String)> {
      let digest = file_checksum(&dir.join(relative))?;
      Ok((relative.to_string_lossy().replace('\\', "/"), digest))
    })
    .collect::<KapResult<Vec<_>>>()?;

  let mut hasher = Sha256::new();
  for (path, digest) in &digests {
    hasher.update(path.as_bytes());
    hasher.update([0u8]);
    hasher.update(digest.as_bytes());
    hasher.update([b'\n']);
  }
  Ok(format!("{:x}", hasher.finalize()))
}
