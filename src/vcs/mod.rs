//! Version control collaborator
//!
//! The publish pipeline only needs a handful of facts from VCS: the current commit, the
//! branch and whether it is the default one, the commit log since the last publish, and
//! working directory health. Tagging happens after a successful commit.

pub mod system_git;
mod system_git_ops;

pub use system_git::SystemGit;

use crate::core::error::KapResult;
use std::path::Path;

/// Branch name plus whether it is the repository's default branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInfo {
  pub branch: String,
  pub main: bool,
}

impl BranchInfo {
  /// Defaults for assets that are not under version control
  pub fn untracked() -> Self {
    Self {
      branch: "master".to_string(),
      main: true,
    }
  }
}

/// Version control operations bound to one asset directory
pub trait VersionControl {
  /// Repository type recorded on published versions (e.g. "git")
  fn kind(&self) -> &'static str;

  /// HEAD commit, `None` for a repository without commits
  fn latest_commit(&self) -> KapResult<Option<String>>;

  /// Commit messages touching the asset directory since `commit` (exclusive)
  fn commits_since(&self, commit: &str) -> KapResult<Vec<String>>;

  fn branch(&self) -> KapResult<BranchInfo>;

  /// Provider specific checkout details (remote URL, path in repository)
  fn checkout_info(&self) -> KapResult<serde_json::Value>;

  fn is_working_directory_clean(&self) -> KapResult<bool>;

  fn is_working_directory_up_to_date(&self) -> KapResult<bool>;

  /// Create a tag at HEAD. `Ok(false)` when the tag already exists.
  fn tag(&self, tag: &str) -> KapResult<bool>;

  fn push_tags(&self) -> KapResult<()>;
}

/// Detects the version control system for a directory
pub trait VcsProvider {
  /// `None` when the directory is not under version control
  fn detect(&self, dir: &Path) -> Option<Box<dyn VersionControl>>;
}

/// Detects git repositories using the system git binary
#[derive(Debug, Default, Clone, Copy)]
pub struct GitProvider;

impl VcsProvider for GitProvider {
  fn detect(&self, dir: &Path) -> Option<Box<dyn VersionControl>> {
    match SystemGit::open(dir) {
      Ok(git) => Some(Box::new(git)),
      Err(e) => {
        tracing::debug!(dir = %dir.display(), error = %e, "no git repository detected");
        None
      }
    }
  }
}
