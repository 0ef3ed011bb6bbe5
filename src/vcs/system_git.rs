//! System git backend
//!
//! Uses git plumbing commands for all operations. Every command runs with an isolated
//! environment so user configuration cannot change parsing of the output.

use crate::core::error::{GitError, KapError, KapResult, ResultExt};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Git backend using system git (zero crate dependencies)
pub struct SystemGit {
  /// Asset directory inside the repository
  pub(crate) repo_path: PathBuf,

  /// Working tree root
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open the git repository containing `path`
  pub fn open(path: &Path) -> KapResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(KapError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(KapError::message(format!("Failed to open git repository: {}", stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let work_tree = stdout.trim();

    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree: PathBuf::from(work_tree),
    })
  }

  /// Clone `url` into `target`
  pub fn clone_into(url: &str, target: &Path) -> KapResult<Self> {
    let output = isolated_command()
      .arg("clone")
      .arg(url)
      .arg(target)
      .output()
      .context("Failed to execute git clone")?;

    if !output.status.success() {
      return Err(KapError::Git(GitError::CommandFailed {
        command: format!("git clone {}", url),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }

    Self::open(target)
  }

  /// Check out a commit, branch or tag
  pub fn checkout(&self, reference: &str) -> KapResult<()> {
    self.run(&["checkout", reference])?;
    Ok(())
  }

  /// Run a git command and fail on non-zero exit
  pub(crate) fn run(&self, args: &[&str]) -> KapResult<Output> {
    tracing::debug!(dir = %self.repo_path.display(), "git {}", args.join(" "));
    let output = self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute git {}", args.join(" ")))?;

    if !output.status.success() {
      return Err(KapError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }

    Ok(output)
  }

  /// Run a git command and return trimmed stdout, `None` on non-zero exit
  pub(crate) fn try_stdout(&self, args: &[&str]) -> KapResult<Option<String>> {
    let output = self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute git {}", args.join(" ")))?;

    if !output.status.success() {
      return Ok(None);
    }

    Ok(Some(String::from_utf8_lossy(&output.stdout).trim().to_string()))
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to the asset path
  /// - Clears environment variables
  /// - Whitelists only PATH, HOME and the SSH agent socket
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = isolated_command();
    cmd.arg("-C").arg(&self.repo_path);
    cmd
  }
}

fn isolated_command() -> Command {
  let mut cmd = Command::new("git");

  // Isolated environment (don't trust global config)
  cmd.env_clear();
  for var in ["PATH", "HOME", "SSH_AUTH_SOCK"] {
    if let Ok(value) = std::env::var(var) {
      cmd.env(var, value);
    }
  }

  // Force safe behavior (override user config)
  cmd.arg("-c").arg("advice.detachedHead=false");
  cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII
  cmd.arg("-c").arg("color.ui=false");

  cmd
}
