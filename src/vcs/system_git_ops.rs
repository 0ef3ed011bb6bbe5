//! VersionControl operations for SystemGit (commit log, branches, tags)

use super::system_git::SystemGit;
use super::{BranchInfo, VersionControl};
use crate::core::error::{GitError, KapError, KapResult};
use serde_json::json;

/// Branch names treated as default when the remote HEAD is unknown
const FALLBACK_MAIN_BRANCHES: [&str; 2] = ["main", "master"];

impl SystemGit {
  /// Default branch as advertised by `origin/HEAD`
  fn default_branch(&self) -> KapResult<Option<String>> {
    let head = self.try_stdout(&["symbolic-ref", "--short", "refs/remotes/origin/HEAD"])?;
    Ok(head.map(|h| h.strip_prefix("origin/").unwrap_or(&h).to_string()))
  }

  fn has_upstream(&self) -> KapResult<bool> {
    Ok(
      self
        .try_stdout(&["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"])?
        .is_some(),
    )
  }

  fn has_remote(&self) -> KapResult<bool> {
    Ok(
      self
        .try_stdout(&["remote"])?
        .is_some_and(|remotes| !remotes.trim().is_empty()),
    )
  }
}

impl VersionControl for SystemGit {
  fn kind(&self) -> &'static str {
    "git"
  }

  fn latest_commit(&self) -> KapResult<Option<String>> {
    self.try_stdout(&["rev-parse", "--verify", "--quiet", "HEAD"])
  }

  fn commits_since(&self, commit: &str) -> KapResult<Vec<String>> {
    let known = self
      .try_stdout(&["cat-file", "-e", &format!("{}^{{commit}}", commit)])?
      .is_some();
    if !known {
      tracing::warn!(commit, "previous commit not found in local history, ignoring commit log");
      return Ok(vec![]);
    }

    let range = format!("{}..HEAD", commit);
    let output = self.run(&["log", "--format=%B%x00", &range, "--", "."])?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    Ok(
      stdout
        .split('\0')
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty())
        .collect(),
    )
  }

  fn branch(&self) -> KapResult<BranchInfo> {
    let branch = self
      .try_stdout(&["rev-parse", "--abbrev-ref", "HEAD"])?
      .unwrap_or_else(|| "HEAD".to_string()); // Detached HEAD or unborn branch

    let main = match self.default_branch()? {
      Some(default) => default == branch,
      None => FALLBACK_MAIN_BRANCHES.contains(&branch.as_str()),
    };

    Ok(BranchInfo { branch, main })
  }

  fn checkout_info(&self) -> KapResult<serde_json::Value> {
    let url = self.try_stdout(&["remote", "get-url", "origin"])?;
    let path = self.try_stdout(&["rev-parse", "--show-prefix"])?.unwrap_or_default();

    Ok(json!({
      "url": url,
      "path": path.trim_end_matches('/'),
    }))
  }

  fn is_working_directory_clean(&self) -> KapResult<bool> {
    let output = self.run(&["status", "--porcelain"])?;
    Ok(output.stdout.iter().all(|b| b.is_ascii_whitespace()))
  }

  fn is_working_directory_up_to_date(&self) -> KapResult<bool> {
    if !self.has_upstream()? {
      // Nothing to compare against
      return Ok(true);
    }

    if let Err(e) = self.run(&["fetch", "--quiet"]) {
      tracing::warn!(error = %e, "git fetch failed, comparing against last known remote state");
    }

    let behind = self
      .try_stdout(&["rev-list", "--count", "HEAD..@{u}"])?
      .and_then(|count| count.parse::<u64>().ok())
      .unwrap_or(0);

    Ok(behind == 0)
  }

  fn tag(&self, tag: &str) -> KapResult<bool> {
    match self.run(&["tag", tag]) {
      Ok(_) => Ok(true),
      Err(KapError::Git(GitError::CommandFailed { stderr, .. })) if stderr.contains("already exists") => Ok(false),
      Err(e) => Err(e),
    }
  }

  fn push_tags(&self) -> KapResult<()> {
    if !self.has_remote()? {
      tracing::debug!(dir = %self.work_tree.display(), "no remote configured, not pushing tags");
      return Ok(());
    }
    self.run(&["push", "--tags"])?;
    Ok(())
  }
}
