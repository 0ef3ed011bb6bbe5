//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Nothing listens here, so registry calls fail fast with a connection error
pub const UNREACHABLE_REGISTRY: &str = "http://127.0.0.1:9";

/// A git checkout plus an isolated Kapeta home directory
pub struct TestWorkspace {
  _root: TempDir,
  _home: TempDir,
  pub path: PathBuf,
  pub home: PathBuf,
}

impl TestWorkspace {
  /// Create an empty repository on `main` with one initial commit
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let home = TempDir::new()?;
    let path = root.path().canonicalize()?;

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["config", "tag.gpgSign", "false"])?;
    git(&path, &["config", "commit.gpgSign", "false"])?;

    std::fs::write(path.join("README.md"), "# assets\n")?;
    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "chore: initial commit"])?;

    let home_path = home.path().to_path_buf();
    Ok(Self {
      _root: root,
      _home: home,
      path,
      home: home_path,
    })
  }

  /// Write a definition file into `dir` (relative to the checkout) and return the directory
  pub fn add_asset(&self, dir: &str, definition: &str) -> Result<PathBuf> {
    let asset_dir = self.path.join(dir);
    std::fs::create_dir_all(&asset_dir)?;
    std::fs::write(asset_dir.join("kapeta.yml"), definition)?;
    Ok(asset_dir)
  }

  /// Commit current changes
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;

    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Run kapctl in `cwd` with this workspace's home directory
  pub fn kapctl(&self, cwd: &Path, args: &[&str]) -> Result<Output> {
    run_kapctl(cwd, &self.home, args)
  }
}

/// A plan definition; plans publish without any build tooling
pub fn plan_definition(name: &str) -> String {
  format!(
    r#"kind: core/plan
metadata:
  name: {}
spec:
  blocks: []
"#,
    name
  )
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the kapctl binary. Failing exits are returned, not raised, so tests can inspect them.
pub fn run_kapctl(cwd: &Path, home: &Path, args: &[&str]) -> Result<Output> {
  let kapctl_bin = env!("CARGO_BIN_EXE_kapctl");

  Command::new(kapctl_bin)
    .current_dir(cwd)
    .args(args)
    .env("KAPETA_HOME", home)
    .env("KAPETA_REGISTRY_URL", UNREACHABLE_REGISTRY)
    .env_remove("KAPETA_TOKEN")
    .env_remove("KAPCTL_LOG")
    .output()
    .context("Failed to run kapctl")
}

/// Like [`run_kapctl`], but fail unless the command succeeded
pub fn run_kapctl_ok(cwd: &Path, home: &Path, args: &[&str]) -> Result<Output> {
  let output = run_kapctl(cwd, home, args)?;
  if !output.status.success() {
    anyhow::bail!(
      "kapctl command failed: kapctl {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      String::from_utf8_lossy(&output.stdout),
      String::from_utf8_lossy(&output.stderr)
    );
  }
  Ok(output)
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}
