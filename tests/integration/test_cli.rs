//! Command-line surface

use crate::helpers::{run_kapctl, run_kapctl_ok, stderr, stdout};
use anyhow::Result;

#[test]
fn test_help_lists_commands() -> Result<()> {
  let dir = tempfile::tempdir()?;
  let output = run_kapctl_ok(dir.path(), dir.path(), &["--help"])?;
  let help = stdout(&output);

  for command in ["push", "view", "link", "uninstall", "install", "clone"] {
    assert!(help.contains(command), "missing {} in:\n{}", command, help);
  }
  Ok(())
}

#[test]
fn test_push_help_lists_flags() -> Result<()> {
  let dir = tempfile::tempdir()?;
  let output = run_kapctl_ok(dir.path(), dir.path(), &["push", "--help"])?;
  let help = stdout(&output);

  for flag in ["--dry-run", "--skip-tests", "--ignore-working-directory", "--max-depth"] {
    assert!(help.contains(flag), "missing {} in:\n{}", flag, help);
  }
  Ok(())
}

#[test]
fn test_invalid_reference_is_user_error() -> Result<()> {
  let dir = tempfile::tempdir()?;
  let output = run_kapctl(dir.path(), dir.path(), &["view", "not-a-reference"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("Invalid asset reference"));
  Ok(())
}
