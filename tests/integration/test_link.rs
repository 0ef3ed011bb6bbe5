//! Linking working copies into the local repository

use crate::helpers::{TestWorkspace, plan_definition, stderr, stdout};
use anyhow::Result;

#[test]
fn test_link_and_uninstall() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let asset = ws.add_asset("plans/a", &plan_definition("acme/a"))?;

  let output = ws.kapctl(&asset, &["link"])?;
  assert!(output.status.success(), "link failed: {}", stderr(&output));
  assert!(stdout(&output).contains("Linked"));

  let link = ws.home.join("repository").join("acme").join("a").join("local");
  assert!(link.symlink_metadata()?.file_type().is_symlink());
  assert_eq!(link.canonicalize()?, asset.canonicalize()?);

  let output = ws.kapctl(&ws.path, &["uninstall", "acme/a:local"])?;
  assert!(output.status.success(), "uninstall failed: {}", stderr(&output));
  assert!(link.symlink_metadata().is_err());
  Ok(())
}

#[test]
fn test_uninstall_missing_is_not_an_error() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = ws.kapctl(&ws.path, &["uninstall", "acme/missing:1.0.0"])?;

  assert!(output.status.success());
  assert!(stdout(&output).contains("not installed"));
  Ok(())
}

#[test]
fn test_link_without_definition_fails() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = ws.kapctl(&ws.path, &["link"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("File not found"));
  Ok(())
}
