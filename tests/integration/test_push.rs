//! Push preconditions and failure reporting

use crate::helpers::{TestWorkspace, UNREACHABLE_REGISTRY, plan_definition, stderr};
use anyhow::Result;

#[test]
fn test_missing_definition_file() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = ws.kapctl(&ws.path, &["push"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("File not found"));
  Ok(())
}

#[test]
fn test_missing_name_fails_before_registry() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let asset = ws.add_asset("plans/a", "kind: core/plan\nmetadata:\n  title: A\n")?;
  ws.commit("feat: add plan")?;

  let output = ws.kapctl(&asset, &["push"])?;
  let err = stderr(&output);

  assert_eq!(output.status.code(), Some(1));
  assert!(err.contains("metadata.name"), "{}", err);
  assert!(!err.contains("Could not connect"), "{}", err);
  Ok(())
}

#[test]
fn test_dirty_working_directory_is_rejected() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let asset = ws.add_asset("plans/a", &plan_definition("acme/a"))?;
  ws.commit("feat: add plan")?;
  std::fs::write(asset.join("notes.txt"), "uncommitted")?;

  let output = ws.kapctl(&asset, &["push"])?;
  let err = stderr(&output);

  assert_eq!(output.status.code(), Some(1));
  assert!(err.contains("not clean"), "{}", err);
  assert!(err.contains("--ignore-working-directory"), "{}", err);
  Ok(())
}

#[test]
fn test_unreachable_registry_is_system_error() -> Result<()> {
  let ws = TestWorkspace::new()?;
  let asset = ws.add_asset("plans/a", &plan_definition("acme/a"))?;
  ws.commit("feat: add plan")?;

  let output = ws.kapctl(&asset, &["push", "--ignore-working-directory"])?;
  let err = stderr(&output);

  assert_eq!(output.status.code(), Some(2));
  assert!(
    err.contains(&format!("Could not connect to the registry at {}", UNREACHABLE_REGISTRY)),
    "{}",
    err
  );
  Ok(())
}
