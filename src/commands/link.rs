//! Link and uninstall commands: manage the local asset repository

use crate::core::context::AppContext;
use crate::core::error::KapResult;
use crate::model::ParsedReference;
use std::env;
use std::path::PathBuf;

/// Run the link command
pub fn run_link(ctx: &AppContext, path: Option<PathBuf>) -> KapResult<()> {
  let path = match path {
    Some(path) => path,
    None => env::current_dir()?,
  };

  for link in ctx.repository.link(&path)? {
    println!("🔗 Linked {}", link.display());
  }
  Ok(())
}

/// Run the uninstall command
pub fn run_uninstall(ctx: &AppContext, references: &[String]) -> KapResult<()> {
  for reference in references {
    let reference = ParsedReference::parse(reference)?;
    if ctx.repository.uninstall(&reference)? {
      println!("🗑️  Removed {}", reference);
    } else {
      println!("⚠️  {} is not installed", reference);
    }
  }
  Ok(())
}
