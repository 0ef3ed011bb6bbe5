//! Push command: publish an asset and its local dependencies

use crate::core::context::AppContext;
use crate::core::error::KapResult;
use crate::push::{PushOptions, PushSession};
use std::env;
use std::path::PathBuf;

/// Run the push command
pub fn run_push(ctx: &AppContext, path: Option<PathBuf>, options: PushOptions) -> KapResult<()> {
  let path = match path {
    Some(path) => path,
    None => env::current_dir()?,
  };

  let mut session =
    PushSession::new(&ctx.registry, &ctx.vcs, &ctx.backends).with_repository_path(ctx.repository.root().to_path_buf());
  let outcome = session.perform(&path, &options)?;

  println!();
  if options.dry_run {
    println!("🔍 Dry run complete (no versions were committed)");
  } else {
    println!("🚀 Push complete");
  }
  for reference in &outcome.references {
    println!("   {}", reference);
  }
  if !outcome.main_branch {
    println!("   (not on the main branch: versions were not tagged)");
  }
  Ok(())
}
