//! Install and clone commands

use crate::core::context::AppContext;
use crate::core::error::{KapError, KapResult};
use crate::local::Installer;
use crate::model::{DEFINITION_FILE, ParsedReference};
use crate::registry::fetch_reference;
use crate::vcs::SystemGit;
use std::env;
use std::path::PathBuf;

/// Run the install command
pub fn run_install(
  ctx: &AppContext,
  references: &[String],
  skip_dependencies: bool,
  skip_images: bool,
) -> KapResult<()> {
  let mut installer = Installer::new(&ctx.registry, &ctx.repository);
  if skip_images {
    installer = installer.without_images();
  }
  let mut count = 0;
  for reference in references {
    let reference = ParsedReference::parse(reference)?;
    count += installer.install(&reference, skip_dependencies)?.len();
  }

  println!();
  println!("✅ {} asset version(s) installed into {}", count, ctx.repository.root().display());
  Ok(())
}

/// Options of the clone command
pub struct CloneOptions {
  pub target: Option<PathBuf>,
  pub skip_linking: bool,
  pub skip_install: bool,
}

/// Run the clone command
pub fn run_clone(ctx: &AppContext, reference: &str, options: CloneOptions) -> KapResult<()> {
  let reference = ParsedReference::parse(reference)?;
  let version = fetch_reference(&ctx.registry, &reference)?
    .ok_or_else(|| KapError::message(format!("{} was not found in the registry", reference)))?;

  let repository = version.repository.as_ref().ok_or_else(|| {
    KapError::with_help(
      format!("{}:{} has no source repository", reference.full_name(), version.version),
      "Only versions pushed from a git checkout can be cloned.",
    )
  })?;
  let url = repository
    .details
    .get("url")
    .and_then(|u| u.as_str())
    .ok_or_else(|| KapError::message(format!("{}:{} has no repository URL", reference.full_name(), version.version)))?;

  let target = match options.target {
    Some(target) => target,
    None => env::current_dir()?.join(&reference.name),
  };

  println!("📥 Cloning {} into {}", url, target.display());
  let git = SystemGit::clone_into(url, &target)?;
  if let Some(commit) = &repository.commit {
    git.checkout(commit)?;
  }

  let subdir = repository.details.get("path").and_then(|p| p.as_str()).unwrap_or(".");
  let asset_dir = target.join(subdir);
  if !asset_dir.join(DEFINITION_FILE).is_file() {
    tracing::warn!(dir = %asset_dir.display(), "cloned checkout has no definition file");
  }

  if !options.skip_linking {
    for link in ctx.repository.link(&asset_dir)? {
      println!("🔗 Linked {}", link.display());
    }
  }
  if !options.skip_install {
    Installer::new(&ctx.registry, &ctx.repository).install_dependencies(&version)?;
  }

  println!("✅ Cloned {}:{}", reference.full_name(), version.version);
  Ok(())
}
