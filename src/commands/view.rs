//! View command: show a published version

use crate::core::context::AppContext;
use crate::core::error::{KapError, KapResult};
use crate::model::{AssetVersion, ParsedReference};
use crate::registry::fetch_reference;

/// Run the view command
pub fn run_view(ctx: &AppContext, reference: &str, json: bool) -> KapResult<()> {
  let reference = ParsedReference::parse(reference)?;
  let version = fetch_reference(&ctx.registry, &reference)?
    .ok_or_else(|| KapError::message(format!("{} was not found in the registry", reference)))?;

  if json {
    println!("{}", serde_json::to_string_pretty(&version)?);
  } else {
    print_version(&reference, &version);
  }
  Ok(())
}

fn print_version(reference: &ParsedReference, version: &AssetVersion) {
  println!("📦 {}:{}", reference.full_name(), version.version);
  println!("   Kind:      {}", version.content.kind);
  if let Some(artifact) = &version.artifact {
    println!("   Artifact:  {}", artifact.artifact_type);
  }
  if let Some(repository) = &version.repository {
    let commit = repository.commit.as_deref().unwrap_or("-");
    println!("   Source:    {} {} @ {}", repository.repository_type, repository.branch, commit);
  }
  if let Some(checksum) = &version.checksum {
    println!("   Checksum:  {}", checksum);
  }
  if !version.dependencies.is_empty() {
    println!("   Dependencies:");
    for dependency in &version.dependencies {
      println!("     - {}", dependency.name);
    }
  }
}
