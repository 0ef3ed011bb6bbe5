//! Local dependency resolution
//!
//! Dependencies pinned to the `local` version are published first, from the working copy
//! found in the session index or linked into the local repository. The asset's documents
//! are then rewritten by the registry to point at the published versions.

use super::PushOptions;
use super::cache::LocalIndex;
use super::session::PushSession;
use crate::core::error::{KapError, KapResult};
use crate::local;
use crate::model::reference::LOCAL_VERSION;
use crate::model::{AssetDefinition, AssetReference, ParsedReference, ReferenceMap};
use std::fs;
use std::path::PathBuf;

impl PushSession<'_> {
  /// Publish local dependencies of every document and rewrite references to them
  ///
  /// Returns the dependency list of each document, in document order, with local
  /// references replaced by the published ones.
  pub(super) fn resolve_dependencies(
    &mut self,
    definitions: &mut [AssetDefinition],
    depth: usize,
    options: &PushOptions,
  ) -> KapResult<Vec<Vec<AssetReference>>> {
    let mut resolved = Vec::with_capacity(definitions.len());

    for definition in definitions.iter_mut() {
      let mut dependencies = self.registry.resolve_dependencies(definition)?;
      let mut mappings = Vec::new();

      for dependency in dependencies.iter_mut() {
        let reference = dependency.parsed()?;
        if !reference.is_local() {
          continue;
        }
        let target = self.resolve_local(&reference, depth, options)?;
        mappings.push(ReferenceMap {
          from: dependency.name.clone(),
          to: target.clone(),
        });
        dependency.name = target;
      }

      if !mappings.is_empty() {
        tracing::debug!(asset = definition.name(), mappings = mappings.len(), "rewriting local references");
        *definition = self.registry.update_dependencies(definition, &mappings)?;
      }
      resolved.push(dependencies);
    }

    Ok(resolved)
  }

  /// Published reference for a local dependency, pushing it on first use
  fn resolve_local(&mut self, reference: &ParsedReference, depth: usize, options: &PushOptions) -> KapResult<String> {
    let key = reference.full_name().to_lowercase();
    if let Some(hit) = self.cache.get(&key) {
      tracing::debug!(dependency = %reference, resolved = hit, "local dependency already published");
      return Ok(hit.to_string());
    }

    let dir = self.locate(reference)?;
    println!("🔗 Publishing local dependency {} from {}", reference.full_name(), dir.display());

    let nested = PushOptions {
      dry_run: false,
      ..options.clone()
    };
    let outcome = self.perform_at(&dir, depth + 1, &nested)?;

    let published = outcome
      .references
      .iter()
      .filter_map(|r| ParsedReference::parse(r).ok())
      .find(|r| {
        r.handle.eq_ignore_ascii_case(&reference.handle)
          && r.name.eq_ignore_ascii_case(&reference.name)
          && !r.is_local()
      })
      .ok_or_else(|| KapError::DependencyNotFound {
        name: reference.full_name(),
        reason: format!("pushing {} did not produce a version of it", dir.display()),
      })?;

    let target = published.to_uri();
    self.cache.insert(key, target.clone());
    Ok(target)
  }

  /// Working copy of a local dependency: the session index first, then the local repository
  fn locate(&mut self, reference: &ParsedReference) -> KapResult<PathBuf> {
    let full_name = reference.full_name();
    let mut searched = Vec::new();

    if let Some(root) = self.root.clone() {
      let index = self.index.get_or_insert_with(|| LocalIndex::scan(&root));
      if let Some(dir) = index.find(&full_name) {
        return Ok(dir.to_path_buf());
      }
      searched.push(root.display().to_string());
    }

    if let Some(repository) = &self.repository_path {
      let linked = local::version_path(repository, &reference.handle, &reference.name, LOCAL_VERSION);
      if linked.exists() {
        return Ok(fs::canonicalize(&linked).unwrap_or(linked));
      }
      searched.push(linked.display().to_string());
    }

    Err(KapError::DependencyNotFound {
      name: full_name,
      reason: if searched.is_empty() {
        "no local asset index or repository to search".to_string()
      } else {
        format!("searched {}", searched.join(", "))
      },
    })
  }
}
