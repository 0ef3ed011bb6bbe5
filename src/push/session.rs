//! The publish pipeline for one push invocation

use super::asset::{LocalAsset, asset_paths, collect_attachments, read_readme, resolve_kind};
use super::cache::{LocalIndex, LocalMappingCache};
use super::increment::minimum_increment;
use super::reservation::ReservationGuard;
use super::tags::{VersionTag, apply_tags, tag_name};
use super::{PushOptions, PushOutcome};
use crate::artifacts::command::run_script;
use crate::artifacts::{ArtifactHandler, BackendResolver, BackendTarget};
use crate::core::error::{KapError, KapResult, PreconditionError};
use crate::model::{
  Artifact, AssetDefinition, AssetReference, AssetVersion, Repository, ReservationRequest, ReservedVersion,
  VersionIncrement, reference_uri,
};
use crate::registry::RegistryClient;
use crate::ui::progress::StepProgress;
use crate::vcs::{BranchInfo, VcsProvider, VersionControl};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const BUILD_SCRIPT: &str = "build.sh";
const TEST_SCRIPT: &str = "test.sh";

/// One top-level push, including every nested push of a local dependency
///
/// The session owns the state shared across that tree: the mapping cache, the index of
/// assets found under the root directory, and the stack of directories being pushed.
pub struct PushSession<'a> {
  pub(super) registry: &'a dyn RegistryClient,
  vcs: &'a dyn VcsProvider,
  backends: &'a dyn BackendResolver,
  pub(super) repository_path: Option<PathBuf>,
  pub(super) cache: LocalMappingCache,
  pub(super) index: Option<LocalIndex>,
  pub(super) root: Option<PathBuf>,
  stack: Vec<PathBuf>,
}

/// Everything gathered before versions are reserved
struct Prepared {
  asset: LocalAsset,
  vcs: Option<Box<dyn VersionControl>>,
  backend: Box<dyn ArtifactHandler>,
  commit: Option<String>,
  branch: BranchInfo,
  checksum: String,
  dependencies: HashMap<String, Vec<AssetReference>>,
}

impl<'a> PushSession<'a> {
  pub fn new(registry: &'a dyn RegistryClient, vcs: &'a dyn VcsProvider, backends: &'a dyn BackendResolver) -> Self {
    Self {
      registry,
      vcs,
      backends,
      repository_path: None,
      cache: LocalMappingCache::default(),
      index: None,
      root: None,
      stack: Vec::new(),
    }
  }

  /// Local asset repository searched for linked dependencies
  pub fn with_repository_path(mut self, path: PathBuf) -> Self {
    self.repository_path = Some(path);
    self
  }

  #[cfg(test)]
  pub fn cache(&self) -> &LocalMappingCache {
    &self.cache
  }

  /// Push the asset at `path` (a directory or its definition file)
  pub fn perform(&mut self, path: &Path, options: &PushOptions) -> KapResult<PushOutcome> {
    self.perform_at(path, 0, options)
  }

  pub(super) fn perform_at(&mut self, path: &Path, depth: usize, options: &PushOptions) -> KapResult<PushOutcome> {
    let (dir, definition_file) = asset_paths(path);

    if self.stack.contains(&dir) {
      let mut chain: Vec<String> = self.stack.iter().map(|d| d.display().to_string()).collect();
      chain.push(dir.display().to_string());
      return Err(KapError::DependencyCycle { chain });
    }
    if depth > options.max_depth {
      return Err(KapError::with_help(
        format!("Local dependencies nest deeper than {} levels at {}", options.max_depth, dir.display()),
        "Raise max_depth in kapctl.toml or publish some dependencies first.",
      ));
    }
    if depth == 0 {
      self.root = Some(dir.clone());
    }

    self.stack.push(dir.clone());
    let result = self.publish(&dir, &definition_file, depth, options);
    self.stack.pop();
    result
  }

  fn publish(
    &mut self,
    dir: &Path,
    definition_file: &Path,
    depth: usize,
    options: &PushOptions,
  ) -> KapResult<PushOutcome> {
    let vcs = self.vcs.detect(dir);
    let mut asset = LocalAsset::load(definition_file)?;
    println!("📦 Pushing {}", asset.names().join(", "));

    if let Some(vcs) = &vcs
      && !options.ignore_working_directory
    {
      if !vcs.is_working_directory_clean()? {
        return Err(KapError::Precondition(PreconditionError::DirtyWorkingDirectory {
          path: dir.to_path_buf(),
        }));
      }
      if !vcs.is_working_directory_up_to_date()? {
        return Err(KapError::Precondition(PreconditionError::NotUpToDate {
          path: dir.to_path_buf(),
        }));
      }
    }

    let kind = resolve_kind(self.registry, asset.kind())?;
    let backend = self.backends.resolve(&BackendTarget {
      kind: &kind,
      dir,
      definition_file: &asset.definition_file,
      asset_name: asset.definitions[0].name(),
    })?;
    backend.verify()?;
    tracing::debug!(backend = backend.name(), kind = %kind, "artifact backend ready");

    let commit = match &vcs {
      Some(vcs) => vcs.latest_commit()?,
      None => None,
    };
    let increment = match &vcs {
      Some(vcs) => self.increment_since_last_publish(vcs.as_ref(), &asset.definitions)?,
      None => VersionIncrement::None,
    };

    let resolved = self.resolve_dependencies(&mut asset.definitions, depth, options)?;
    let dependencies: HashMap<String, Vec<AssetReference>> = asset
      .definitions
      .iter()
      .map(|d| d.name().to_string())
      .zip(resolved)
      .collect();

    println!("🔨 Building {}", dir.display());
    run_step(dir, BUILD_SCRIPT, "build", || backend.build())?;

    if options.skip_tests {
      println!("⏭️  Skipping tests");
    } else {
      println!("🧪 Testing {}", dir.display());
      if let Err(e) = run_step(dir, TEST_SCRIPT, "test", || backend.test()) {
        tracing::error!(dir = %dir.display(), error = %e, "tests failed");
        return Err(KapError::TestsFailed);
      }
    }

    let branch = match &vcs {
      Some(vcs) => vcs.branch()?,
      None => BranchInfo::untracked(),
    };
    let checksum = backend.calculate_checksum()?;

    let request = ReservationRequest {
      assets: asset.definitions.clone(),
      main_branch: branch.main,
      branch_name: branch.branch.clone(),
      commit: commit.clone(),
      checksum: checksum.clone(),
      minimum_increment: increment,
    };
    let reservation = self.registry.reserve_versions(&request)?;
    tracing::debug!(reservation = %reservation.id, expires = %reservation.expires, "versions reserved");

    let prepared = Prepared {
      asset,
      vcs,
      backend,
      commit,
      branch,
      checksum,
      dependencies,
    };

    let mut guard = ReservationGuard::new(self.registry, reservation);
    let result = Self::complete(&mut guard, &prepared, options);
    if result.is_err() {
      guard.abort();
    }
    result
  }

  /// Highest increment implied by commits since each asset was last published
  fn increment_since_last_publish(
    &self,
    vcs: &dyn VersionControl,
    definitions: &[AssetDefinition],
  ) -> KapResult<VersionIncrement> {
    let mut increment = VersionIncrement::None;
    for definition in definitions {
      let baseline = self
        .registry
        .get_latest_version(definition.name())?
        .and_then(|v| v.repository)
        .and_then(|r| r.commit);
      let Some(baseline) = baseline else {
        continue;
      };
      let messages = vcs.commits_since(&baseline)?;
      increment = increment.max(minimum_increment(&messages));
    }
    Ok(increment)
  }

  /// Everything after the reservation exists; any error here leads to an abort
  fn complete(guard: &mut ReservationGuard<'_>, prepared: &Prepared, options: &PushOptions) -> KapResult<PushOutcome> {
    let versions = guard.reservation().versions.clone();
    if let Some(invalid) = versions.iter().find(|v| semver::Version::parse(&v.version).is_err()) {
      return Err(KapError::Reservation {
        message: format!("'{}' reserved for {} is not a semantic version", invalid.version, invalid.content.name()),
      });
    }

    let (existing, new): (Vec<ReservedVersion>, Vec<ReservedVersion>) = versions.into_iter().partition(|v| v.exists);
    let mut references: Vec<String> = existing
      .iter()
      .map(|v| reference_uri(v.content.name(), &v.version))
      .collect();
    for version in &existing {
      println!("⏭️  {}:{} already exists", version.content.name(), version.version);
    }

    let main_branch = prepared.branch.main;
    if new.is_empty() {
      guard.settle();
      return Ok(PushOutcome {
        references,
        main_branch,
      });
    }

    let multi_asset = prepared.asset.definitions.len() > 1;
    let tags: Vec<VersionTag> = if prepared.vcs.is_some() && main_branch {
      new
        .iter()
        .map(|v| VersionTag {
          name: tag_name(&v.version, v.content.short_name(), multi_asset),
          version: v.version.clone(),
        })
        .collect()
    } else {
      Vec::new()
    };

    let readme = read_readme(&prepared.asset.dir)?;
    let attachments = collect_attachments(&prepared.asset.dir)?;
    let repository = match &prepared.vcs {
      Some(vcs) => Some(Repository {
        repository_type: vcs.kind().to_string(),
        main: main_branch,
        commit: prepared.commit.clone(),
        branch: prepared.branch.branch.clone(),
        details: vcs.checkout_info()?,
      }),
      None => None,
    };

    let record = |reserved: &ReservedVersion, artifact: Option<Artifact>| {
      let mut content = reserved.content.clone();
      content.add_attachments(&attachments);
      AssetVersion {
        version: reserved.version.clone(),
        artifact,
        repository: repository.clone(),
        dependencies: prepared.dependencies.get(content.name()).cloned().unwrap_or_default(),
        content,
        checksum: Some(prepared.checksum.clone()),
        readme: readme.clone(),
        current: main_branch.then_some(true),
      }
    };

    if options.dry_run {
      let records: Vec<AssetVersion> = new.iter().map(|v| record(v, None)).collect();
      if options.verbose {
        println!("{}", serde_json::to_string_pretty(&records)?);
      }
      guard.abort();
      println!("🧪 Dry run: reservation aborted, nothing was published");
    } else {
      let mut progress = StepProgress::for_steps(new.len(), "Pushing artifacts");
      let mut records = Vec::with_capacity(new.len());
      for reserved in &new {
        let artifact = prepared
          .backend
          .push(reserved.content.name(), &reserved.version, prepared.commit.as_deref())?;
        records.push(record(reserved, Some(artifact)));
        if let Some(progress) = progress.as_mut() {
          progress.inc();
        }
      }

      guard.commit(&records)?;
      for version in &records {
        println!("✅ Published {}:{}", version.content.name(), version.version);
      }

      if let Some(vcs) = &prepared.vcs {
        tag_versions(vcs.as_ref(), &tags);
      }
    }

    references.extend(new.iter().map(|v| reference_uri(v.content.name(), &v.version)));
    Ok(PushOutcome {
      references,
      main_branch,
    })
  }
}

/// Run `<script>` from the asset directory when present, the backend step otherwise
fn run_step(dir: &Path, script: &str, step: &str, backend_step: impl FnOnce() -> KapResult<()>) -> KapResult<()> {
  let script = dir.join(script);
  if script.is_file() {
    run_script(step, dir, &script)
  } else {
    backend_step()
  }
}

/// Tag the committed versions; the versions are already published, so nothing here fails the push
fn tag_versions(vcs: &dyn VersionControl, tags: &[VersionTag]) {
  if tags.is_empty() {
    return;
  }
  for (tag, result) in apply_tags(vcs, tags) {
    match result {
      Ok(true) => println!("🏷️  Tagged {}", tag),
      Ok(false) => tracing::warn!(tag = %tag, "tag already exists"),
      Err(e) => tracing::warn!(tag = %tag, error = %e, "failed to create tag"),
    }
  }
  if let Err(e) = vcs.push_tags() {
    tracing::warn!(error = %e, "failed to push tags");
  }
}
