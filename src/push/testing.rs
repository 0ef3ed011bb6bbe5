//! In-memory collaborators for exercising the push pipeline

use crate::artifacts::{ArtifactHandler, BackendResolver, BackendTarget};
use crate::core::error::{GitError, KapError, KapResult, RegistryError};
use crate::model::{
  Artifact, AssetDefinition, AssetReference, AssetVersion, DEFINITION_FILE, ReferenceMap, Repository, Reservation,
  ReservationRequest, ReservedVersion,
};
use crate::model::definition::Metadata;
use crate::registry::RegistryClient;
use crate::vcs::{BranchInfo, VcsProvider, VersionControl};
use serde_json::{Map, Value, json};
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::rc::Rc;

/// Minimal definition with a name and kind
pub fn definition(name: &str, kind: &str) -> AssetDefinition {
  AssetDefinition {
    kind: kind.to_string(),
    metadata: Metadata {
      name: name.to_string(),
      extra: Map::new(),
    },
    spec: Value::Null,
    attachments: None,
    extra: Map::new(),
  }
}

/// Write a `kapeta.yml` declaring one asset per `(name, dependencies)` pair
pub fn write_assets(dir: &Path, assets: &[(&str, &[&str])]) {
  fs::create_dir_all(dir).unwrap();
  let documents: Vec<String> = assets
    .iter()
    .map(|(name, deps)| {
      let deps: Vec<String> = deps.iter().map(|d| format!("    - {}\n", d)).collect();
      let spec = if deps.is_empty() {
        String::new()
      } else {
        format!("spec:\n  dependencies:\n{}", deps.concat())
      };
      format!("kind: core/block-type\nmetadata:\n  name: {}\n{}", name, spec)
    })
    .collect();
  fs::write(dir.join(DEFINITION_FILE), documents.join("---\n")).unwrap();
}

pub fn reservation(id: &str, versions: &[ReservedVersion]) -> Reservation {
  Reservation {
    id: id.to_string(),
    expires: chrono::Utc::now() + chrono::Duration::hours(1),
    versions: versions.to_vec(),
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegistryCall {
  Resolve(String),
  Update(String, Vec<ReferenceMap>),
  Reserve(ReservationRequest),
  Commit(String, Vec<AssetVersion>),
  Abort(String),
  GetVersion(String, String),
  Latest(String),
}

impl RegistryCall {
  fn is_lifecycle(&self) -> bool {
    matches!(
      self,
      RegistryCall::Reserve(_) | RegistryCall::Commit(..) | RegistryCall::Abort(_)
    )
  }
}

/// Registry that hands out `1.0.0` (or a configured version) and remembers every call
#[derive(Default)]
pub struct FakeRegistry {
  fail_abort: bool,
  fail_commit: bool,
  empty_reservations: bool,
  existing: HashSet<String>,
  next_versions: HashMap<String, String>,
  published: RefCell<Vec<AssetVersion>>,
  calls: RefCell<Vec<RegistryCall>>,
  reservations: Cell<usize>,
}

impl FakeRegistry {
  pub fn with_failing_abort(mut self) -> Self {
    self.fail_abort = true;
    self
  }

  pub fn with_failing_commit(mut self) -> Self {
    self.fail_commit = true;
    self
  }

  pub fn with_empty_reservations(mut self) -> Self {
    self.empty_reservations = true;
    self
  }

  /// Reserved versions of `name` already exist in the registry
  pub fn with_existing(mut self, name: &str) -> Self {
    self.existing.insert(name.to_string());
    self
  }

  pub fn with_next_version(mut self, name: &str, version: &str) -> Self {
    self.next_versions.insert(name.to_string(), version.to_string());
    self
  }

  /// Seed a published version
  pub fn publish(&self, name: &str, version: &str, content: AssetDefinition) {
    self.publish_at(name, version, content, None);
  }

  /// Seed a published version recorded at `commit`
  pub fn publish_at(&self, name: &str, version: &str, mut content: AssetDefinition, commit: Option<&str>) {
    content.metadata.name = name.to_string();
    self.published.borrow_mut().push(AssetVersion {
      version: version.to_string(),
      artifact: None,
      repository: commit.map(|c| Repository {
        repository_type: "git".to_string(),
        main: true,
        commit: Some(c.to_string()),
        branch: "main".to_string(),
        details: Value::Null,
      }),
      content,
      checksum: None,
      dependencies: Vec::new(),
      readme: None,
      current: Some(true),
    });
  }

  pub fn calls(&self) -> Vec<RegistryCall> {
    self.calls.borrow().clone()
  }

  /// Only reserve, commit and abort calls
  pub fn lifecycle_calls(&self) -> Vec<RegistryCall> {
    self.calls.borrow().iter().filter(|c| c.is_lifecycle()).cloned().collect()
  }

  pub fn commits(&self) -> Vec<(String, Vec<AssetVersion>)> {
    self
      .calls
      .borrow()
      .iter()
      .filter_map(|c| match c {
        RegistryCall::Commit(id, versions) => Some((id.clone(), versions.clone())),
        _ => None,
      })
      .collect()
  }

  pub fn reserve_requests(&self) -> Vec<ReservationRequest> {
    self
      .calls
      .borrow()
      .iter()
      .filter_map(|c| match c {
        RegistryCall::Reserve(request) => Some(request.clone()),
        _ => None,
      })
      .collect()
  }

  fn record(&self, call: RegistryCall) {
    self.calls.borrow_mut().push(call);
  }
}

impl RegistryClient for FakeRegistry {
  fn resolve_dependencies(&self, asset: &AssetDefinition) -> KapResult<Vec<AssetReference>> {
    self.record(RegistryCall::Resolve(asset.name().to_string()));
    let references = asset
      .spec
      .get("dependencies")
      .and_then(Value::as_array)
      .map(|deps| {
        deps
          .iter()
          .filter_map(Value::as_str)
          .map(|name| AssetReference {
            name: name.to_string(),
            reference_type: "core/block-type".to_string(),
          })
          .collect()
      })
      .unwrap_or_default();
    Ok(references)
  }

  fn update_dependencies(&self, asset: &AssetDefinition, mappings: &[ReferenceMap]) -> KapResult<AssetDefinition> {
    self.record(RegistryCall::Update(asset.name().to_string(), mappings.to_vec()));
    let mut raw = serde_json::to_string(asset)?;
    for mapping in mappings {
      raw = raw.replace(&mapping.from, &mapping.to);
    }
    Ok(serde_json::from_str(&raw)?)
  }

  fn reserve_versions(&self, request: &ReservationRequest) -> KapResult<Reservation> {
    self.record(RegistryCall::Reserve(request.clone()));
    let n = self.reservations.get() + 1;
    self.reservations.set(n);

    let versions: Vec<ReservedVersion> = if self.empty_reservations {
      Vec::new()
    } else {
      request
        .assets
        .iter()
        .map(|asset| ReservedVersion {
          owner_id: "owner".to_string(),
          version: self
            .next_versions
            .get(asset.name())
            .cloned()
            .unwrap_or_else(|| "1.0.0".to_string()),
          content: asset.clone(),
          exists: self.existing.contains(asset.name()),
        })
        .collect()
    };
    Ok(reservation(&format!("res-{}", n), &versions))
  }

  fn commit_reservation(&self, reservation_id: &str, versions: &[AssetVersion]) -> KapResult<()> {
    self.record(RegistryCall::Commit(reservation_id.to_string(), versions.to_vec()));
    if self.fail_commit {
      return Err(
        RegistryError::Response {
          status: 500,
          message: "commit rejected".to_string(),
        }
        .into(),
      );
    }
    self.published.borrow_mut().extend(versions.iter().cloned());
    Ok(())
  }

  fn abort_reservation(&self, reservation: &Reservation) -> KapResult<()> {
    self.record(RegistryCall::Abort(reservation.id.clone()));
    if self.fail_abort {
      return Err(RegistryError::Unavailable { url: "fake".to_string() }.into());
    }
    Ok(())
  }

  fn get_version(&self, full_name: &str, version: &str) -> KapResult<Option<AssetVersion>> {
    self.record(RegistryCall::GetVersion(full_name.to_string(), version.to_string()));
    Ok(
      self
        .published
        .borrow()
        .iter()
        .find(|v| v.content.name() == full_name && v.version == version)
        .cloned(),
    )
  }

  fn get_latest_version(&self, full_name: &str) -> KapResult<Option<AssetVersion>> {
    self.record(RegistryCall::Latest(full_name.to_string()));
    Ok(
      self
        .published
        .borrow()
        .iter()
        .rev()
        .find(|v| v.content.name() == full_name)
        .cloned(),
    )
  }
}

#[derive(Debug)]
pub struct VcsState {
  pub commit: Option<String>,
  pub commits: Vec<String>,
  pub branch: BranchInfo,
  pub dirty: bool,
  pub behind: bool,
  pub fail_tags: bool,
  pub tags: Vec<String>,
  pub tag_pushes: usize,
  pub commits_since: Vec<String>,
}

impl Default for VcsState {
  fn default() -> Self {
    Self {
      commit: Some("abc123".to_string()),
      commits: Vec::new(),
      branch: BranchInfo {
        branch: "main".to_string(),
        main: true,
      },
      dirty: false,
      behind: false,
      fail_tags: false,
      tags: Vec::new(),
      tag_pushes: 0,
      commits_since: Vec::new(),
    }
  }
}

/// Scripted repository; clones share state
#[derive(Debug, Clone, Default)]
pub struct FakeVcs {
  pub state: Rc<RefCell<VcsState>>,
}

impl VersionControl for FakeVcs {
  fn kind(&self) -> &'static str {
    "git"
  }

  fn latest_commit(&self) -> KapResult<Option<String>> {
    Ok(self.state.borrow().commit.clone())
  }

  fn commits_since(&self, commit: &str) -> KapResult<Vec<String>> {
    let mut state = self.state.borrow_mut();
    state.commits_since.push(commit.to_string());
    Ok(state.commits.clone())
  }

  fn branch(&self) -> KapResult<BranchInfo> {
    Ok(self.state.borrow().branch.clone())
  }

  fn checkout_info(&self) -> KapResult<Value> {
    Ok(json!({ "url": "git@example.com:acme/assets.git", "path": "." }))
  }

  fn is_working_directory_clean(&self) -> KapResult<bool> {
    Ok(!self.state.borrow().dirty)
  }

  fn is_working_directory_up_to_date(&self) -> KapResult<bool> {
    Ok(!self.state.borrow().behind)
  }

  fn tag(&self, tag: &str) -> KapResult<bool> {
    let mut state = self.state.borrow_mut();
    if state.fail_tags {
      return Err(KapError::Git(GitError::CommandFailed {
        command: format!("git tag {}", tag),
        stderr: "fatal: cannot lock ref".to_string(),
      }));
    }
    if state.tags.iter().any(|t| t == tag) {
      return Ok(false);
    }
    state.tags.push(tag.to_string());
    Ok(true)
  }

  fn push_tags(&self) -> KapResult<()> {
    self.state.borrow_mut().tag_pushes += 1;
    Ok(())
  }
}

/// Hands out the same repository for every directory, or none at all
#[derive(Debug, Clone, Default)]
pub struct FakeVcsProvider {
  vcs: Option<FakeVcs>,
}

impl FakeVcsProvider {
  pub fn none() -> Self {
    Self { vcs: None }
  }

  pub fn with(vcs: FakeVcs) -> Self {
    Self { vcs: Some(vcs) }
  }
}

impl VcsProvider for FakeVcsProvider {
  fn detect(&self, _dir: &Path) -> Option<Box<dyn VersionControl>> {
    self.vcs.clone().map(|vcs| Box::new(vcs) as Box<dyn VersionControl>)
  }
}

#[derive(Debug, Default)]
pub struct BackendLog {
  /// `"<asset> <step>"` entries in call order
  pub events: Vec<String>,
  pub fail_build: bool,
  pub fail_test: bool,
  pub fail_push: bool,
}

/// Backend resolver whose backends only record what they are asked to do
#[derive(Debug, Clone, Default)]
pub struct FakeBackends {
  pub log: Rc<RefCell<BackendLog>>,
}

impl FakeBackends {
  pub fn events(&self) -> Vec<String> {
    self.log.borrow().events.clone()
  }

  pub fn count(&self, step: &str) -> usize {
    self
      .log
      .borrow()
      .events
      .iter()
      .filter(|e| e.split(' ').nth(1) == Some(step))
      .count()
  }
}

impl BackendResolver for FakeBackends {
  fn resolve(&self, target: &BackendTarget<'_>) -> KapResult<Box<dyn ArtifactHandler>> {
    Ok(Box::new(FakeBackend {
      label: target.asset_name.to_string(),
      log: Rc::clone(&self.log),
    }))
  }
}

struct FakeBackend {
  label: String,
  log: Rc<RefCell<BackendLog>>,
}

impl FakeBackend {
  fn record(&self, step: &str) {
    self.log.borrow_mut().events.push(format!("{} {}", self.label, step));
  }
}

impl ArtifactHandler for FakeBackend {
  fn name(&self) -> &'static str {
    "fake"
  }

  fn verify(&self) -> KapResult<()> {
    self.record("verify");
    Ok(())
  }

  fn calculate_checksum(&self) -> KapResult<String> {
    self.record("checksum");
    Ok(format!("sha-{}", self.label))
  }

  fn build(&self) -> KapResult<()> {
    self.record("build");
    if self.log.borrow().fail_build {
      return Err(KapError::build("build", "compilation failed"));
    }
    Ok(())
  }

  fn test(&self) -> KapResult<()> {
    self.record("test");
    if self.log.borrow().fail_test {
      return Err(KapError::build("test", "1 test failed"));
    }
    Ok(())
  }

  fn push(&self, name: &str, version: &str, _commit: Option<&str>) -> KapResult<Artifact> {
    self.record("push");
    if self.log.borrow().fail_push {
      return Err(KapError::build("push", "upload refused"));
    }
    Ok(Artifact {
      artifact_type: "fake".to_string(),
      details: json!({ "name": name, "version": version }),
    })
  }
}
