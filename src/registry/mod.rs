//! Registry collaborator
//!
//! Reservation lifecycle, version lookups and dependency resolution against the remote
//! asset registry. Lookups that hit a 404 return `None`; every other failure is an error.

pub mod http;

pub use http::HttpRegistry;

use crate::core::error::KapResult;
use crate::model::{
  AssetDefinition, AssetReference, AssetVersion, ParsedReference, ReferenceMap, Reservation, ReservationRequest,
};

pub trait RegistryClient {
  /// Dependencies declared by an asset, as the registry understands them
  fn resolve_dependencies(&self, asset: &AssetDefinition) -> KapResult<Vec<AssetReference>>;

  /// Rewrite an asset's dependency references. Returns the rewritten document.
  fn update_dependencies(&self, asset: &AssetDefinition, mappings: &[ReferenceMap]) -> KapResult<AssetDefinition>;

  fn reserve_versions(&self, request: &ReservationRequest) -> KapResult<Reservation>;

  fn commit_reservation(&self, reservation_id: &str, versions: &[AssetVersion]) -> KapResult<()>;

  fn abort_reservation(&self, reservation: &Reservation) -> KapResult<()>;

  /// `full_name` is `handle/name`
  fn get_version(&self, full_name: &str, version: &str) -> KapResult<Option<AssetVersion>>;

  fn get_latest_version(&self, full_name: &str) -> KapResult<Option<AssetVersion>>;
}

/// Look up the version a reference points at (`latest` uses the latest lookup)
pub fn fetch_reference(registry: &dyn RegistryClient, reference: &ParsedReference) -> KapResult<Option<AssetVersion>> {
  if reference.version == crate::model::reference::LATEST_VERSION {
    registry.get_latest_version(&reference.full_name())
  } else {
    registry.get_version(&reference.full_name(), &reference.version)
  }
}
