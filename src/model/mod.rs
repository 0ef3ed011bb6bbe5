//! Asset data model
//!
//! - **definition**: `kapeta.yml` documents and their loader/validator
//! - **reference**: `handle/name:version` pointers and rewrite maps
//! - **version**: reservations, published versions and their parts

pub mod definition;
pub mod reference;
pub mod version;

pub use definition::{AssetDefinition, DEFINITION_FILE, load_definitions};
pub use reference::{AssetReference, ParsedReference, ReferenceMap, reference_uri};
pub use version::{
  Artifact, AssetVersion, Attachment, AttachmentContent, Readme, ReadmeType, Repository, Reservation,
  ReservationRequest, ReservedVersion, VersionIncrement,
};
