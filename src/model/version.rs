//! Registry records: reservations and published versions

use crate::model::definition::AssetDefinition;
use crate::model::reference::AssetReference;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Minimum version increment suggested to the registry
///
/// Ordered by severity: `None < Patch < Minor < Major`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum VersionIncrement {
  #[default]
  None,
  Patch,
  Minor,
  Major,
}

impl fmt::Display for VersionIncrement {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VersionIncrement::None => write!(f, "NONE"),
      VersionIncrement::Patch => write!(f, "PATCH"),
      VersionIncrement::Minor => write!(f, "MINOR"),
      VersionIncrement::Major => write!(f, "MAJOR"),
    }
  }
}

/// Request to reserve version numbers for the assets of one definition file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
  pub assets: Vec<AssetDefinition>,
  pub main_branch: bool,
  pub branch_name: String,
  pub commit: Option<String>,
  pub checksum: String,
  pub minimum_increment: VersionIncrement,
}

/// Server-issued, time-bounded claim on version numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
  pub id: String,
  pub expires: DateTime<Utc>,
  #[serde(default)]
  pub versions: Vec<ReservedVersion>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservedVersion {
  pub owner_id: String,
  pub version: String,
  pub content: AssetDefinition,
  #[serde(default)]
  pub exists: bool,
}

/// Packaging metadata returned by an artifact backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
  #[serde(rename = "type")]
  pub artifact_type: String,
  #[serde(default, skip_serializing_if = "Value::is_null")]
  pub details: Value,
}

impl Artifact {
  /// Artifact of definition-only assets
  pub fn none() -> Self {
    Self {
      artifact_type: "none".to_string(),
      details: Value::Null,
    }
  }
}

/// VCS provenance of a published version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
  #[serde(rename = "type")]
  pub repository_type: String,
  pub main: bool,
  pub commit: Option<String>,
  pub branch: String,
  #[serde(default, skip_serializing_if = "Value::is_null")]
  pub details: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadmeType {
  Markdown,
  Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Readme {
  #[serde(rename = "type")]
  pub readme_type: ReadmeType,
  pub content: String,
}

/// File embedded in an asset definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
  pub filename: String,
  pub content_type: String,
  pub content: AttachmentContent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentContent {
  pub format: String,
  pub value: String,
}

/// Published version record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetVersion {
  pub version: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub artifact: Option<Artifact>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub repository: Option<Repository>,
  pub content: AssetDefinition,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub checksum: Option<String>,
  #[serde(default)]
  pub dependencies: Vec<AssetReference>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub readme: Option<Readme>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub current: Option<bool>,
}
