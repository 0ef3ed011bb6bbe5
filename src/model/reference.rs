//! Asset references: `handle/name:version` pointers between assets

use crate::core::error::{KapResult, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version sentinel for an unpublished working copy
pub const LOCAL_VERSION: &str = "local";

/// Version used when a reference omits one
pub const LATEST_VERSION: &str = "latest";

/// Scheme of published reference strings
pub const REFERENCE_SCHEME: &str = "kapeta://";

/// A dependency pointer as reported by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetReference {
  /// `handle/name:version`, possibly prefixed with `kapeta://`
  pub name: String,
  #[serde(rename = "type", default)]
  pub reference_type: String,
}

impl AssetReference {
  pub fn parsed(&self) -> KapResult<ParsedReference> {
    self.name.parse()
  }
}

/// Rewrite instruction for a resolved local dependency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceMap {
  pub from: String,
  pub to: String,
}

/// A reference split into its parts
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedReference {
  pub handle: String,
  pub name: String,
  pub version: String,
}

impl ParsedReference {
  pub fn new(handle: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      handle: handle.into(),
      name: name.into(),
      version: version.into(),
    }
  }

  /// Parse `[kapeta://]handle/name[:version]`
  pub fn parse(reference: &str) -> KapResult<Self> {
    let invalid = || ValidationError::InvalidReference {
      reference: reference.to_string(),
    };

    let trimmed = reference.trim();
    let body = trimmed.strip_prefix(REFERENCE_SCHEME).unwrap_or(trimmed);
    let (full_name, version) = match body.rsplit_once(':') {
      Some((full_name, version)) => (full_name, version),
      None => (body, LATEST_VERSION),
    };
    let (handle, name) = full_name.split_once('/').ok_or_else(invalid)?;

    if handle.is_empty() || name.is_empty() || version.is_empty() || name.contains('/') {
      return Err(invalid().into());
    }

    Ok(Self::new(handle, name, version))
  }

  /// `handle/name`
  pub fn full_name(&self) -> String {
    format!("{}/{}", self.handle, self.name)
  }

  pub fn is_local(&self) -> bool {
    self.version == LOCAL_VERSION
  }

  /// `kapeta://handle/name:version`
  pub fn to_uri(&self) -> String {
    reference_uri(&self.full_name(), &self.version)
  }
}

impl fmt::Display for ParsedReference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}:{}", self.handle, self.name, self.version)
  }
}

impl FromStr for ParsedReference {
  type Err = crate::core::error::KapError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

/// Build a `kapeta://` reference from a full asset name and a version
pub fn reference_uri(full_name: &str, version: &str) -> String {
  format!("{}{}:{}", REFERENCE_SCHEME, full_name, version)
}

/// Split `handle/name` into its parts
pub fn split_full_name(full_name: &str) -> Option<(&str, &str)> {
  full_name
    .split_once('/')
    .filter(|(handle, name)| !handle.is_empty() && !name.is_empty())
}
