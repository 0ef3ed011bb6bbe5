//! Version tags for main-branch publishes

use crate::core::error::KapResult;
use crate::vcs::VersionControl;

/// A version tag to create once the reservation is committed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionTag {
  pub name: String,
  pub version: String,
}

/// `v{version}` for single-asset files, `v{version}-{name}` otherwise
pub fn tag_name(version: &str, short_name: &str, multi_asset: bool) -> String {
  if multi_asset {
    format!("v{}-{}", version, short_name)
  } else {
    format!("v{}", version)
  }
}

/// Create every tag, reporting each outcome instead of failing on the first
pub fn apply_tags(vcs: &dyn VersionControl, tags: &[VersionTag]) -> Vec<(String, KapResult<bool>)> {
  tags.iter().map(|tag| (tag.name.clone(), vcs.tag(&tag.name))).collect()
}
