//! Publish orchestration
//!
//! A [`PushSession`] runs the publish pipeline for one asset directory and, recursively,
//! for every dependency that still points at an unpublished `local` working copy:
//!
//! 1. validate the definition file and the working directory
//! 2. pick and verify the artifact backend for the (indirected) kind
//! 3. publish local dependencies first and rewrite references to them
//! 4. build, test and checksum
//! 5. reserve versions, push artifacts, then commit (or abort on any failure)
//! 6. tag the commit for main-branch publishes

pub mod asset;
pub mod cache;
pub mod increment;
pub mod reservation;
mod resolver;
pub mod session;
pub mod tags;

#[cfg(test)]
pub mod testing;

pub use session::PushSession;

/// Nesting limit for local dependency pushes when nothing else is configured
pub const DEFAULT_MAX_DEPTH: usize = 16;

/// Flags of one `push` invocation
#[derive(Debug, Clone)]
pub struct PushOptions {
  /// Reserve and assemble everything, then abort instead of committing
  pub dry_run: bool,
  pub skip_tests: bool,
  /// Skip the clean / up-to-date working directory checks
  pub ignore_working_directory: bool,
  /// Print the assembled version records of a dry run
  pub verbose: bool,
  pub max_depth: usize,
}

impl Default for PushOptions {
  fn default() -> Self {
    Self {
      dry_run: false,
      skip_tests: false,
      ignore_working_directory: false,
      verbose: false,
      max_depth: DEFAULT_MAX_DEPTH,
    }
  }
}

/// Result of a push
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
  /// `kapeta://handle/name:version`, already existing versions first
  pub references: Vec<String>,
  pub main_branch: bool,
}
