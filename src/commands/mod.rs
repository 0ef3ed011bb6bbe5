//! CLI commands for kapctl
//!
//! ## Publishing
//! - **push**: Publish an asset, publishing local dependencies first
//! - **view**: Show a published version
//!
//! ## Local repository
//! - **link**: Link a working copy as the `local` version of its assets
//! - **uninstall**: Remove installed versions or links
//! - **install**: Install published definitions and their dependencies
//! - **clone**: Check out the source of a published version and link it
//!
//! All commands accept `&AppContext` so configuration and clients are built once.

pub mod install;
pub mod link;
pub mod push;
pub mod view;

pub use install::{CloneOptions, run_clone, run_install};
pub use link::{run_link, run_uninstall};
pub use push::run_push;
pub use view::run_view;
