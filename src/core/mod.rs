//! Core building blocks shared by every command
//!
//! - **config**: kapctl configuration (kapctl.toml) and environment overrides
//! - **context**: Application context built once in main
//! - **error**: Error types with contextual help messages and exit codes

pub mod config;
pub mod context;
pub mod error;
