//! Application context - build once, pass everywhere
//!
//! ```text
//! main.rs:
//!   AppContext::build(--registry) -> &AppContext
//!   |
//!   v
//! commands/push.rs, install.rs, etc:
//!   fn run_*(ctx: &AppContext, ...)
//! ```

use crate::artifacts::{BackendRegistry, BackendSettings};
use crate::core::config::KapConfig;
use crate::core::error::KapResult;
use crate::local::LocalRepository;
use crate::registry::HttpRegistry;
use crate::vcs::GitProvider;

/// Configuration and collaborators shared by all commands
pub struct AppContext {
  pub config: KapConfig,
  pub registry: HttpRegistry,
  pub backends: BackendRegistry,
  pub vcs: GitProvider,
  pub repository: LocalRepository,
}

impl AppContext {
  /// Load configuration (file, environment, then `registry_override`) and build the clients
  pub fn build(registry_override: Option<String>) -> KapResult<Self> {
    let config = KapConfig::load()?.with_registry_url(registry_override);
    config.validate()?;
    Self::from_config(config)
  }

  pub fn from_config(config: KapConfig) -> KapResult<Self> {
    let registry = HttpRegistry::new(&config)?;
    let backends = BackendRegistry::with_defaults(BackendSettings {
      docker_registry: config.docker_registry.clone(),
    });
    let repository = LocalRepository::new(config.repository_path()?);
    tracing::debug!(registry = registry.base_url(), repository = %repository.root().display(), "context ready");

    Ok(Self {
      config,
      registry,
      backends,
      vcs: GitProvider,
      repository,
    })
  }
}
