use crate::core::error::{ConfigError, KapError, KapResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for kapctl
/// Searched in order: $KAPETA_HOME/kapctl.toml, ~/.kapeta/kapctl.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KapConfig {
  /// Registry base URL
  #[serde(default = "default_registry_url")]
  pub registry_url: String,

  /// Bearer token sent to the registry
  #[serde(default)]
  pub auth_token: Option<String>,

  /// Docker registry host used to name images
  #[serde(default = "default_docker_registry")]
  pub docker_registry: String,

  /// Local asset repository (default: ~/.kapeta/repository)
  #[serde(default)]
  pub repository_path: Option<PathBuf>,

  /// Maximum nesting of local dependency pushes
  #[serde(default = "default_max_depth")]
  pub max_depth: usize,

  #[serde(default = "default_connect_timeout")]
  pub connect_timeout_secs: u64,

  #[serde(default = "default_request_timeout")]
  pub request_timeout_secs: u64,
}

fn default_registry_url() -> String {
  "https://registry.kapeta.com".to_string()
}

fn default_docker_registry() -> String {
  "docker.kapeta.com".to_string()
}

fn default_max_depth() -> usize {
  16
}

fn default_connect_timeout() -> u64 {
  30
}

fn default_request_timeout() -> u64 {
  300
}

impl Default for KapConfig {
  fn default() -> Self {
    Self {
      registry_url: default_registry_url(),
      auth_token: None,
      docker_registry: default_docker_registry(),
      repository_path: None,
      max_depth: default_max_depth(),
      connect_timeout_secs: default_connect_timeout(),
      request_timeout_secs: default_request_timeout(),
    }
  }
}

impl KapConfig {
  /// Kapeta home directory: $KAPETA_HOME or ~/.kapeta
  pub fn home_dir() -> KapResult<PathBuf> {
    if let Ok(home) = std::env::var("KAPETA_HOME")
      && !home.is_empty()
    {
      return Ok(PathBuf::from(home));
    }
    dirs::home_dir()
      .map(|home| home.join(".kapeta"))
      .ok_or(KapError::Config(ConfigError::NoHome))
  }

  /// Find config file in search order
  pub fn find_config_path() -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(home) = std::env::var("KAPETA_HOME")
      && !home.is_empty()
    {
      candidates.push(PathBuf::from(home).join("kapctl.toml"));
    }
    if let Some(home) = dirs::home_dir() {
      candidates.push(home.join(".kapeta").join("kapctl.toml"));
    }

    candidates.into_iter().find(|p| p.is_file())
  }

  /// Load config with environment overrides applied. A missing file yields defaults.
  pub fn load() -> KapResult<Self> {
    let mut config = match Self::find_config_path() {
      Some(path) => Self::load_from(&path)?,
      None => Self::default(),
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
  }

  /// Load config from an explicit file
  pub fn load_from(path: &Path) -> KapResult<Self> {
    let content =
      fs::read_to_string(path).with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: KapConfig = toml_edit::de::from_str(&content).map_err(|e| {
      KapError::Config(ConfigError::Invalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
      })
    })?;
    config.validate().map_err(|e| {
      KapError::Config(ConfigError::Invalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
      })
    })?;
    Ok(config)
  }

  fn apply_env(&mut self) {
    if let Ok(url) = std::env::var("KAPETA_REGISTRY_URL")
      && !url.is_empty()
    {
      self.registry_url = url;
    }
    if let Ok(token) = std::env::var("KAPETA_TOKEN")
      && !token.is_empty()
    {
      self.auth_token = Some(token);
    }
  }

  /// Override the registry URL (CLI `--registry` wins over file and env)
  pub fn with_registry_url(mut self, url: Option<String>) -> Self {
    if let Some(url) = url {
      self.registry_url = url;
    }
    self
  }

  /// Validate configuration values
  pub fn validate(&self) -> KapResult<()> {
    if self.registry_url.trim().is_empty() {
      return Err(KapError::message("registry_url must not be empty"));
    }
    if self.max_depth == 0 {
      return Err(KapError::message("max_depth must be at least 1"));
    }
    Ok(())
  }

  /// Resolved local asset repository path
  pub fn repository_path(&self) -> KapResult<PathBuf> {
    match &self.repository_path {
      Some(path) => Ok(path.clone()),
      None => Ok(Self::home_dir()?.join("repository")),
    }
  }

  /// Registry URL without a trailing slash
  pub fn registry_base(&self) -> &str {
    self.registry_url.trim_end_matches('/')
  }
}
