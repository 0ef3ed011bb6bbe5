//! Error types for kapctl with contextual messages and exit codes
//!
//! Every failure in the publish pipeline maps onto one category so the CLI can pick an
//! exit code and print a short, actionable help line.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for kapctl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (bad manifest, dirty working directory, missing dependency)
  User = 1,
  /// System error (git, registry, I/O, build tools)
  System = 2,
  /// Validation failure (tests failed, reservation refused)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for kapctl
#[derive(Debug)]
pub enum KapError {
  /// Asset definition could not be loaded or is invalid
  Validation(ValidationError),

  /// Working directory is not in a publishable state
  Precondition(PreconditionError),

  /// A `local` dependency could not be located or resolved
  DependencyNotFound { name: String, reason: String },

  /// Local dependencies refer back to an asset that is already being pushed
  DependencyCycle { chain: Vec<String> },

  /// Registry refused to reserve versions or returned nothing
  Reservation { message: String },

  /// Tests failed. The cause is logged, not carried.
  TestsFailed,

  /// Build tool or backend step failed
  Build { step: String, message: String },

  /// Registry communication errors
  Registry(RegistryError),

  /// Git operation errors
  Git(GitError),

  /// Configuration errors
  Config(ConfigError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl KapError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    KapError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    KapError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Create a build error for a named step
  pub fn build(step: impl Into<String>, message: impl Into<String>) -> Self {
    KapError::Build {
      step: step.into(),
      message: message.into(),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      KapError::Message { message, context, help } => KapError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      KapError::Io(err) => KapError::Message {
        message: format!("{}: {}", ctx_str, err),
        context: None,
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      KapError::Validation(_) => ExitCode::User,
      KapError::Precondition(_) => ExitCode::User,
      KapError::DependencyNotFound { .. } => ExitCode::User,
      KapError::DependencyCycle { .. } => ExitCode::User,
      KapError::Config(_) => ExitCode::User,
      KapError::Reservation { .. } => ExitCode::Validation,
      KapError::TestsFailed => ExitCode::Validation,
      KapError::Build { .. } => ExitCode::System,
      KapError::Registry(_) => ExitCode::System,
      KapError::Git(_) => ExitCode::System,
      KapError::Io(_) => ExitCode::System,
      KapError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      KapError::Validation(e) => e.help_message(),
      KapError::Precondition(e) => Some(e.help_message()),
      KapError::Registry(e) => e.help_message(),
      KapError::Git(e) => e.help_message(),
      KapError::Config(e) => e.help_message(),
      KapError::DependencyNotFound { .. } => {
        Some("Run `kapctl link` in the dependency's directory, or publish it first.".to_string())
      }
      KapError::DependencyCycle { .. } => {
        Some("Local dependencies must form a tree. Publish one side of the cycle first.".to_string())
      }
      KapError::TestsFailed => Some("Fix the failing tests or rerun with --skip-tests.".to_string()),
      KapError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for KapError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      KapError::Validation(e) => write!(f, "{}", e),
      KapError::Precondition(e) => write!(f, "{}", e),
      KapError::DependencyNotFound { name, reason } => {
        write!(f, "Dependency not found: {} ({})", name, reason)
      }
      KapError::DependencyCycle { chain } => {
        write!(f, "Local dependency cycle detected: {}", chain.join(" -> "))
      }
      KapError::Reservation { message } => write!(f, "Failed to reserve versions: {}", message),
      KapError::TestsFailed => write!(f, "Tests failed"),
      KapError::Build { step, message } => write!(f, "{} failed: {}", step, message),
      KapError::Registry(e) => write!(f, "{}", e),
      KapError::Git(e) => write!(f, "{}", e),
      KapError::Config(e) => write!(f, "{}", e),
      KapError::Io(e) => write!(f, "I/O error: {}", e),
      KapError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for KapError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      KapError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for KapError {
  fn from(err: io::Error) -> Self {
    KapError::Io(err)
  }
}

impl From<String> for KapError {
  fn from(msg: String) -> Self {
    KapError::message(msg)
  }
}

impl From<&str> for KapError {
  fn from(msg: &str) -> Self {
    KapError::message(msg)
  }
}

impl From<ValidationError> for KapError {
  fn from(err: ValidationError) -> Self {
    KapError::Validation(err)
  }
}

impl From<RegistryError> for KapError {
  fn from(err: RegistryError) -> Self {
    KapError::Registry(err)
  }
}

impl From<toml_edit::de::Error> for KapError {
  fn from(err: toml_edit::de::Error) -> Self {
    KapError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for KapError {
  fn from(err: serde_json::Error) -> Self {
    KapError::message(format!("JSON error: {}", err))
  }
}

impl From<serde_yaml::Error> for KapError {
  fn from(err: serde_yaml::Error) -> Self {
    KapError::message(format!("YAML error: {}", err))
  }
}

impl From<walkdir::Error> for KapError {
  fn from(err: walkdir::Error) -> Self {
    KapError::message(format!("Directory traversal error: {}", err))
  }
}

impl From<std::path::StripPrefixError> for KapError {
  fn from(err: std::path::StripPrefixError) -> Self {
    KapError::message(format!("Path strip prefix error: {}", err))
  }
}

/// Asset definition validation errors
#[derive(Debug)]
pub enum ValidationError {
  /// Definition file does not exist
  FileNotFound { path: PathBuf },

  /// Path exists but is a directory or special file
  NotAFile { path: PathBuf },

  /// File could not be parsed as YAML/JSON
  Parse { path: PathBuf, reason: String },

  /// File contained no documents
  Empty { path: PathBuf },

  /// A document has no `metadata` section
  MissingMetadata { path: PathBuf, index: usize },

  /// A document has no `metadata.name`
  MissingName { path: PathBuf, index: usize },

  /// Two documents in one file share a name
  DuplicateName { path: PathBuf, name: String },

  /// Asset kind could not be resolved to a built-in kind
  UnknownKind { kind: String, reason: String },

  /// No artifact backend can handle this asset
  UnsupportedAsset { kind: String, path: PathBuf },

  /// Malformed asset reference string
  InvalidReference { reference: String },
}

impl ValidationError {
  fn help_message(&self) -> Option<String> {
    match self {
      ValidationError::FileNotFound { .. } => {
        Some("Run kapctl from an asset directory or pass the path to its kapeta.yml.".to_string())
      }
      ValidationError::MissingMetadata { .. } | ValidationError::MissingName { .. } => {
        Some("Every document needs `metadata.name` in the form `handle/name`.".to_string())
      }
      ValidationError::UnsupportedAsset { .. } => {
        Some("Supported layouts: Dockerfile, pom.xml, package.json, or kind core/plan.".to_string())
      }
      ValidationError::InvalidReference { .. } => {
        Some("References look like `handle/name:version`, optionally prefixed with kapeta://".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationError::FileNotFound { path } => write!(f, "File not found: {}", path.display()),
      ValidationError::NotAFile { path } => write!(f, "Not a file: {}", path.display()),
      ValidationError::Parse { path, reason } => {
        write!(f, "Failed to parse {}: {}", path.display(), reason)
      }
      ValidationError::Empty { path } => write!(f, "No asset definitions found in {}", path.display()),
      ValidationError::MissingMetadata { path, index } => {
        write!(f, "Document #{} in {} is missing metadata", index + 1, path.display())
      }
      ValidationError::MissingName { path, index } => {
        write!(f, "Document #{} in {} is missing metadata.name", index + 1, path.display())
      }
      ValidationError::DuplicateName { path, name } => {
        write!(f, "Asset '{}' is defined more than once in {}", name, path.display())
      }
      ValidationError::UnknownKind { kind, reason } => {
        write!(f, "Could not resolve asset kind '{}': {}", kind, reason)
      }
      ValidationError::UnsupportedAsset { kind, path } => {
        write!(
          f,
          "No artifact handler found for kind '{}' in {}",
          kind,
          path.display()
        )
      }
      ValidationError::InvalidReference { reference } => {
        write!(f, "Invalid asset reference: '{}'", reference)
      }
    }
  }
}

/// Working directory preconditions
#[derive(Debug)]
pub enum PreconditionError {
  /// Uncommitted changes present
  DirtyWorkingDirectory { path: PathBuf },

  /// Local branch is behind or diverged from its remote
  NotUpToDate { path: PathBuf },
}

impl PreconditionError {
  fn help_message(&self) -> String {
    "Use --ignore-working-directory to push anyway.".to_string()
  }
}

impl fmt::Display for PreconditionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PreconditionError::DirtyWorkingDirectory { path } => write!(
        f,
        "Working directory is not clean: {}. Commit or stash your changes, or use --ignore-working-directory",
        path.display()
      ),
      PreconditionError::NotUpToDate { path } => write!(
        f,
        "Working directory is not up to date with remote: {}. Pull the latest changes, or use --ignore-working-directory",
        path.display()
      ),
    }
  }
}

/// Registry communication errors
#[derive(Debug)]
pub enum RegistryError {
  /// Connection refused / host unreachable
  Unavailable { url: String },

  /// Registry answered with a non-success status
  Response { status: u16, message: String },

  /// Any other transport failure (TLS, timeout, ...)
  Transport { message: String },

  /// Response body could not be decoded
  Decode { message: String },
}

impl RegistryError {
  fn help_message(&self) -> Option<String> {
    match self {
      RegistryError::Unavailable { .. } => {
        Some("Check your network connection or override the registry with --registry <url>.".to_string())
      }
      RegistryError::Response { status: 401, .. } | RegistryError::Response { status: 403, .. } => {
        Some("Check the auth_token in kapctl.toml or the KAPETA_TOKEN environment variable.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for RegistryError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RegistryError::Unavailable { url } => {
        write!(f, "Could not connect to the registry at {}", url)
      }
      RegistryError::Response { message, .. } => write!(f, "{}", message),
      RegistryError::Transport { message } => write!(f, "Registry request failed: {}", message),
      RegistryError::Decode { message } => write!(f, "Invalid registry response: {}", message),
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { path } => Some(format!(
        "Initialize the repository first or check the path: {}",
        path.display()
      )),
      GitError::CommandFailed { stderr, .. } if stderr.contains("Permission denied") => {
        Some("Check your SSH key permissions and remote access.".to_string())
      }
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
    }
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Config file exists but is invalid
  Invalid { path: PathBuf, reason: String },

  /// Home directory could not be determined
  NoHome,
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NoHome => Some("Set KAPETA_HOME to a writable directory.".to_string()),
      ConfigError::Invalid { path, .. } => Some(format!("Fix or remove {}", path.display())),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Invalid { path, reason } => {
        write!(f, "Invalid configuration in {}: {}", path.display(), reason)
      }
      ConfigError::NoHome => write!(f, "Could not determine the home directory"),
    }
  }
}

/// Result type alias for kapctl
pub type KapResult<T> = Result<T, KapError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> KapResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> KapResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<KapError>,
{
  fn context(self, ctx: impl Into<String>) -> KapResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> KapResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(label: &str, error: &KapError, verbose: bool) {
  eprintln!("\n❌ {}: {}\n", label, error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }

  if verbose {
    eprintln!("{:#?}", error);
  }
}
