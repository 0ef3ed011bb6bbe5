//! Minimum version increment from conventional commits

use crate::model::VersionIncrement;

/// Conventional commit type, as far as versioning cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommitType {
  Feat,
  Fix,
  Other,
}

impl CommitType {
  /// Parse the type from the header (`type:`, `type(scope):`, with optional `!`)
  fn from_header(header: &str) -> Self {
    match commit_prefix(header).map(|(kind, _)| kind.to_lowercase()) {
      Some(kind) if kind == "feat" => CommitType::Feat,
      Some(kind) if kind == "fix" => CommitType::Fix,
      _ => CommitType::Other,
    }
  }
}

/// Split a conventional header into its type and whether it carries `!`
fn commit_prefix(header: &str) -> Option<(&str, bool)> {
  let (prefix, _) = header.split_once(':')?;
  let (prefix, breaking) = match prefix.strip_suffix('!') {
    Some(rest) => (rest, true),
    None => (prefix, false),
  };
  let kind = match prefix.split_once('(') {
    Some((kind, scope)) if scope.ends_with(')') => kind,
    Some(_) => return None,
    None => prefix,
  };

  if kind.is_empty() || !kind.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
    return None;
  }
  Some((kind, breaking))
}

fn is_breaking(message: &str) -> bool {
  let header = message.lines().next().unwrap_or("");
  if commit_prefix(header).is_some_and(|(_, bang)| bang) {
    return true;
  }
  message
    .lines()
    .skip(1)
    .any(|line| line.starts_with("BREAKING CHANGE:") || line.starts_with("BREAKING-CHANGE:"))
}

/// Increment implied by one commit message
pub fn classify(message: &str) -> VersionIncrement {
  if is_breaking(message) {
    return VersionIncrement::Major;
  }
  match CommitType::from_header(message.lines().next().unwrap_or("").trim()) {
    CommitType::Feat => VersionIncrement::Minor,
    CommitType::Fix => VersionIncrement::Patch,
    CommitType::Other => VersionIncrement::None,
  }
}

/// Highest increment across all messages; `None` for an empty log
pub fn minimum_increment<S: AsRef<str>>(messages: &[S]) -> VersionIncrement {
  messages
    .iter()
    .map(|m| classify(m.as_ref()))
    .max()
    .unwrap_or(VersionIncrement::None)
}
