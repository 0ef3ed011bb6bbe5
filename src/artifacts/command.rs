//! Subprocess helpers shared by the artifact backends

use crate::core::error::{KapError, KapResult};
use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

/// Lines of stderr kept in build error messages
const STDERR_TAIL_LINES: usize = 40;

/// Run a tool in `dir`, returning stdout. Failure becomes a build error for `step`.
pub fn run_tool(step: &str, dir: &Path, program: &str, args: &[&str]) -> KapResult<String> {
  tracing::debug!(step, dir = %dir.display(), "{} {}", program, args.join(" "));

  let output = match Command::new(program).args(args).current_dir(dir).output() {
    Ok(output) => output,
    Err(e) if e.kind() == ErrorKind::NotFound => {
      return Err(KapError::build(step, format!("'{}' was not found on PATH", program)));
    }
    Err(e) => return Err(KapError::build(step, format!("failed to run {}: {}", program, e))),
  };

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let detail = if stderr.trim().is_empty() { stdout } else { stderr };
    return Err(KapError::build(
      step,
      format!("{} {} exited with {}\n{}", program, args.join(" "), output.status, tail(&detail)),
    ));
  }

  Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Run a user-supplied shell script (e.g. `build.sh`) from the asset directory
pub fn run_script(step: &str, dir: &Path, script: &Path) -> KapResult<()> {
  let script = script.to_string_lossy();
  run_tool(step, dir, "sh", &[script.as_ref()])?;
  Ok(())
}

fn tail(text: &str) -> String {
  let lines: Vec<&str> = text.lines().collect();
  let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
  lines[start..].join("\n")
}
