//! Progress indicators for long-running operations
//!
//! Uses `linya` for allocation-free progress bars

use linya::{Bar, Progress};

/// Progress bar over a fixed number of steps (artifact uploads, installs)
pub struct StepProgress {
  progress: Progress,
  bar: Bar,
}

impl StepProgress {
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }

  /// Only show a bar when there is more than one step
  pub fn for_steps(total: usize, label: impl Into<String>) -> Option<Self> {
    (total > 1).then(|| Self::new(total, label))
  }

  /// Increment progress by 1
  pub fn inc(&mut self) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
