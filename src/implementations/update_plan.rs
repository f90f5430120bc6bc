use crate::structures::{FileEntry, PatchEdge, UpdatePlan};

impl UpdatePlan {
  pub fn new(current_version: impl Into<String>, target_version: impl Into<String>, steps: Vec<PatchEdge>) -> Self {
    Self {
      current_version: current_version.into(),
      target_version: target_version.into(),
      steps,
    }
  }

  pub fn total_download_size(&self) -> u64 {
    self.steps.iter().fold(0u64, |total, step| total.saturating_add(step.total_size()))
  }

  pub fn step_count(&self) -> usize {
    self.steps.len()
  }

  /// True when the current version already is the target
  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }

  pub fn files(&self) -> impl Iterator<Item = &FileEntry> {
    self.steps.iter().flat_map(PatchEdge::all_files)
  }

  /// Consecutive steps connect and the chain runs from current to target
  pub fn is_contiguous(&self) -> bool {
    match (self.steps.first(), self.steps.last()) {
      (None, None) => self.current_version == self.target_version,
      (Some(first), Some(last)) => {
        first.version_from == self.current_version
          && last.version_to == self.target_version
          && self.steps.windows(2).all(|pair| pair[0].version_to == pair[1].version_from)
      },
      _ => false,
    }
  }
}
