use crate::structures::PatchEdge;

/// Chain of patches leading from `current_version` to `target_version`, empty when already there
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePlan {
  pub current_version: String,
  pub target_version: String,
  pub steps: Vec<PatchEdge>,
}
