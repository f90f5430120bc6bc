use crate::structures::UpdatePlan;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
  pub update_available: bool,
  pub current_version: String,
  /// The version the plan leads to, None for manifests without a patch graph
  pub target_version: Option<String>,
  /// The version actually released, may be ahead of anything patchable
  pub actual_latest: Option<String>,
  pub actual_latest_date: Option<String>,
  pub plan: Option<UpdatePlan>,
  pub total_size: u64,
  pub step_count: usize,
  /// A release exists that the patch graph can't reach yet
  pub patch_pending: bool,
}
