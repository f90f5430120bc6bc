use crate::functions::plan_update;
use crate::structures::{Error, Manifest, UpdateInfo};

/// Decides whether `current` needs updating and how, planner errors are passed on
pub fn check_update(manifest: &Manifest, current: &str, target: Option<&str>) -> Result<UpdateInfo, Error> {
  let mut info = UpdateInfo {
    update_available: false,
    current_version: current.to_string(),
    target_version: target.map(str::to_string).or_else(|| manifest.latest.clone()),
    actual_latest: manifest.actual_latest().map(str::to_string),
    actual_latest_date: manifest.game_latest_date.clone(),
    plan: None,
    total_size: 0,
    step_count: 0,
    patch_pending: false,
  };
  let Some(latest) = manifest.latest.as_deref() else {
    return Ok(info);
  };
  if target.is_none() && manifest.actual_latest() == Some(current) {
    return Ok(info);
  }
  let target = target.unwrap_or(latest);
  if current == target {
    info.patch_pending = target == latest && manifest.patch_pending();
    return Ok(info);
  }

  let plan = plan_update(manifest, current, Some(target))?;
  info.update_available = !plan.is_empty();
  info.total_size = plan.total_download_size();
  info.step_count = plan.step_count();
  info.plan = Some(plan);
  Ok(info)
}
