use std::collections::{BTreeMap, VecDeque};

use tracing::debug;

use crate::structures::{Error, Manifest, PatchEdge, UpdatePlan};

/// Finds the chain of patches from `current` to `target`, or to the manifest's latest version.
///
/// Fewest steps wins, among those the smallest download, and the first one found on equal size.
pub fn plan_update(manifest: &Manifest, current: &str, target: Option<&str>) -> Result<UpdatePlan, Error> {
  let target = match target.or(manifest.latest.as_deref()) {
    Some(target) => target,
    None => return Err(Error::NoUpdatePath(current.to_string(), "<no latest version>".to_string())),
  };
  if current == target {
    return Ok(UpdatePlan::new(current, target, Vec::new()));
  }

  let mut adjacency: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
  for (index, patch) in manifest.patches.iter().enumerate() {
    adjacency.entry(patch.version_from.as_str()).or_default().push(index);
  }

  let mut best_hops: BTreeMap<&str, usize> = BTreeMap::from([(current, 0)]);
  let mut shortest: Option<usize> = None;
  let mut found: Vec<Vec<usize>> = Vec::new();
  let mut queue: VecDeque<(&str, Vec<usize>)> = VecDeque::from([(current, Vec::new())]);

  while let Some((vertex, path)) = queue.pop_front() {
    let Some(edges) = adjacency.get(vertex) else {
      continue;
    };
    for &index in edges {
      let next = manifest.patches[index].version_to.as_str();
      let hops = path.len() + 1;
      if shortest.is_some_and(|shortest| hops > shortest) {
        continue;
      }
      if best_hops.get(next).is_some_and(|&best| hops > best) {
        continue;
      }
      let revisits = next == current || path.iter().any(|&step| manifest.patches[step].version_to == next);
      if revisits {
        continue;
      }
      best_hops.insert(next, hops);
      let mut extended = path.clone();
      extended.push(index);
      if next == target {
        shortest = Some(hops);
        found.push(extended);
      } else {
        queue.push_back((next, extended));
      }
    }
  }

  let size_of = |path: &Vec<usize>| -> u64 { path.iter().fold(0u64, |total, &index| total.saturating_add(manifest.patches[index].total_size())) };
  let mut best: Option<&Vec<usize>> = None;
  for path in &found {
    if best.map_or(true, |best| size_of(path) < size_of(best)) {
      best = Some(path);
    }
  }

  match best {
    Some(path) => {
      let steps: Vec<PatchEdge> = path.iter().map(|&index| manifest.patches[index].clone()).collect();
      let plan = UpdatePlan::new(current, target, steps);
      debug!("Planned {} steps from {} to {} ({} bytes)", plan.step_count(), current, target, plan.total_download_size());
      Ok(plan)
    },
    None => Err(Error::NoUpdatePath(current.to_string(), target.to_string())),
  }
}
