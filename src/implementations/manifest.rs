use std::collections::BTreeSet;

use crate::functions::parse_manifest;
use crate::structures::{Error, Manifest, PatchEdge};

impl Manifest {
  pub fn parse(raw: &str, source_url: &str) -> Result<Self, Error> {
    parse_manifest(raw, source_url)
  }

  /// Every version mentioned by `latest` or by an edge
  pub fn all_versions(&self) -> BTreeSet<String> {
    self.latest.iter().cloned()
      .chain(self.patches.iter().flat_map(|patch| [patch.version_from.clone(), patch.version_to.clone()]))
      .collect()
  }

  /// The released version, which falls back to the latest patchable one
  pub fn actual_latest(&self) -> Option<&str> {
    self.game_latest.as_deref().or(self.latest.as_deref())
  }

  /// Content has shipped ahead of what the patch graph can reach
  pub fn patch_pending(&self) -> bool {
    match (&self.game_latest, &self.latest) {
      (Some(game_latest), Some(latest)) => game_latest != latest,
      _ => false,
    }
  }

  pub fn patches_from<'a>(&'a self, version: &'a str) -> impl Iterator<Item = &'a PatchEdge> {
    self.patches.iter().filter(move |patch| patch.version_from == version)
  }

  pub fn find_patch(&self, from: &str, to: &str) -> Option<&PatchEdge> {
    self.patches.iter().find(|patch| patch.version_from == from && patch.version_to == to)
  }
}
