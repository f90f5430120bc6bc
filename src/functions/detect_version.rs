use std::collections::BTreeMap;

use crate::structures::{Confidence, DetectionResult, Fingerprint, HashKind};

/// Matches the hashes found in an installation against every known version record.
///
/// Only sentinels present in both the installation and a record are compared. A record is a
/// candidate when at least one sentinel was compared and all compared sentinels agree.
pub fn detect_version(records: &BTreeMap<String, Fingerprint>, local_hashes: &Fingerprint) -> DetectionResult {
  let mut candidates: Vec<(&String, usize)> = Vec::new();
  for (version, record) in records {
    let mut compared = 0;
    let mut agrees = true;
    for (sentinel, expected) in record {
      if let Some(actual) = local_hashes.get(sentinel) {
        compared += 1;
        if !HashKind::matches(actual, expected) {
          agrees = false;
          break;
        }
      }
    }
    if agrees && compared > 0 {
      candidates.push((version, compared));
    }
  }
  candidates.sort_by(|a, b| b.1.cmp(&a.1));

  let confidence = match candidates.as_slice() {
    [] => Confidence::Unknown,
    [_] => Confidence::Definitive,
    [(_, best), (_, second), ..] if best > second => Confidence::Definitive,
    _ => Confidence::Probable,
  };

  DetectionResult {
    version: candidates.first().map(|(version, _)| version.to_string()),
    confidence,
    local_hashes: local_hashes.clone(),
    matched_versions: candidates.into_iter().map(|(version, _)| version.clone()).collect(),
  }
}
