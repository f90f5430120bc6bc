use crate::structures::Fingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
  /// Exactly one version is the best match
  Definitive,
  /// Several versions fit the evidence, or the evidence was partial
  Probable,
  /// No version fits the evidence
  Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionResult {
  pub version: Option<String>,
  pub confidence: Confidence,
  /// Hashes of the sentinels found in the installation
  pub local_hashes: Fingerprint,
  /// Accepted candidates, most matched sentinels first
  pub matched_versions: Vec<String>,
}
