use std::collections::BTreeMap;
use std::path::PathBuf;

/// Sentinel path relative to the installation, mapped to the hash of its contents
pub type Fingerprint = BTreeMap<String, String>;

/// Table of known versions and their fingerprints.
///
/// The bundled `base` table ships with the application or arrives with the manifest,
/// `learned` holds records taught at runtime and is the only part written back to `path`.
#[derive(Debug, Clone, Default)]
pub struct FingerprintStore {
  pub(crate) sentinel_files: Vec<String>,
  pub(crate) base: BTreeMap<String, Fingerprint>,
  pub(crate) learned: BTreeMap<String, Fingerprint>,
  pub(crate) path: Option<PathBuf>,
  pub(crate) dirty: bool,
}
