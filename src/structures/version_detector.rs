use std::sync::{Arc, Mutex};

use crate::structures::FingerprintStore;

pub struct VersionDetector {
  pub(crate) store: Arc<Mutex<FingerprintStore>>,
  /// Relative paths that must exist for a directory to count as an installation
  pub(crate) install_markers: Vec<String>,
}
