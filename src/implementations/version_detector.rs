use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, instrument};

use crate::functions::{detect_version, hash_sentinels};
use crate::structures::{DetectionResult, Error, Fingerprint, FingerprintStore, VersionDetector};

impl VersionDetector {
  pub fn new(store: Arc<Mutex<FingerprintStore>>, install_markers: Vec<String>) -> Self {
    Self {
      store,
      install_markers,
    }
  }

  pub fn store(&self) -> Arc<Mutex<FingerprintStore>> {
    self.store.clone()
  }

  /// Checks that `install_dir` is a directory holding every installation marker
  pub fn validate(&self, install_dir: &Path) -> Result<(), Error> {
    if !install_dir.exists() {
      return Err(Error::InvalidInstallDirectory(format!("{} does not exist", install_dir.display())));
    }
    if !install_dir.is_dir() {
      return Err(Error::InvalidInstallDirectory(format!("{} is not a directory", install_dir.display())));
    }
    if let Some(missing) = self.install_markers.iter().find(|marker| !install_dir.join(marker).exists()) {
      return Err(Error::InvalidInstallDirectory(format!("{} is missing {}", install_dir.display(), missing)));
    }
    Ok(())
  }

  /// Hashes every sentinel the store knows about that exists under `install_dir`
  pub async fn hash_installation(&self, install_dir: &Path) -> Result<Fingerprint, Error> {
    self.validate(install_dir)?;
    let sentinels = self.store.lock()?.sentinels();
    let install_dir: PathBuf = install_dir.to_path_buf();
    tokio::task::spawn_blocking(move || hash_sentinels(&install_dir, &sentinels)).await?
  }

  #[instrument(skip(self))]
  pub async fn detect(&self, install_dir: &Path) -> Result<DetectionResult, Error> {
    let local_hashes = self.hash_installation(install_dir).await?;
    debug!("Found {} sentinels in {}", local_hashes.len(), install_dir.display());
    let records = self.store.lock()?.records();
    let result = detect_version(&records, &local_hashes);
    info!("Detected version {:?} ({}) in {}", result.version, result.confidence, install_dir.display());
    Ok(result)
  }
}
