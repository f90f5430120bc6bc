use std::path::Path;

use tracing::trace;

use crate::functions::get_hash;
use crate::structures::{Error, Fingerprint, HashKind};

/// MD5 of every sentinel present under `install_dir`, absent sentinels are left out
pub fn hash_sentinels(install_dir: &Path, sentinels: &[String]) -> Result<Fingerprint, Error> {
  let mut fingerprint = Fingerprint::new();
  for sentinel in sentinels {
    let path = install_dir.join(sentinel);
    if !path.is_file() {
      trace!("Sentinel {} not present", sentinel);
      continue;
    }
    fingerprint.insert(sentinel.clone(), get_hash(&path, HashKind::Md5)?);
  }
  Ok(fingerprint)
}
