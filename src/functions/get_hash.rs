use std::fs::OpenOptions;
use std::io::Read;
use std::path::{Path, PathBuf};

use md5::Md5;
use sha2::{Digest, Sha256};

use crate::structures::{Error, HashKind};

/// Opens a file and calculates its digest as lowercase hex
pub fn get_hash(file_path: &Path, kind: HashKind) -> Result<String, Error> {
  match kind {
    HashKind::Md5 => digest_file::<Md5>(file_path),
    HashKind::Sha256 => digest_file::<Sha256>(file_path),
  }
}

/// Hashes on the blocking pool so large files don't stall the runtime
pub async fn get_hash_async(file_path: PathBuf, kind: HashKind) -> Result<String, Error> {
  tokio::task::spawn_blocking(move || get_hash(&file_path, kind)).await?
}

fn digest_file<D: Digest>(file_path: &Path) -> Result<String, Error> {
  let mut file = OpenOptions::new().read(true).open(file_path)?;
  let mut hasher = D::new();
  let mut buffer = vec![0u8; 64 * 1024];
  loop {
    let read = file.read(&mut buffer)?;
    if read == 0 {
      break;
    }
    hasher.update(&buffer[..read]);
  }
  Ok(hex::encode(hasher.finalize()))
}
