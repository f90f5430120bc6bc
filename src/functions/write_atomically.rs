use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::structures::Error;

/// Writes `contents` next to `path` and renames it into place once it is on disk
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), Error> {
  if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent)?;
  }
  let file_name = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
  let temporary = path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()));
  let result = (|| -> Result<(), Error> {
    let mut file = OpenOptions::new().write(true).create(true).truncate(true).open(&temporary)?;
    file.write_all(contents)?;
    file.sync_all()?;
    drop(file);
    std::fs::rename(&temporary, path)?;
    Ok(())
  })();
  if result.is_err() {
    let _ = std::fs::remove_file(&temporary);
  }
  result
}
