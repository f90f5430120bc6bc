use std::path::PathBuf;

use crate::structures::FileEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
  pub entry: FileEntry,
  pub local_path: PathBuf,
  /// The file was checked against the expected hash
  pub verified: bool,
  /// The transfer continued a partial file left by an earlier run
  pub resumed: bool,
  pub bytes_downloaded_this_run: u64,
}
