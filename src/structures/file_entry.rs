/// A single downloadable blob listed in the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
  pub url: String,
  /// Size in bytes, 0 when the manifest doesn't say
  pub size: u64,
  /// Expected digest of the file, empty when the manifest doesn't provide one
  pub md5: String,
  /// Name the file is stored under, derived from the url when not given
  pub filename: String,
}
