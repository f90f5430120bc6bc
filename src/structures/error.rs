#[derive(Debug)]
pub enum Error {
  /// The installation directory is missing or lacks one of the installation markers
  InvalidInstallDirectory(String),
  /// The manifest could not be retrieved, decoded, or has a malformed section
  InvalidManifest(String),
  /// The configuration handed to the builder is unusable
  InvalidConfiguration(String),
  /// No chain of patches leads from the first version to the second
  NoUpdatePath(String, String),

  // Download related errors:
  /// A transfer failed for good, first argument is the url, second argument the reason
  DownloadFailed(String, String),
  /// A transfer was aborted through its cancellation token, the argument names what was being transferred
  DownloadCancelled(String),
  /// The body ended early, arguments are the url, the bytes received and the bytes expected
  IncompleteTransfer(String, u64, u64),
  /// The server answered with a status we can't use, arguments are the url and the status code
  InvalidStatus(String, u16),
  /// No data arrived on a transfer for too long
  DownloadTimeout(tokio::time::error::Elapsed),
  HttpError(reqwest::Error),
  InvalidUrl(url::ParseError),

  /// Hash mismatch, arguments are the file, its actual hash and the expected hash
  HashMismatch(String, String, String),

  IoError(std::io::Error),
  JsonError(json::Error),
  JoinError(tokio::task::JoinError),
  MutexPoisoned(String),
}
