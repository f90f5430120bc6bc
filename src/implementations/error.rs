use reqwest::StatusCode;

use crate::structures::Error;

impl std::error::Error for Error {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::DownloadTimeout(error) => Some(error),
      Self::HttpError(error) => Some(error),
      Self::InvalidUrl(error) => Some(error),
      Self::IoError(error) => Some(error),
      Self::JsonError(error) => Some(error),
      Self::JoinError(error) => Some(error),
      _ => None,
    }
  }
}

impl std::fmt::Display for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      Self::InvalidInstallDirectory(reason) => write!(f, "Invalid installation directory: {}", reason),
      Self::InvalidManifest(reason) => write!(f, "Invalid manifest: {}", reason),
      Self::InvalidConfiguration(reason) => write!(f, "Invalid configuration: {}", reason),
      Self::NoUpdatePath(from, to) => write!(f, "No update path from version {} to version {}", from, to),
      Self::DownloadFailed(url, reason) => write!(f, "Downloading {} failed: {}", url, reason),
      Self::DownloadCancelled(what) => write!(f, "Cancelled while downloading {}", what),
      Self::IncompleteTransfer(url, received, expected) => write!(f, "Transfer of {} ended after {} of {} bytes", url, received, expected),
      Self::InvalidStatus(url, status) => write!(f, "Server answered {} with status {}", url, status),
      Self::DownloadTimeout(error) => write!(f, "Transfer stalled: {}", error),
      Self::HttpError(error) => write!(f, "HTTP error: {}", error),
      Self::InvalidUrl(error) => write!(f, "Invalid url: {}", error),
      Self::HashMismatch(file, actual, expected) => write!(f, "Hash of {} is {}, expected {}", file, actual, expected),
      Self::IoError(error) => write!(f, "I/O error: {}", error),
      Self::JsonError(error) => write!(f, "JSON error: {}", error),
      Self::JoinError(error) => write!(f, "Background task failed: {}", error),
      Self::MutexPoisoned(reason) => write!(f, "Mutex poisoned: {}", reason),
    }
  }
}

impl Error {
  /// Failures worth another attempt: timeouts, dropped connections, server side errors.
  pub fn is_transient(&self) -> bool {
    match self {
      Self::DownloadTimeout(_) | Self::IncompleteTransfer(..) => true,
      Self::HttpError(error) => {
        if let Some(status) = error.status() {
          return is_transient_status(status.as_u16());
        }
        error.is_timeout() || error.is_connect() || error.is_body() || error.is_request()
      },
      Self::InvalidStatus(_, status) => is_transient_status(*status),
      Self::IoError(error) => matches!(error.kind(),
        std::io::ErrorKind::ConnectionReset
        | std::io::ErrorKind::ConnectionAborted
        | std::io::ErrorKind::TimedOut
        | std::io::ErrorKind::UnexpectedEof
        | std::io::ErrorKind::Interrupted),
      _ => false,
    }
  }

  pub fn is_cancelled(&self) -> bool {
    matches!(self, Self::DownloadCancelled(_))
  }

  /// Network, transfer and cancellation failures
  pub fn is_download_error(&self) -> bool {
    matches!(self,
      Self::DownloadFailed(..)
      | Self::DownloadCancelled(_)
      | Self::IncompleteTransfer(..)
      | Self::InvalidStatus(..)
      | Self::DownloadTimeout(_)
      | Self::HttpError(_))
  }

  pub fn is_integrity_error(&self) -> bool {
    matches!(self, Self::HashMismatch(..))
  }

  pub fn is_manifest_error(&self) -> bool {
    matches!(self, Self::InvalidManifest(_) | Self::JsonError(_))
  }

  pub fn is_detection_error(&self) -> bool {
    matches!(self, Self::InvalidInstallDirectory(_))
  }
}

fn is_transient_status(status: u16) -> bool {
  status == StatusCode::REQUEST_TIMEOUT.as_u16()
    || status == StatusCode::TOO_MANY_REQUESTS.as_u16()
    || status == StatusCode::RANGE_NOT_SATISFIABLE.as_u16()
    || (500..600).contains(&status)
}

impl From<reqwest::Error> for Error {
  #[track_caller]
  #[inline(always)]
  fn from(error: reqwest::Error) -> Self {
    log_error(&error);
    Self::HttpError(error)
  }
}

impl From<url::ParseError> for Error {
  #[track_caller]
  #[inline(always)]
  fn from(error: url::ParseError) -> Self {
    log_error(&error);
    Self::InvalidUrl(error)
  }
}

impl From<tokio::task::JoinError> for Error {
  #[track_caller]
  #[inline(always)]
  fn from(error: tokio::task::JoinError) -> Self {
    log_error(&error);
    Self::JoinError(error)
  }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
  #[track_caller]
  #[inline(always)]
  fn from(error: std::sync::PoisonError<T>) -> Self {
    log_error(&error);
    Self::MutexPoisoned(error.to_string())
  }
}

impl From<tokio::time::error::Elapsed> for Error {
  #[track_caller]
  #[inline(always)]
  fn from(error: tokio::time::error::Elapsed) -> Self {
    log_error(&error);
    Self::DownloadTimeout(error)
  }
}

impl From<std::io::Error> for Error {
  #[track_caller]
  #[inline(always)]
  fn from(error: std::io::Error) -> Self {
    log_error(&error);
    Self::IoError(error)
  }
}

impl From<json::Error> for Error {
  #[track_caller]
  #[inline(always)]
  fn from(error: json::Error) -> Self {
    log_error(&error);
    Self::JsonError(error)
  }
}

#[track_caller]
fn log_error(error: &(impl std::error::Error + ?Sized)) {
  let location = std::panic::Location::caller();
  tracing::error!("{}:{}: {:?}", location.file(), location.line(), error);
}
