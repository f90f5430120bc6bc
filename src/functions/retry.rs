use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::structures::{Error, RetryPolicy};

/// Runs `operation` until it succeeds, fails permanently, or runs out of attempts.
///
/// Only transient errors are retried, the attempt number (1-based) is passed to every call.
/// Running out of attempts yields `Error::DownloadFailed` with the last failure as reason.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, cancel: &CancellationToken, what: &str, mut operation: F) -> Result<T, Error>
where
  F: FnMut(u32) -> Fut,
  Fut: Future<Output = Result<T, Error>>,
{
  let max_attempts = policy.max_attempts.max(1);
  let mut attempt = 1;
  loop {
    if cancel.is_cancelled() {
      warn!("{} cancelled before attempt {}", what, attempt);
      return Err(Error::DownloadCancelled(what.to_string()));
    }
    match operation(attempt).await {
      Ok(value) => return Ok(value),
      Err(error) if error.is_transient() => {
        if attempt >= max_attempts {
          return Err(Error::DownloadFailed(what.to_string(), format!("gave up after {} attempts: {}", attempt, error)));
        }
        let delay = policy.delay_for(attempt);
        warn!("Attempt {}/{} for {} failed: {}, retrying in {:?}", attempt, max_attempts, what, error, delay);
        tokio::select! {
          _ = cancel.cancelled() => {
            warn!("{} cancelled while waiting to retry", what);
            return Err(Error::DownloadCancelled(what.to_string()));
          }
          _ = tokio::time::sleep(delay) => {}
        }
        attempt += 1;
      },
      Err(error) => {
        if error.is_cancelled() {
          warn!("{} cancelled", what);
        }
        return Err(error);
      },
    }
  }
}
