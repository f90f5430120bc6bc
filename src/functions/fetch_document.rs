use std::path::PathBuf;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::functions::retry;
use crate::structures::{Error, RetryPolicy};

/// Reads a document from an http(s) url, a `file://` url or a local path.
///
/// `timeout` bounds each http request, body included. Cancellation interrupts a request in flight.
#[instrument(skip(client, policy, cancel))]
pub async fn fetch_document(client: &reqwest::Client, source: &str, policy: &RetryPolicy, timeout: Option<Duration>, cancel: &CancellationToken) -> Result<String, Error> {
  if source.starts_with("http://") || source.starts_with("https://") {
    return retry(policy, cancel, source, move |attempt| async move {
      debug!("Fetching {} (attempt {})", source, attempt);
      let mut request = client.get(source);
      if let Some(timeout) = timeout {
        request = request.timeout(timeout);
      }
      let response = tokio::select! {
        _ = cancel.cancelled() => return Err(Error::DownloadCancelled(source.to_string())),
        response = request.send() => response?,
      };
      let status = response.status();
      if !status.is_success() {
        return Err(Error::InvalidStatus(source.to_string(), status.as_u16()));
      }
      tokio::select! {
        _ = cancel.cancelled() => Err(Error::DownloadCancelled(source.to_string())),
        text = response.text() => Ok(text?),
      }
    }).await;
  }
  let path = if source.starts_with("file://") {
    url::Url::parse(source)?
      .to_file_path()
      .map_err(|_| Error::InvalidConfiguration(format!("{} is not a local file url", source)))?
  } else {
    PathBuf::from(source)
  };
  debug!("Reading {}", path.display());
  Ok(tokio::fs::read_to_string(&path).await?)
}
