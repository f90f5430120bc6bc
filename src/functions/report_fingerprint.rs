use std::time::Duration;

use json::JsonValue;
use tracing::{debug, instrument, warn};

use crate::structures::Fingerprint;

/// Posts `{version, hashes}` to `url` within `timeout`, failures are logged and otherwise ignored
#[instrument(skip(client, hashes))]
pub async fn report_fingerprint(client: &reqwest::Client, url: &str, version: &str, hashes: &Fingerprint, timeout: Duration) {
  let mut body = JsonValue::new_object();
  body["version"] = version.into();
  let mut table = JsonValue::new_object();
  for (sentinel, hash) in hashes {
    table[sentinel.as_str()] = hash.as_str().into();
  }
  body["hashes"] = table;

  let result = client
    .post(url)
    .timeout(timeout)
    .header(reqwest::header::CONTENT_TYPE, "application/json")
    .body(body.dump())
    .send()
    .await;
  match result {
    Ok(response) if response.status().is_success() => debug!("Reported fingerprint of {} to {}", version, url),
    Ok(response) => warn!("Reporting fingerprint of {} to {} answered {}", version, url, response.status()),
    Err(error) => warn!("Reporting fingerprint of {} to {} failed: {}", version, url, error),
  }
}
