use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::structures::{Error, RateLimiter, TokenBucket};

/// Longest single sleep inside `acquire`, so limit changes and cancellation are noticed quickly
const MAX_WAIT: Duration = Duration::from_millis(500);

impl TokenBucket {
  fn new(rate: u64) -> Self {
    Self {
      rate,
      tokens: rate as f64,
      last_refill: Instant::now(),
    }
  }

  fn refill(&mut self, now: Instant) {
    let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
    let capacity = self.rate as f64;
    self.tokens = (self.tokens + elapsed * capacity).min(capacity);
    self.last_refill = now;
  }

  /// Debits `bytes` when enough tokens are available, otherwise returns how long until they are.
  ///
  /// Requests above one second's worth only wait for a full bucket and leave the balance negative.
  pub(crate) fn try_take(&mut self, bytes: u64, now: Instant) -> Option<Duration> {
    if self.rate == 0 {
      return None;
    }
    self.refill(now);
    let capacity = self.rate as f64;
    let needed = (bytes as f64).min(capacity);
    if self.tokens >= needed {
      self.tokens -= bytes as f64;
      return None;
    }
    Some(Duration::from_secs_f64((needed - self.tokens) / capacity))
  }
}

impl RateLimiter {
  /// Creates a limiter allowing `bytes_per_sec`, 0 means unlimited
  pub fn new(bytes_per_sec: u64) -> Self {
    Self {
      bucket: Arc::new(Mutex::new(TokenBucket::new(bytes_per_sec))),
    }
  }

  pub fn unlimited() -> Self {
    Self::new(0)
  }

  /// Replaces the limit and resets the bucket, 0 disables throttling
  pub fn set_limit(&self, bytes_per_sec: u64) -> Result<(), Error> {
    info!("Bandwidth limit set to {}", if bytes_per_sec == 0 { "unlimited".to_string() } else { format!("{} B/s", bytes_per_sec) });
    *self.bucket.lock()? = TokenBucket::new(bytes_per_sec);
    Ok(())
  }

  pub fn limit(&self) -> Result<u64, Error> {
    Ok(self.bucket.lock()?.rate)
  }

  /// Waits until `bytes` may be sent and debits them from the shared bucket.
  pub async fn acquire(&self, bytes: u64, cancel: &CancellationToken) -> Result<(), Error> {
    loop {
      if cancel.is_cancelled() {
        return Err(Error::DownloadCancelled(format!("waiting for bandwidth for {} bytes", bytes)));
      }
      let wait = {
        let mut bucket = self.bucket.lock()?;
        match bucket.try_take(bytes, Instant::now()) {
          None => return Ok(()),
          Some(wait) => wait.min(MAX_WAIT),
        }
      };
      debug!("Throttling {} bytes for {:?}", bytes, wait);
      tokio::select! {
        _ = cancel.cancelled() => {
          return Err(Error::DownloadCancelled(format!("waiting for bandwidth for {} bytes", bytes)));
        }
        _ = tokio::time::sleep(wait) => {}
      }
    }
  }
}

impl Default for RateLimiter {
  fn default() -> Self {
    Self::unlimited()
  }
}
