use std::path::PathBuf;
use std::time::Duration;

use crate::structures::{RateLimiter, RetryPolicy};

pub struct Downloader {
  pub(crate) client: reqwest::Client,
  pub(crate) download_dir: PathBuf,
  pub(crate) rate_limiter: RateLimiter,
  pub(crate) retry_policy: RetryPolicy,
  pub(crate) chunk_size: usize,
  /// Longest we wait for the next piece of a body before giving up on the attempt
  pub(crate) stall_timeout: Duration,
}
