use std::sync::{Arc, Mutex};
use tokio::time::Instant;

/// Shared bandwidth throttle, clones hand out the same bucket
#[derive(Debug, Clone)]
pub struct RateLimiter {
  pub(crate) bucket: Arc<Mutex<TokenBucket>>,
}

#[derive(Debug)]
pub(crate) struct TokenBucket {
  /// Bytes per second, 0 disables throttling
  pub(crate) rate: u64,
  /// May go negative after an oversized request
  pub(crate) tokens: f64,
  pub(crate) last_refill: Instant,
}
