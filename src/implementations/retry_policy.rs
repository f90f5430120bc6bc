use std::time::Duration;

use crate::structures::RetryPolicy;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 500;
pub const DEFAULT_MAX_DELAY_SECS: u64 = 30;
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: DEFAULT_MAX_ATTEMPTS,
      initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
      max_delay: Duration::from_secs(DEFAULT_MAX_DELAY_SECS),
      multiplier: DEFAULT_BACKOFF_MULTIPLIER,
    }
  }
}

impl RetryPolicy {
  pub fn exponential(max_attempts: u32) -> Self {
    Self {
      max_attempts: max_attempts.max(1),
      ..Self::default()
    }
  }

  /// A single attempt, failures surface immediately
  pub fn none() -> Self {
    Self::exponential(1)
  }

  pub fn with_initial_delay(mut self, delay: Duration) -> Self {
    self.initial_delay = delay;
    self
  }

  /// Wait before the attempt following `attempt` (1-based)
  pub fn delay_for(&self, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(31) as i32;
    let delay = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
    if !delay.is_finite() || delay >= self.max_delay.as_secs_f64() {
      return self.max_delay;
    }
    Duration::from_secs_f64(delay)
  }
}
