mod detection_result;
mod downloader;
mod error;
mod file_entry;
mod fingerprint_store;
mod hash_kind;
mod manifest;
mod patch_edge;
mod rate_limiter;
mod retry_policy;
mod update_plan;
mod version_detector;

pub use downloader::{DEFAULT_CHUNK_SIZE, DEFAULT_STALL_TIMEOUT_SECS};
pub use retry_policy::{DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY_SECS};
