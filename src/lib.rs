extern crate json;
extern crate sha2;
extern crate md5;
extern crate hex;
extern crate futures;
extern crate tokio;
extern crate url;
extern crate reqwest;
extern crate tracing;

//Modules
pub mod functions;
mod implementations;
pub mod structures;
pub mod traits;
pub mod updater;
pub mod updater_builder;

#[cfg(test)]
mod tests;

pub use crate::functions::{check_update, detect_version, hash_sentinels, parse_manifest, plan_update};
pub use crate::implementations::{
  DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_CHUNK_SIZE, DEFAULT_INITIAL_DELAY_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY_SECS,
  DEFAULT_STALL_TIMEOUT_SECS,
};
pub use crate::structures::{
  ArchivedVersion, Confidence, DetectionResult, DlcInfo, DownloadResult, Downloader, Error, FileEntry, Fingerprint,
  FingerprintStore, HashKind, Manifest, PatchEdge, ProgressFn, RateLimiter, RetryPolicy, StatusFn, UpdateInfo, UpdatePlan,
  VersionDetector,
};
pub use crate::traits::PatchApplier;
pub use crate::updater::Updater;
pub use crate::updater_builder::UpdaterBuilder;
pub use tokio_util::sync::CancellationToken;
