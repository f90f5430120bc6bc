pub mod error;
pub use error::Error;

pub mod file_entry;
pub use file_entry::FileEntry;

pub mod patch_edge;
pub use patch_edge::PatchEdge;

pub mod manifest;
pub use manifest::{ArchivedVersion, DlcInfo, Manifest};

pub mod fingerprint_store;
pub use fingerprint_store::{Fingerprint, FingerprintStore};

pub mod detection_result;
pub use detection_result::{Confidence, DetectionResult};

pub mod version_detector;
pub use version_detector::VersionDetector;

pub mod update_plan;
pub use update_plan::UpdatePlan;

pub mod update_info;
pub use update_info::UpdateInfo;

pub mod download_result;
pub use download_result::DownloadResult;

pub mod rate_limiter;
pub use rate_limiter::RateLimiter;
pub(crate) use rate_limiter::TokenBucket;

pub mod retry_policy;
pub use retry_policy::RetryPolicy;

pub mod downloader;
pub use downloader::Downloader;

pub mod progress;
pub use progress::{ProgressFn, StatusFn};

pub mod hash_kind;
pub use hash_kind::HashKind;
