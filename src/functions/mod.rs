mod check_update;
mod detect_version;
mod fetch_document;
mod get_hash;
mod hash_sentinels;
mod human_readable_bytesize;
mod parse_fingerprints;
mod parse_manifest;
mod plan_update;
mod report_fingerprint;
mod retry;
mod write_atomically;

pub use check_update::check_update;
pub use detect_version::detect_version;
pub(crate) use fetch_document::fetch_document;
pub use get_hash::{get_hash, get_hash_async};
pub use hash_sentinels::hash_sentinels;
pub use human_readable_bytesize::human_readable_bytesize;
pub use parse_fingerprints::parse_fingerprints;
pub(crate) use parse_fingerprints::fingerprint_table;
pub use parse_manifest::parse_manifest;
pub use plan_update::plan_update;
pub(crate) use report_fingerprint::report_fingerprint;
pub(crate) use retry::retry;
pub(crate) use write_atomically::write_atomically;
