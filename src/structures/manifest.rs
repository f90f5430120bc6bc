use std::collections::BTreeMap;

use crate::structures::{FileEntry, Fingerprint, PatchEdge};

/// The decoded remote document describing the latest version and the patch graph
#[derive(Debug, Clone, Default)]
pub struct Manifest {
  /// Where this manifest was loaded from
  pub source_url: String,
  /// Latest version reachable through `patches`, None for asset-only manifests
  pub latest: Option<String>,
  pub patches: Vec<PatchEdge>,
  pub fingerprints: BTreeMap<String, Fingerprint>,
  pub fingerprints_url: Option<String>,
  pub report_url: Option<String>,
  /// The version actually released, which may be ahead of `latest`
  pub game_latest: Option<String>,
  pub game_latest_date: Option<String>,
  pub dlc_downloads: BTreeMap<String, FileEntry>,
  pub language_downloads: BTreeMap<String, FileEntry>,
  pub archived_versions: BTreeMap<String, ArchivedVersion>,
  pub dlc_catalog: Vec<DlcInfo>,
  pub pending_features: Vec<String>,
}

/// A full download of an older release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedVersion {
  pub version: String,
  pub files: Vec<FileEntry>,
  pub date: Option<String>,
}

/// Supplementary catalog information about a DLC
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DlcInfo {
  pub id: String,
  pub name: String,
  pub kind: Option<String>,
}
