use crate::structures::FileEntry;

/// A directed upgrade from one version to another
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchEdge {
  pub version_from: String,
  pub version_to: String,
  pub files: Vec<FileEntry>,
  pub crack: Option<FileEntry>,
}
