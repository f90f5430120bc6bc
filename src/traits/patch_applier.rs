use async_trait::async_trait;

use crate::structures::{DownloadResult, Error, PatchEdge};

/// Applies a downloaded patch to an installation.
///
/// The engine only downloads and verifies, whatever turns the files into an upgraded
/// installation lives behind this trait. Steps are handed over in plan order.
#[async_trait]
pub trait PatchApplier: Send + Sync {
  async fn apply(&self, step: &PatchEdge, files: &[DownloadResult]) -> Result<(), Error>;
}
