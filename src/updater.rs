use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::functions::{self, fetch_document, parse_fingerprints, parse_manifest};
use crate::structures::{
  DetectionResult, DownloadResult, Downloader, Error, FileEntry, Fingerprint, FingerprintStore, Manifest, ProgressFn, RetryPolicy,
  StatusFn, UpdateInfo, UpdatePlan, VersionDetector,
};
use crate::traits::PatchApplier;

/// Upper bound for the best-effort remote fingerprint and report requests
const AUXILIARY_TIMEOUT_SECS: u64 = 15;

/// Ties manifest retrieval, version detection, planning and downloading together.
///
/// Created through `UpdaterBuilder`. Every long running call takes a `CancellationToken`,
/// progress and status callbacks run on the calling task.
pub struct Updater {
  pub(crate) manifest_source: String,
  pub(crate) client: reqwest::Client,
  pub(crate) downloader: Downloader,
  pub(crate) detector: VersionDetector,
  pub(crate) manifest: Mutex<Option<Arc<Manifest>>>,
  pub(crate) report_url: Option<String>,
  pub(crate) retry_policy: RetryPolicy,
}

impl Updater {
  /// Returns the cached manifest, or retrieves it when there is none or `force` is set.
  ///
  /// Fingerprints embedded in the manifest and those behind its `fingerprints_url` are merged
  /// into the store, a failure to fetch the latter is only logged.
  #[instrument(skip(self, cancel), fields(source = %self.manifest_source))]
  pub async fn fetch_manifest(&self, force: bool, cancel: &CancellationToken) -> Result<Arc<Manifest>, Error> {
    if !force {
      if let Some(manifest) = self.cached_manifest()? {
        return Ok(manifest);
      }
    }
    let raw = fetch_document(&self.client, &self.manifest_source, &self.retry_policy, None, cancel)
      .await
      .map_err(|error| match error {
        Error::DownloadCancelled(_) => error,
        error => Error::InvalidManifest(format!("fetching {} failed: {}", self.manifest_source, error)),
      })?;
    let manifest = Arc::new(parse_manifest(&raw, &self.manifest_source)?);
    info!("Manifest lists latest version {:?} with {} patches", manifest.latest, manifest.patches.len());

    self.detector.store.lock()?.merge_remote(&manifest.fingerprints);
    if let Some(url) = &manifest.fingerprints_url {
      let fetched = fetch_document(&self.client, url, &RetryPolicy::none(), Some(Duration::from_secs(AUXILIARY_TIMEOUT_SECS)), cancel)
        .await
        .and_then(|text| parse_fingerprints(&text));
      match fetched {
        Err(error) if error.is_cancelled() => return Err(error),
        Ok(table) => {
          let merged = self.detector.store.lock()?.merge_remote(&table);
          debug!("Merged {} fingerprint records from {}", merged, url);
        },
        Err(error) => warn!("Could not load fingerprints from {}: {}", url, error),
      }
    }

    *self.manifest.lock()? = Some(manifest.clone());
    Ok(manifest)
  }

  pub fn cached_manifest(&self) -> Result<Option<Arc<Manifest>>, Error> {
    Ok(self.manifest.lock()?.clone())
  }

  /// Compares `current` with the manifest, fetching it first when needed
  pub async fn check_update(&self, current: &str, target: Option<&str>, cancel: &CancellationToken) -> Result<UpdateInfo, Error> {
    let manifest = self.fetch_manifest(false, cancel).await?;
    let info = functions::check_update(&manifest, current, target)?;
    if info.update_available {
      info!("Update from {} to {:?} available, {} in {} steps", current, info.target_version, functions::human_readable_bytesize(info.total_size), info.step_count);
    } else if info.patch_pending {
      info!("{} is the latest patchable version, {:?} has not been made available as a patch yet", current, info.actual_latest);
    }
    Ok(info)
  }

  pub async fn plan_update(&self, current: &str, target: Option<&str>, cancel: &CancellationToken) -> Result<UpdatePlan, Error> {
    let manifest = self.fetch_manifest(false, cancel).await?;
    functions::plan_update(&manifest, current, target)
  }

  pub async fn detect_version(&self, install_dir: &Path) -> Result<DetectionResult, Error> {
    self.detector.detect(install_dir).await
  }

  /// Downloads every file of `plan` in order, each step into its own subdirectory.
  ///
  /// `progress` receives the bytes done across the whole plan against the plan's total size.
  #[instrument(skip_all, fields(from = %plan.current_version, to = %plan.target_version))]
  pub async fn download_update(&self, plan: &UpdatePlan, progress: Option<&ProgressFn<'_>>, status: Option<&StatusFn<'_>>, cancel: &CancellationToken) -> Result<Vec<DownloadResult>, Error> {
    let grand_total = plan.total_download_size();
    let step_count = plan.step_count();
    let mut offset = 0;
    let mut results = Vec::new();
    for (index, step) in plan.steps.iter().enumerate() {
      if let Some(status) = status {
        status(&format!("Downloading patch {}/{}: {} to {}", index + 1, step_count, step.version_from, step.version_to));
      }
      let subdir = step.directory_name();
      for entry in step.all_files() {
        if cancel.is_cancelled() {
          warn!("Update to {} cancelled before {}", plan.target_version, entry.filename);
          return Err(Error::DownloadCancelled(format!("update to {}", plan.target_version)));
        }
        let done_before = offset;
        let overall: &ProgressFn = &move |downloaded: u64, _total: u64, filename: &str| {
          if let Some(progress) = progress {
            progress(done_before + downloaded, grand_total, filename);
          }
        };
        let result = self.downloader.download_file(entry, Some(overall), Some(&subdir), cancel).await?;
        offset += entry.size;
        results.push(result);
      }
    }
    if let Some(status) = status {
      status(&format!("Downloaded {} patches ({})", step_count, functions::human_readable_bytesize(grand_total)));
    }
    Ok(results)
  }

  /// Downloads `plan`, then hands each step's verified files to `applier` in plan order
  pub async fn install_update(&self, plan: &UpdatePlan, applier: &dyn PatchApplier, progress: Option<&ProgressFn<'_>>, status: Option<&StatusFn<'_>>, cancel: &CancellationToken) -> Result<Vec<DownloadResult>, Error> {
    let results = self.download_update(plan, progress, status, cancel).await?;
    let mut remaining = results.as_slice();
    for step in &plan.steps {
      if cancel.is_cancelled() {
        return Err(Error::DownloadCancelled(format!("update to {}", plan.target_version)));
      }
      let (files, rest) = remaining.split_at(step.all_files().count().min(remaining.len()));
      remaining = rest;
      if let Some(status) = status {
        status(&format!("Applying patch {} to {}", step.version_from, step.version_to));
      }
      applier.apply(step, files).await?;
      info!("Applied patch {} to {}", step.version_from, step.version_to);
    }
    Ok(results)
  }

  /// Downloads a single entry outside of a plan, such as a DLC or language pack
  pub async fn download_asset(&self, entry: &FileEntry, subdir: Option<&str>, progress: Option<&ProgressFn<'_>>, cancel: &CancellationToken) -> Result<DownloadResult, Error> {
    self.downloader.download_file(entry, progress, subdir, cancel).await
  }

  /// Teaches the store a fingerprint and saves the learned overlay, returns whether anything changed.
  ///
  /// The save runs on the blocking pool.
  pub async fn learn_version(&self, version: &str, fingerprint: &Fingerprint) -> Result<bool, Error> {
    let store = self.detector.store();
    let version = version.to_string();
    let fingerprint = fingerprint.clone();
    tokio::task::spawn_blocking(move || -> Result<bool, Error> {
      let mut store = store.lock()?;
      let changed = store.learn(&version, &fingerprint);
      store.save()?;
      Ok(changed)
    }).await?
  }

  /// Records the sentinels of an installation known to be `version` and reports them
  pub async fn learn_installation(&self, install_dir: &Path, version: &str) -> Result<Fingerprint, Error> {
    let hashes = self.detector.hash_installation(install_dir).await?;
    if hashes.is_empty() {
      return Err(Error::InvalidInstallDirectory(format!("no sentinel files found in {}", install_dir.display())));
    }
    if self.learn_version(version, &hashes).await? {
      info!("Learned fingerprint of version {} from {}", version, install_dir.display());
      self.report_fingerprint(version, &hashes).await;
    }
    Ok(hashes)
  }

  /// Shares a fingerprint with the configured or manifest report url, failures are ignored.
  ///
  /// The request gives up after a bounded time.
  pub async fn report_fingerprint(&self, version: &str, hashes: &Fingerprint) {
    let url = match &self.report_url {
      Some(url) => Some(url.clone()),
      None => self.cached_manifest().ok().flatten().and_then(|manifest| manifest.report_url.clone()),
    };
    match url {
      Some(url) => functions::report_fingerprint(&self.client, &url, version, hashes, Duration::from_secs(AUXILIARY_TIMEOUT_SECS)).await,
      None => debug!("No report url configured, keeping the fingerprint of {} local", version),
    }
  }

  /// Changes the bandwidth limit shared by all downloads, 0 removes it
  pub fn set_rate_limit(&self, bytes_per_sec: u64) -> Result<(), Error> {
    self.downloader.rate_limiter.set_limit(bytes_per_sec)
  }

  pub fn rate_limit(&self) -> Result<u64, Error> {
    self.downloader.rate_limiter.limit()
  }

  pub fn store(&self) -> Arc<Mutex<FingerprintStore>> {
    self.detector.store()
  }

  pub fn downloader(&self) -> &Downloader {
    &self.downloader
  }
}
