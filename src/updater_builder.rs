use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use crate::implementations::{DEFAULT_CHUNK_SIZE, DEFAULT_STALL_TIMEOUT_SECS};
use crate::structures::{Downloader, Error, FingerprintStore, RateLimiter, RetryPolicy, VersionDetector};
use crate::updater::Updater;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub struct UpdaterBuilder {
  pub(crate) manifest_source: String,
  pub(crate) download_dir: PathBuf,
  pub(crate) store: Option<FingerprintStore>,
  pub(crate) bundled_fingerprints: Option<PathBuf>,
  pub(crate) store_path: Option<PathBuf>,
  pub(crate) sentinel_files: Vec<String>,
  pub(crate) install_markers: Vec<String>,
  pub(crate) rate_limit: u64,
  pub(crate) retry_policy: RetryPolicy,
  pub(crate) request_timeout: Option<Duration>,
  pub(crate) connect_timeout: Duration,
  pub(crate) report_url: Option<String>,
  pub(crate) user_agent: String,
  pub(crate) chunk_size: usize,
  pub(crate) stall_timeout: Duration,
}

impl UpdaterBuilder {
  pub fn new() -> Self {
    Self {
      manifest_source: "".to_string(),
      download_dir: PathBuf::from("downloads"),
      store: None,
      bundled_fingerprints: None,
      store_path: None,
      sentinel_files: Vec::new(),
      install_markers: Vec::new(),
      rate_limit: 0,
      retry_policy: RetryPolicy::default(),
      request_timeout: None,
      connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
      report_url: None,
      user_agent: format!("patch_updater/{}", env!("CARGO_PKG_VERSION")),
      chunk_size: DEFAULT_CHUNK_SIZE,
      stall_timeout: Duration::from_secs(DEFAULT_STALL_TIMEOUT_SECS),
    }
  }

  /// An http(s) url, a `file://` url or a local path
  pub fn set_manifest_source(mut self, manifest_source: impl Into<String>) -> Self {
    self.manifest_source = manifest_source.into();
    self
  }

  pub fn set_download_dir(mut self, download_dir: impl Into<PathBuf>) -> Self {
    self.download_dir = download_dir.into();
    self
  }

  /// Uses an already constructed store as the base, instead of a bundled file
  pub fn set_fingerprint_store(mut self, store: FingerprintStore) -> Self {
    self.store = Some(store);
    self
  }

  pub fn set_bundled_fingerprints(mut self, path: impl Into<PathBuf>) -> Self {
    self.bundled_fingerprints = Some(path.into());
    self
  }

  /// File the learned fingerprints are kept in
  pub fn set_store_path(mut self, path: impl Into<PathBuf>) -> Self {
    self.store_path = Some(path.into());
    self
  }

  pub fn set_sentinel_files(mut self, sentinel_files: Vec<String>) -> Self {
    self.sentinel_files = sentinel_files;
    self
  }

  pub fn set_install_markers(mut self, install_markers: Vec<String>) -> Self {
    self.install_markers = install_markers;
    self
  }

  /// Bytes per second shared by all downloads, 0 is unlimited
  pub fn set_rate_limit(mut self, bytes_per_sec: u64) -> Self {
    self.rate_limit = bytes_per_sec;
    self
  }

  pub fn set_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
    self.retry_policy = retry_policy;
    self
  }

  /// Upper bound for a whole request, body included. Unset by default since patches can be large.
  pub fn set_request_timeout(mut self, timeout: Duration) -> Self {
    self.request_timeout = Some(timeout);
    self
  }

  pub fn set_connect_timeout(mut self, timeout: Duration) -> Self {
    self.connect_timeout = timeout;
    self
  }

  pub fn set_report_url(mut self, report_url: impl Into<String>) -> Self {
    self.report_url = Some(report_url.into());
    self
  }

  pub fn set_user_agent(mut self, user_agent: impl Into<String>) -> Self {
    self.user_agent = user_agent.into();
    self
  }

  pub fn set_chunk_size(mut self, chunk_size: usize) -> Self {
    self.chunk_size = chunk_size;
    self
  }

  pub fn set_stall_timeout(mut self, stall_timeout: Duration) -> Self {
    self.stall_timeout = stall_timeout;
    self
  }

  pub fn build(self) -> Result<Updater, Error> {
    if self.manifest_source.trim().is_empty() {
      return Err(Error::InvalidConfiguration("no manifest source set".to_string()));
    }
    if self.chunk_size == 0 {
      return Err(Error::InvalidConfiguration("chunk size must be positive".to_string()));
    }

    let mut store = match (self.store, &self.bundled_fingerprints) {
      (Some(store), _) => store,
      (None, Some(path)) => FingerprintStore::load_bundled(path)?,
      (None, None) => FingerprintStore::new(Vec::new()),
    };
    for sentinel in self.sentinel_files {
      if !store.sentinel_files.contains(&sentinel) {
        store.sentinel_files.push(sentinel);
      }
    }
    if let Some(path) = self.store_path {
      store.load(path)?;
    }

    let mut client = reqwest::Client::builder()
      .user_agent(self.user_agent)
      .connect_timeout(self.connect_timeout);
    if let Some(timeout) = self.request_timeout {
      client = client.timeout(timeout);
    }
    let client = client.build()?;

    let downloader = Downloader::new(client.clone(), self.download_dir, RateLimiter::new(self.rate_limit))
      .with_retry_policy(self.retry_policy.clone())
      .with_chunk_size(self.chunk_size)
      .with_stall_timeout(self.stall_timeout);
    debug!("Downloading into {}", downloader.download_dir().display());

    Ok(Updater {
      manifest_source: self.manifest_source,
      client,
      downloader,
      detector: VersionDetector::new(Arc::new(Mutex::new(store)), self.install_markers),
      manifest: Mutex::new(None),
      report_url: self.report_url,
      retry_policy: self.retry_policy,
    })
  }
}

impl Default for UpdaterBuilder {
  fn default() -> Self {
    Self::new()
  }
}
