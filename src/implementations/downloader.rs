use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures::StreamExt;
use reqwest::header::{CONTENT_RANGE, RANGE};
use reqwest::StatusCode;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::functions::{get_hash_async, retry};
use crate::structures::{DownloadResult, Downloader, Error, FileEntry, HashKind, ProgressFn, RateLimiter, RetryPolicy};

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
pub const DEFAULT_STALL_TIMEOUT_SECS: u64 = 30;
const PARTIAL_SUFFIX: &str = ".part";

/// Counters that survive from one attempt to the next
#[derive(Default)]
struct Transfer {
  bytes_this_run: AtomicU64,
  resumed: AtomicBool,
}

impl Downloader {
  pub fn new(client: reqwest::Client, download_dir: impl Into<PathBuf>, rate_limiter: RateLimiter) -> Self {
    Self {
      client,
      download_dir: download_dir.into(),
      rate_limiter,
      retry_policy: RetryPolicy::default(),
      chunk_size: DEFAULT_CHUNK_SIZE,
      stall_timeout: Duration::from_secs(DEFAULT_STALL_TIMEOUT_SECS),
    }
  }

  pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
    self.retry_policy = retry_policy;
    self
  }

  pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
    self.chunk_size = chunk_size.max(1);
    self
  }

  pub fn with_stall_timeout(mut self, stall_timeout: Duration) -> Self {
    self.stall_timeout = stall_timeout;
    self
  }

  pub fn rate_limiter(&self) -> &RateLimiter {
    &self.rate_limiter
  }

  pub fn download_dir(&self) -> &Path {
    &self.download_dir
  }

  /// Where `entry` ends up once verified
  pub fn destination(&self, entry: &FileEntry, subdir: Option<&str>) -> PathBuf {
    match subdir {
      Some(subdir) => self.download_dir.join(subdir).join(&entry.filename),
      None => self.download_dir.join(&entry.filename),
    }
  }

  /// Downloads `entry` into the download directory, resuming a partial file left by an earlier attempt.
  ///
  /// A destination that already matches the expected hash is returned without touching the network.
  /// The file only appears under its final name once it passed verification.
  #[instrument(skip(self, entry, progress, cancel), fields(file = %entry.filename))]
  pub async fn download_file(&self, entry: &FileEntry, progress: Option<&ProgressFn<'_>>, subdir: Option<&str>, cancel: &CancellationToken) -> Result<DownloadResult, Error> {
    if !entry.has_safe_filename() {
      return Err(Error::DownloadFailed(entry.url.clone(), format!("unusable filename {:?}", entry.filename)));
    }
    let destination = self.destination(entry, subdir);
    if let Some(parent) = destination.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    let partial = partial_path(&destination);

    if entry.has_hash() && destination.is_file() {
      let actual = get_hash_async(destination.clone(), HashKind::for_digest(&entry.md5)).await?;
      if HashKind::matches(&actual, &entry.md5) {
        let size = if entry.size > 0 { entry.size } else { tokio::fs::metadata(&destination).await?.len() };
        debug!("{} is already downloaded and verified", entry.filename);
        if let Some(progress) = progress {
          progress(size, size, &entry.filename);
        }
        return Ok(DownloadResult {
          entry: entry.clone(),
          local_path: destination,
          verified: true,
          resumed: false,
          bytes_downloaded_this_run: 0,
        });
      }
      info!("{} exists but does not match {}, downloading again", entry.filename, entry.md5);
    }

    let transfer = Transfer::default();
    {
      let partial = &partial;
      let transfer = &transfer;
      retry(&self.retry_policy, cancel, &entry.url, move |attempt| {
        self.attempt(entry, partial, progress, cancel, transfer, attempt)
      }).await?;
    }

    let verified = if entry.has_hash() {
      let actual = get_hash_async(partial.clone(), HashKind::for_digest(&entry.md5)).await?;
      if !HashKind::matches(&actual, &entry.md5) {
        error!("{} failed verification: got {}, expected {}", entry.filename, actual, entry.md5);
        remove_if_exists(&partial).await?;
        return Err(Error::HashMismatch(entry.filename.clone(), actual, entry.md5.clone()));
      }
      true
    } else {
      false
    };
    tokio::fs::rename(&partial, &destination).await?;
    info!("Downloaded {} to {}", entry.filename, destination.display());

    Ok(DownloadResult {
      entry: entry.clone(),
      local_path: destination,
      verified,
      resumed: transfer.resumed.load(Ordering::SeqCst),
      bytes_downloaded_this_run: transfer.bytes_this_run.load(Ordering::SeqCst),
    })
  }

  /// One request, continuing from whatever the partial file holds. Returns once the partial is complete.
  async fn attempt(&self, entry: &FileEntry, partial: &Path, progress: Option<&ProgressFn<'_>>, cancel: &CancellationToken, transfer: &Transfer, attempt: u32) -> Result<(), Error> {
    let mut resume_from = match tokio::fs::metadata(partial).await {
      Ok(metadata) => metadata.len(),
      Err(_) => 0,
    };
    if entry.size > 0 && resume_from > entry.size {
      warn!("{} holds {} bytes but {} are expected, starting over", partial.display(), resume_from, entry.size);
      remove_if_exists(partial).await?;
      resume_from = 0;
    }
    if entry.size > 0 && resume_from == entry.size {
      debug!("{} was completely downloaded by an earlier attempt", entry.filename);
      transfer.resumed.store(true, Ordering::SeqCst);
      return Ok(());
    }

    let mut request = self.client.get(&entry.url);
    if resume_from > 0 {
      request = request.header(RANGE, format!("bytes={}-", resume_from));
    }
    debug!("Requesting {} from byte {} (attempt {})", entry.url, resume_from, attempt);
    let response = tokio::select! {
      _ = cancel.cancelled() => return Err(Error::DownloadCancelled(entry.filename.clone())),
      response = request.send() => response?,
    };

    let status = response.status();
    if status == StatusCode::RANGE_NOT_SATISFIABLE {
      warn!("Server rejected resuming {} at byte {}, discarding the partial file", entry.filename, resume_from);
      remove_if_exists(partial).await?;
      return Err(Error::InvalidStatus(entry.url.clone(), status.as_u16()));
    }
    if !status.is_success() {
      return Err(Error::InvalidStatus(entry.url.clone(), status.as_u16()));
    }

    let content_length = response.content_length();
    let (mut file, mut downloaded, total) = if status == StatusCode::PARTIAL_CONTENT && resume_from > 0 {
      let (start, total) = response
        .headers()
        .get(CONTENT_RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_range)
        .unwrap_or((resume_from, None));
      if start != resume_from {
        remove_if_exists(partial).await?;
        return Err(Error::DownloadFailed(entry.url.clone(), format!("server resumed at byte {} instead of {}", start, resume_from)));
      }
      info!("Resuming {} at byte {}", entry.filename, resume_from);
      transfer.resumed.store(true, Ordering::SeqCst);
      let file = OpenOptions::new().append(true).create(true).open(partial).await?;
      let total = total.or(content_length.map(|length| resume_from + length)).unwrap_or(entry.size);
      (file, resume_from, total)
    } else {
      if resume_from > 0 {
        info!("Server ignored the range request for {}, starting over", entry.filename);
      }
      transfer.resumed.store(false, Ordering::SeqCst);
      let file = OpenOptions::new().write(true).create(true).truncate(true).open(partial).await?;
      (file, 0, content_length.unwrap_or(entry.size))
    };
    let total = if entry.size > 0 { entry.size } else { total };
    if let Some(progress) = progress {
      progress(downloaded, total, &entry.filename);
    }

    let mut stream = response.bytes_stream();
    loop {
      let next = tokio::select! {
        _ = cancel.cancelled() => {
          file.flush().await?;
          return Err(Error::DownloadCancelled(entry.filename.clone()));
        }
        next = tokio::time::timeout(self.stall_timeout, stream.next()) => next?,
      };
      let bytes = match next {
        Some(bytes) => bytes?,
        None => break,
      };
      for piece in bytes.chunks(self.chunk_size) {
        file.write_all(piece).await?;
        let length = piece.len() as u64;
        downloaded += length;
        transfer.bytes_this_run.fetch_add(length, Ordering::SeqCst);
        if let Err(error) = self.rate_limiter.acquire(length, cancel).await {
          file.flush().await?;
          return Err(error);
        }
        if let Some(progress) = progress {
          progress(downloaded, total, &entry.filename);
        }
      }
    }
    file.flush().await?;

    if total > 0 && downloaded < total {
      return Err(Error::IncompleteTransfer(entry.url.clone(), downloaded, total));
    }
    Ok(())
  }
}

fn partial_path(destination: &Path) -> PathBuf {
  let mut name = destination.file_name().map(|name| name.to_os_string()).unwrap_or_default();
  name.push(PARTIAL_SUFFIX);
  destination.with_file_name(name)
}

async fn remove_if_exists(path: &Path) -> Result<(), Error> {
  match tokio::fs::remove_file(path).await {
    Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
    result => Ok(result?),
  }
}

/// `bytes <start>-<end>/<total>`, the total may be `*`
fn parse_content_range(value: &str) -> Option<(u64, Option<u64>)> {
  let range = value.trim().strip_prefix("bytes")?.trim();
  let (span, total) = range.split_once('/')?;
  let (start, _) = span.split_once('-')?;
  Some((start.trim().parse().ok()?, total.trim().parse().ok()))
}
