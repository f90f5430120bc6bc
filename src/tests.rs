use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use md5::{Digest, Md5};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::structures::{
  Confidence, DownloadResult, Downloader, Error, FileEntry, FingerprintStore, PatchEdge, ProgressFn, RateLimiter, RetryPolicy,
  StatusFn,
};
use crate::traits::PatchApplier;
use crate::{CancellationToken, UpdaterBuilder};

fn content() -> Vec<u8> {
  (0..100u8).collect()
}

fn md5_hex(data: &[u8]) -> String {
  hex::encode(Md5::digest(data))
}

fn fast_retries(attempts: u32) -> RetryPolicy {
  RetryPolicy::exponential(attempts).with_initial_delay(Duration::from_millis(10))
}

fn downloader(directory: &Path) -> Downloader {
  Downloader::new(reqwest::Client::new(), directory, RateLimiter::unlimited()).with_retry_policy(fast_retries(3))
}

fn entry(server: &MockServer, data: &[u8]) -> FileEntry {
  FileEntry::new(format!("{}/files/patch.bin", server.uri()), data.len() as u64, md5_hex(data))
}

type Calls = Arc<Mutex<Vec<(u64, u64, String)>>>;

/// Shows the crate's logs for failing tests, filtered through RUST_LOG
fn init_logging() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

#[tokio::test]
async fn resumes_from_partial_file() {
  init_logging();
  let server = MockServer::start().await;
  let directory = tempfile::tempdir().unwrap();
  let data = content();
  std::fs::write(directory.path().join("patch.bin.part"), &data[..40]).unwrap();

  Mock::given(method("GET"))
    .and(path("/files/patch.bin"))
    .and(header("Range", "bytes=40-"))
    .respond_with(ResponseTemplate::new(206)
      .insert_header("Content-Range", "bytes 40-99/100")
      .set_body_bytes(data[40..].to_vec()))
    .expect(1)
    .mount(&server)
    .await;

  let result = downloader(directory.path()).download_file(&entry(&server, &data), None, None, &CancellationToken::new()).await.unwrap();
  assert!(result.verified);
  assert!(result.resumed);
  assert_eq!(result.bytes_downloaded_this_run, 60);
  assert_eq!(std::fs::read(directory.path().join("patch.bin")).unwrap(), data);
  assert!(!directory.path().join("patch.bin.part").exists());
}

#[tokio::test]
async fn verified_file_skips_the_network() {
  let server = MockServer::start().await;
  let directory = tempfile::tempdir().unwrap();
  let data = content();
  std::fs::write(directory.path().join("patch.bin"), &data).unwrap();

  Mock::given(method("GET"))
    .respond_with(ResponseTemplate::new(200).set_body_bytes(data.clone()))
    .expect(0)
    .mount(&server)
    .await;

  let calls: Calls = Arc::new(Mutex::new(Vec::new()));
  let recorder = calls.clone();
  let progress: &ProgressFn = &move |done: u64, total: u64, name: &str| recorder.lock().unwrap().push((done, total, name.to_string()));
  let result = downloader(directory.path()).download_file(&entry(&server, &data), Some(progress), None, &CancellationToken::new()).await.unwrap();
  assert!(result.verified);
  assert!(!result.resumed);
  assert_eq!(result.bytes_downloaded_this_run, 0);
  assert_eq!(*calls.lock().unwrap(), vec![(100, 100, "patch.bin".to_string())]);
}

#[tokio::test]
async fn corrupt_download_is_rejected_and_discarded() {
  let server = MockServer::start().await;
  let directory = tempfile::tempdir().unwrap();
  let data = content();
  let mut corrupt = data.clone();
  corrupt[99] ^= 0xff;

  Mock::given(method("GET"))
    .and(path("/files/patch.bin"))
    .respond_with(ResponseTemplate::new(200).set_body_bytes(corrupt))
    .expect(1)
    .mount(&server)
    .await;

  let error = downloader(directory.path()).download_file(&entry(&server, &data), None, None, &CancellationToken::new()).await.unwrap_err();
  assert!(error.is_integrity_error());
  assert!(error.to_string().contains(&md5_hex(&data)));
  assert!(!directory.path().join("patch.bin").exists());
  assert!(!directory.path().join("patch.bin.part").exists());
}

#[tokio::test]
async fn retries_server_errors() {
  let server = MockServer::start().await;
  let directory = tempfile::tempdir().unwrap();
  let data = content();

  Mock::given(method("GET"))
    .and(path("/files/patch.bin"))
    .respond_with(ResponseTemplate::new(500))
    .up_to_n_times(2)
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/files/patch.bin"))
    .respond_with(ResponseTemplate::new(200).set_body_bytes(data.clone()))
    .mount(&server)
    .await;

  let result = downloader(directory.path()).download_file(&entry(&server, &data), None, Some("retry"), &CancellationToken::new()).await.unwrap();
  assert!(result.verified);
  assert_eq!(result.local_path, directory.path().join("retry").join("patch.bin"));
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
  let server = MockServer::start().await;
  let directory = tempfile::tempdir().unwrap();
  let data = content();

  Mock::given(method("GET"))
    .respond_with(ResponseTemplate::new(503))
    .expect(2)
    .mount(&server)
    .await;

  let error = downloader(directory.path())
    .with_retry_policy(fast_retries(2))
    .download_file(&entry(&server, &data), None, None, &CancellationToken::new())
    .await
    .unwrap_err();
  assert!(matches!(error, Error::DownloadFailed(..)));
  assert!(error.is_download_error());
}

#[tokio::test]
async fn rejected_range_restarts_from_zero() {
  let server = MockServer::start().await;
  let directory = tempfile::tempdir().unwrap();
  let data = content();
  std::fs::write(directory.path().join("patch.bin.part"), b"stale bytes").unwrap();

  Mock::given(method("GET"))
    .and(path("/files/patch.bin"))
    .and(header("Range", "bytes=11-"))
    .respond_with(ResponseTemplate::new(416))
    .with_priority(1)
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/files/patch.bin"))
    .respond_with(ResponseTemplate::new(200).set_body_bytes(data.clone()))
    .mount(&server)
    .await;

  let result = downloader(directory.path()).download_file(&entry(&server, &data), None, None, &CancellationToken::new()).await.unwrap();
  assert!(result.verified);
  assert!(!result.resumed);
  assert_eq!(result.bytes_downloaded_this_run, 100);
}

#[tokio::test]
async fn server_ignoring_range_restarts_the_file() {
  let server = MockServer::start().await;
  let directory = tempfile::tempdir().unwrap();
  let data = content();
  std::fs::write(directory.path().join("patch.bin.part"), &data[..40]).unwrap();

  Mock::given(method("GET"))
    .and(path("/files/patch.bin"))
    .respond_with(ResponseTemplate::new(200).set_body_bytes(data.clone()))
    .mount(&server)
    .await;

  let result = downloader(directory.path()).download_file(&entry(&server, &data), None, None, &CancellationToken::new()).await.unwrap();
  assert!(!result.resumed);
  assert_eq!(std::fs::read(&result.local_path).unwrap(), data);
}

#[tokio::test]
async fn cancellation_keeps_the_partial_file() {
  let server = MockServer::start().await;
  let directory = tempfile::tempdir().unwrap();
  let data = content();

  Mock::given(method("GET"))
    .and(path("/files/patch.bin"))
    .respond_with(ResponseTemplate::new(200).set_body_bytes(data.clone()))
    .mount(&server)
    .await;

  let downloader = Downloader::new(reqwest::Client::new(), directory.path(), RateLimiter::new(20)).with_chunk_size(10);
  let cancel = CancellationToken::new();
  let trigger = cancel.clone();
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_millis(300)).await;
    trigger.cancel();
  });

  let error = downloader.download_file(&entry(&server, &data), None, None, &cancel).await.unwrap_err();
  assert!(error.is_cancelled());
  let partial = std::fs::metadata(directory.path().join("patch.bin.part")).unwrap().len();
  assert!(partial > 0 && partial < 100, "partial holds {} bytes", partial);
  assert!(!directory.path().join("patch.bin").exists());
}

#[tokio::test]
async fn complete_corrupt_partial_is_rejected_without_a_request() {
  let server = MockServer::start().await;
  let directory = tempfile::tempdir().unwrap();
  let data = content();
  let mut corrupt = data.clone();
  corrupt[99] ^= 0xff;
  std::fs::write(directory.path().join("patch.bin.part"), &corrupt).unwrap();

  Mock::given(method("GET"))
    .respond_with(ResponseTemplate::new(200).set_body_bytes(data.clone()))
    .expect(0)
    .mount(&server)
    .await;

  let error = downloader(directory.path()).download_file(&entry(&server, &data), None, None, &CancellationToken::new()).await.unwrap_err();
  assert!(matches!(error, Error::HashMismatch(..)));
  assert!(!directory.path().join("patch.bin.part").exists());
  assert!(!directory.path().join("patch.bin").exists());
}

#[tokio::test]
async fn restart_after_a_resumed_attempt_is_not_reported_as_resumed() {
  let server = MockServer::start().await;
  let directory = tempfile::tempdir().unwrap();
  let data = content();
  std::fs::write(directory.path().join("patch.bin.part"), &data[..40]).unwrap();

  Mock::given(method("GET"))
    .and(path("/files/patch.bin"))
    .and(header("Range", "bytes=40-"))
    .respond_with(ResponseTemplate::new(206)
      .insert_header("Content-Range", "bytes 40-99/100")
      .set_body_bytes(data[40..60].to_vec()))
    .with_priority(1)
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/files/patch.bin"))
    .respond_with(ResponseTemplate::new(200).set_body_bytes(data.clone()))
    .expect(1)
    .mount(&server)
    .await;

  let result = downloader(directory.path()).download_file(&entry(&server, &data), None, None, &CancellationToken::new()).await.unwrap();
  assert!(result.verified);
  assert!(!result.resumed);
  assert_eq!(result.bytes_downloaded_this_run, 120);
  assert_eq!(std::fs::read(&result.local_path).unwrap(), data);
}

fn manifest_document(server: &MockServer) -> String {
  let a = vec![1u8; 50];
  let b = vec![2u8; 30];
  format!(r#"{{
    "latest": "1.2",
    "game_latest": "1.2",
    "patches": [
      {{"from": "1.0", "to": "1.1", "files": [{{"url": "1.0-1.1/a.bin", "size": 50, "md5": "{}"}}],
        "crack": {{"url": "1.0-1.1/crack.zip", "size": 10}}}},
      {{"from": "1.1", "to": "1.2", "files": [{{"url": "1.1-1.2/b.bin", "size": 30, "md5": "{}"}}]}},
      {{"from": "0.9", "to": "1.0", "files": []}}
    ],
    "fingerprints": {{"1.0": {{"game.exe": "{}"}}}},
    "fingerprints_url": "fingerprints.json",
    "report_url": "{}/report"
  }}"#, md5_hex(&a), md5_hex(&b), md5_hex(b"release 1.0"), server.uri())
}

async fn mount_manifest(server: &MockServer) {
  Mock::given(method("GET"))
    .and(path("/manifest.json"))
    .respond_with(ResponseTemplate::new(200).set_body_string(manifest_document(server)))
    .mount(server)
    .await;
  Mock::given(method("GET"))
    .and(path("/fingerprints.json"))
    .respond_with(ResponseTemplate::new(200).set_body_string(format!(r#"{{"versions": {{"1.1": {{"game.exe": "{}"}}}}}}"#, md5_hex(b"release 1.1"))))
    .mount(server)
    .await;
}

async fn mount_patch_files(server: &MockServer) {
  for (file, data) in [("/1.0-1.1/a.bin", vec![1u8; 50]), ("/1.0-1.1/crack.zip", vec![3u8; 10]), ("/1.1-1.2/b.bin", vec![2u8; 30])] {
    Mock::given(method("GET"))
      .and(path(file))
      .respond_with(ResponseTemplate::new(200).set_body_bytes(data))
      .expect(1)
      .mount(server)
      .await;
  }
}

#[derive(Default)]
struct RecordingApplier {
  applied: Mutex<Vec<(String, Vec<String>)>>,
}

#[async_trait]
impl PatchApplier for RecordingApplier {
  async fn apply(&self, step: &PatchEdge, files: &[DownloadResult]) -> Result<(), Error> {
    let names = files.iter().map(|file| file.entry.filename.clone()).collect();
    self.applied.lock()?.push((step.directory_name(), names));
    Ok(())
  }
}

#[tokio::test]
async fn downloads_and_installs_an_update() {
  init_logging();
  let server = MockServer::start().await;
  mount_manifest(&server).await;
  mount_patch_files(&server).await;
  let directory = tempfile::tempdir().unwrap();
  let updater = UpdaterBuilder::new()
    .set_manifest_source(format!("{}/manifest.json", server.uri()))
    .set_download_dir(directory.path())
    .set_retry_policy(fast_retries(2))
    .build()
    .unwrap();
  let cancel = CancellationToken::new();

  let info = updater.check_update("1.0", None, &cancel).await.unwrap();
  assert!(info.update_available);
  assert!(!info.patch_pending);
  assert_eq!(info.step_count, 2);
  assert_eq!(info.total_size, 90);
  let plan = info.plan.unwrap();

  let calls: Calls = Arc::new(Mutex::new(Vec::new()));
  let statuses = Arc::new(Mutex::new(Vec::<String>::new()));
  let progress: &ProgressFn = &{
    let calls = calls.clone();
    move |done: u64, total: u64, name: &str| calls.lock().unwrap().push((done, total, name.to_string()))
  };
  let status: &StatusFn = &{
    let statuses = statuses.clone();
    move |message: &str| statuses.lock().unwrap().push(message.to_string())
  };
  let applier = RecordingApplier::default();
  let results = updater.install_update(&plan, &applier, Some(progress), Some(status), &cancel).await.unwrap();

  assert_eq!(results.len(), 3);
  assert!(results[0].verified);
  assert!(!results[1].verified);
  assert_eq!(results[2].local_path, directory.path().join("1.1_to_1.2").join("b.bin"));
  assert!(directory.path().join("1.0_to_1.1").join("crack.zip").exists());

  let calls = calls.lock().unwrap();
  assert_eq!(calls.last().unwrap(), &(90, 90, "b.bin".to_string()));
  assert!(calls.windows(2).all(|pair| pair[0].0 <= pair[1].0));
  assert_eq!(statuses.lock().unwrap()[0], "Downloading patch 1/2: 1.0 to 1.1");
  assert_eq!(*applier.applied.lock().unwrap(), vec![
    ("1.0_to_1.1".to_string(), vec!["a.bin".to_string(), "crack.zip".to_string()]),
    ("1.1_to_1.2".to_string(), vec!["b.bin".to_string()]),
  ]);
}

#[tokio::test]
async fn cancelled_update_stops_before_the_first_file() {
  let server = MockServer::start().await;
  mount_manifest(&server).await;
  Mock::given(method("GET"))
    .and(path("/1.0-1.1/a.bin"))
    .respond_with(ResponseTemplate::new(200))
    .expect(0)
    .mount(&server)
    .await;
  let directory = tempfile::tempdir().unwrap();
  let updater = UpdaterBuilder::new()
    .set_manifest_source(format!("{}/manifest.json", server.uri()))
    .set_download_dir(directory.path())
    .build()
    .unwrap();

  let plan = updater.plan_update("1.0", None, &CancellationToken::new()).await.unwrap();
  let cancel = CancellationToken::new();
  cancel.cancel();
  let error = updater.download_update(&plan, None, None, &cancel).await.unwrap_err();
  assert!(error.is_cancelled());
}

#[tokio::test]
async fn detects_and_learns_installations() {
  init_logging();
  let server = MockServer::start().await;
  mount_manifest(&server).await;
  Mock::given(method("POST"))
    .and(path("/report"))
    .and(body_string_contains("1.2-beta"))
    .respond_with(ResponseTemplate::new(204))
    .expect(1)
    .mount(&server)
    .await;

  let install = tempfile::tempdir().unwrap();
  let state = tempfile::tempdir().unwrap();
  let store_path = state.path().join("learned.json");
  std::fs::write(install.path().join("game.exe"), b"release 1.0").unwrap();
  let updater = UpdaterBuilder::new()
    .set_manifest_source(format!("{}/manifest.json", server.uri()))
    .set_fingerprint_store(FingerprintStore::new(vec!["game.exe".to_string()]))
    .set_store_path(&store_path)
    .set_install_markers(vec!["game.exe".to_string()])
    .build()
    .unwrap();
  let cancel = CancellationToken::new();

  let unknown = updater.detect_version(install.path()).await.unwrap();
  assert_eq!(unknown.confidence, Confidence::Unknown);

  updater.fetch_manifest(false, &cancel).await.unwrap();
  let detected = updater.detect_version(install.path()).await.unwrap();
  assert_eq!(detected.version.as_deref(), Some("1.0"));
  assert_eq!(detected.confidence, Confidence::Definitive);
  assert!(updater.store().lock().unwrap().record("1.1").is_some());

  std::fs::write(install.path().join("game.exe"), b"release 1.2 beta").unwrap();
  let hashes = updater.learn_installation(install.path(), "1.2-beta").await.unwrap();
  assert_eq!(hashes["game.exe"], md5_hex(b"release 1.2 beta"));
  assert!(store_path.exists());
  let detected = updater.detect_version(install.path()).await.unwrap();
  assert_eq!(detected.version.as_deref(), Some("1.2-beta"));

  let error = updater.detect_version(state.path()).await.unwrap_err();
  assert!(error.is_detection_error());
}

#[tokio::test]
async fn reads_manifest_from_local_files() {
  let directory = tempfile::tempdir().unwrap();
  let manifest_path = directory.path().join("manifest.json");
  std::fs::write(&manifest_path, r#"{"latest": "2.0", "game_latest": "2.1", "patches": [
    {"from": "1.0", "to": "2.0", "files": [{"url": "https://cdn.example.com/2.0.bin", "size": 7}]}
  ]}"#).unwrap();
  let cancel = CancellationToken::new();

  let by_path = UpdaterBuilder::new().set_manifest_source(manifest_path.to_string_lossy()).build().unwrap();
  let info = by_path.check_update("2.0", None, &cancel).await.unwrap();
  assert!(!info.update_available);
  assert!(info.patch_pending);

  let file_url = url::Url::from_file_path(&manifest_path).unwrap().to_string();
  let by_url = UpdaterBuilder::new().set_manifest_source(file_url).build().unwrap();
  let manifest = by_url.fetch_manifest(false, &cancel).await.unwrap();
  assert_eq!(manifest.latest.as_deref(), Some("2.0"));
  assert!(Arc::ptr_eq(&manifest, &by_url.fetch_manifest(false, &cancel).await.unwrap()));

  let missing = UpdaterBuilder::new().set_manifest_source(directory.path().join("absent.json").to_string_lossy()).build().unwrap();
  assert!(missing.fetch_manifest(false, &cancel).await.unwrap_err().is_manifest_error());
}

#[tokio::test]
async fn cancellation_interrupts_a_stalled_manifest_request() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/manifest.json"))
    .respond_with(ResponseTemplate::new(200).set_body_string(manifest_document(&server)).set_delay(Duration::from_secs(8)))
    .mount(&server)
    .await;
  let updater = UpdaterBuilder::new()
    .set_manifest_source(format!("{}/manifest.json", server.uri()))
    .build()
    .unwrap();
  let cancel = CancellationToken::new();
  let trigger = cancel.clone();
  tokio::spawn(async move {
    tokio::time::sleep(Duration::from_millis(200)).await;
    trigger.cancel();
  });

  let started = std::time::Instant::now();
  let error = updater.fetch_manifest(false, &cancel).await.unwrap_err();
  assert!(error.is_cancelled());
  assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
  assert!(updater.cached_manifest().unwrap().is_none());
}

#[tokio::test]
async fn unusable_remote_fingerprints_are_ignored() {
  for response in [ResponseTemplate::new(404), ResponseTemplate::new(200).set_body_string("not json")] {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/manifest.json"))
      .respond_with(ResponseTemplate::new(200).set_body_string(manifest_document(&server)))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/fingerprints.json"))
      .respond_with(response)
      .expect(1)
      .mount(&server)
      .await;
    let updater = UpdaterBuilder::new()
      .set_manifest_source(format!("{}/manifest.json", server.uri()))
      .set_fingerprint_store(FingerprintStore::new(vec!["game.exe".to_string()]))
      .build()
      .unwrap();

    let manifest = updater.fetch_manifest(false, &CancellationToken::new()).await.unwrap();
    assert_eq!(manifest.latest.as_deref(), Some("1.2"));
    let store = updater.store();
    let store = store.lock().unwrap();
    assert!(store.record("1.0").is_some());
    assert!(store.record("1.1").is_none());
  }
}
