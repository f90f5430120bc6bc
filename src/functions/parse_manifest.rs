use std::collections::BTreeMap;

use json::JsonValue;
use tracing::{debug, warn};

use crate::functions::fingerprint_table;
use crate::structures::{ArchivedVersion, DlcInfo, Error, FileEntry, Manifest, PatchEdge};
use crate::traits::AsString;

/// Decodes a manifest document.
///
/// `latest` and `patches` are validated strictly, every other section falls back to an empty value
/// when it is missing or of the wrong shape. Relative urls are resolved against `source_url`.
pub fn parse_manifest(raw: &str, source_url: &str) -> Result<Manifest, Error> {
  let document = json::parse(raw).map_err(|error| Error::InvalidManifest(format!("{} is not valid JSON: {}", source_url, error)))?;
  if !document.is_object() {
    return Err(Error::InvalidManifest(format!("{} is not a JSON object", source_url)));
  }
  let base = url::Url::parse(source_url).ok();

  let latest = match &document["latest"] {
    JsonValue::Null => None,
    value => Some(value.as_string_option().ok_or_else(|| Error::InvalidManifest("'latest' is not a string".to_string()))?),
  };

  let patches = match &document["patches"] {
    JsonValue::Null => Vec::new(),
    JsonValue::Array(patches) => patches
      .iter()
      .enumerate()
      .map(|(index, patch)| parse_patch(patch, base.as_ref()).map_err(|reason| Error::InvalidManifest(format!("patch {}: {}", index, reason))))
      .collect::<Result<Vec<_>, _>>()?,
    _ => return Err(Error::InvalidManifest("'patches' is not a list".to_string())),
  };

  let manifest = Manifest {
    source_url: source_url.to_string(),
    latest,
    patches,
    fingerprints: fingerprint_table(&document["fingerprints"]),
    fingerprints_url: optional_url(&document["fingerprints_url"], base.as_ref()),
    report_url: optional_url(&document["report_url"], base.as_ref()),
    game_latest: document["game_latest"].as_string_option(),
    game_latest_date: document["game_latest_date"].as_string_option(),
    dlc_downloads: parse_downloads(&document["dlc_downloads"], base.as_ref(), "dlc_downloads"),
    language_downloads: parse_downloads(&document["language_downloads"], base.as_ref(), "language_downloads"),
    archived_versions: parse_archived_versions(&document["archived_versions"], base.as_ref()),
    dlc_catalog: parse_dlc_catalog(&document["dlc_catalog"]),
    pending_features: document["pending_features"].members().filter_map(|feature| feature.as_string_option()).collect(),
  };
  debug!("Parsed manifest from {}: latest {:?}, {} patches", source_url, manifest.latest, manifest.patches.len());
  Ok(manifest)
}

fn parse_patch(value: &JsonValue, base: Option<&url::Url>) -> Result<PatchEdge, String> {
  if !value.is_object() {
    return Err("not an object".to_string());
  }
  let from = value["from"].as_string_option().ok_or("missing 'from' version")?;
  let to = value["to"].as_string_option().ok_or("missing 'to' version")?;
  let files = match &value["files"] {
    JsonValue::Null => Vec::new(),
    JsonValue::Array(files) => files
      .iter()
      .enumerate()
      .map(|(index, file)| parse_file_entry(file, base).map_err(|reason| format!("file {}: {}", index, reason)))
      .collect::<Result<Vec<_>, _>>()?,
    _ => return Err("'files' is not a list".to_string()),
  };
  let mut edge = PatchEdge::new(from, to, files);
  match &value["crack"] {
    JsonValue::Null => {},
    crack => edge = edge.with_crack(parse_file_entry(crack, base).map_err(|reason| format!("crack: {}", reason))?),
  }
  Ok(edge)
}

fn parse_file_entry(value: &JsonValue, base: Option<&url::Url>) -> Result<FileEntry, String> {
  if !value.is_object() {
    return Err("not an object".to_string());
  }
  let url = value["url"].as_string_option().filter(|url| !url.trim().is_empty()).ok_or("missing 'url'")?;
  let url = resolve_url(&url, base);
  let size = match &value["size"] {
    JsonValue::Null => 0,
    size => size.as_size().ok_or_else(|| format!("invalid size {}", size.dump()))?,
  };
  let md5 = value["md5"].as_string_option().unwrap_or_default();
  let mut entry = FileEntry::new(url, size, md5.trim());
  if let Some(filename) = value["filename"].as_string_option() {
    entry = entry.with_filename(filename);
  }
  if !entry.has_safe_filename() {
    return Err(format!("unusable filename {:?}", entry.filename));
  }
  Ok(entry)
}

fn resolve_url(url: &str, base: Option<&url::Url>) -> String {
  match (url::Url::parse(url), base) {
    (Err(url::ParseError::RelativeUrlWithoutBase), Some(base)) => base.join(url).map(String::from).unwrap_or_else(|_| url.to_string()),
    _ => url.to_string(),
  }
}

fn optional_url(value: &JsonValue, base: Option<&url::Url>) -> Option<String> {
  value.as_string_option().filter(|url| !url.trim().is_empty()).map(|url| resolve_url(&url, base))
}

fn parse_downloads(value: &JsonValue, base: Option<&url::Url>, section: &str) -> BTreeMap<String, FileEntry> {
  let mut downloads = BTreeMap::new();
  for (name, entry) in value.entries() {
    match parse_file_entry(entry, base) {
      Ok(entry) => {
        downloads.insert(name.to_string(), entry);
      },
      Err(reason) => warn!("Ignoring {} entry {}: {}", section, name, reason),
    }
  }
  downloads
}

fn parse_archived_versions(value: &JsonValue, base: Option<&url::Url>) -> BTreeMap<String, ArchivedVersion> {
  let mut archived = BTreeMap::new();
  for (version, entry) in value.entries() {
    let (files, date) = match entry {
      JsonValue::Array(_) => (entry, None),
      _ => (&entry["files"], entry["date"].as_string_option()),
    };
    let files: Vec<FileEntry> = files
      .members()
      .filter_map(|file| parse_file_entry(file, base).map_err(|reason| warn!("Ignoring archived file of {}: {}", version, reason)).ok())
      .collect();
    archived.insert(version.to_string(), ArchivedVersion {
      version: version.to_string(),
      files,
      date,
    });
  }
  archived
}

fn parse_dlc_catalog(value: &JsonValue) -> Vec<DlcInfo> {
  value
    .members()
    .filter_map(|item| {
      let id = item["id"].as_string_option()?;
      Some(DlcInfo {
        name: item["name"].as_string_option().unwrap_or_else(|| id.clone()),
        kind: item["kind"].as_string_option(),
        id,
      })
    })
    .collect()
}
