use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use json::JsonValue;
use tracing::{debug, info, warn};

use crate::functions::{fingerprint_table, write_atomically};
use crate::structures::{Error, Fingerprint, FingerprintStore};
use crate::traits::AsString;

impl FingerprintStore {
  /// An empty store that hashes `sentinel_files` even before any record names them
  pub fn new(sentinel_files: Vec<String>) -> Self {
    Self {
      sentinel_files,
      ..Default::default()
    }
  }

  /// Builds the base table from a store document shipped with the application
  pub fn from_bundled(text: &str) -> Result<Self, Error> {
    let document = json::parse(text)?;
    if !document.is_object() {
      return Err(Error::InvalidConfiguration("bundled fingerprint store is not a JSON object".to_string()));
    }
    let mut store = Self::new(read_sentinel_files(&document));
    store.base = fingerprint_table(&document["versions"]);
    debug!("Bundled fingerprint store knows {} versions", store.base.len());
    Ok(store)
  }

  pub fn load_bundled(path: impl AsRef<Path>) -> Result<Self, Error> {
    let text = std::fs::read_to_string(path.as_ref())?;
    Self::from_bundled(&text)
  }

  /// Attaches the learned overlay stored at `path`, a missing file leaves the overlay empty
  pub fn load(&mut self, path: impl Into<PathBuf>) -> Result<(), Error> {
    let path = path.into();
    if path.exists() {
      let document = json::parse(&std::fs::read_to_string(&path)?)?;
      for sentinel in read_sentinel_files(&document) {
        if !self.sentinel_files.contains(&sentinel) {
          self.sentinel_files.push(sentinel);
        }
      }
      self.learned = fingerprint_table(&document["versions"]);
      info!("Loaded {} learned fingerprints from {}", self.learned.len(), path.display());
    }
    self.path = Some(path);
    self.dirty = false;
    Ok(())
  }

  /// Persists the learned overlay when it changed since the last load or save.
  ///
  /// Returns whether anything was written.
  pub fn save(&mut self) -> Result<bool, Error> {
    if !self.dirty {
      return Ok(false);
    }
    let path = match &self.path {
      Some(path) => path.clone(),
      None => {
        warn!("Fingerprint store has learned versions but no path to save them to");
        return Ok(false);
      }
    };
    let mut document = JsonValue::new_object();
    document["sentinel_files"] = JsonValue::Array(self.sentinel_files.iter().map(|s| JsonValue::from(s.as_str())).collect());
    document["versions"] = table_to_json(&self.learned);
    let updated = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default();
    document["updated"] = updated.into();
    write_atomically(&path, document.pretty(2).as_bytes())?;
    self.dirty = false;
    info!("Saved {} learned fingerprints to {}", self.learned.len(), path.display());
    Ok(true)
  }

  /// Merges `fingerprint` into the learned record of `version`, new hashes win per sentinel.
  ///
  /// Returns whether the effective record changed.
  pub fn learn(&mut self, version: &str, fingerprint: &Fingerprint) -> bool {
    let current = self.record(version).unwrap_or_default();
    let changed = fingerprint.iter().any(|(sentinel, hash)| current.get(sentinel) != Some(hash));
    if !changed {
      return false;
    }
    let learned = self.learned.entry(version.to_string()).or_default();
    for (sentinel, hash) in fingerprint {
      learned.insert(sentinel.clone(), hash.clone());
    }
    self.dirty = true;
    debug!("Learned {} sentinels for version {}", fingerprint.len(), version);
    true
  }

  /// Folds fingerprints from the manifest or a remote table into the base, never into the overlay.
  ///
  /// Returns how many records were added or changed.
  pub fn merge_remote(&mut self, table: &BTreeMap<String, Fingerprint>) -> usize {
    let mut changed = 0;
    for (version, fingerprint) in table {
      let record = self.base.entry(version.clone()).or_default();
      let mut record_changed = false;
      for (sentinel, hash) in fingerprint {
        if record.get(sentinel) != Some(hash) {
          record.insert(sentinel.clone(), hash.clone());
          record_changed = true;
        }
      }
      if record_changed {
        changed += 1;
      }
    }
    if changed > 0 {
      debug!("Merged {} remote fingerprint records", changed);
    }
    changed
  }

  /// The base record of `version` with learned sentinels laid over it
  pub fn record(&self, version: &str) -> Option<Fingerprint> {
    let base = self.base.get(version);
    let learned = self.learned.get(version);
    if base.is_none() && learned.is_none() {
      return None;
    }
    let mut record = base.cloned().unwrap_or_default();
    if let Some(learned) = learned {
      record.extend(learned.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    Some(record)
  }

  pub fn records(&self) -> BTreeMap<String, Fingerprint> {
    self.versions().into_iter().filter_map(|version| self.record(&version).map(|record| (version, record))).collect()
  }

  /// Declared sentinels followed by every other sentinel named in a record
  pub fn sentinels(&self) -> Vec<String> {
    let mut sentinels = self.sentinel_files.clone();
    let named: BTreeSet<&String> = self.base.values().chain(self.learned.values()).flat_map(|record| record.keys()).collect();
    for sentinel in named {
      if !sentinels.contains(sentinel) {
        sentinels.push(sentinel.clone());
      }
    }
    sentinels
  }

  pub fn versions(&self) -> Vec<String> {
    self.base.keys().chain(self.learned.keys()).cloned().collect::<BTreeSet<_>>().into_iter().collect()
  }

  pub fn is_dirty(&self) -> bool {
    self.dirty
  }

  pub fn path(&self) -> Option<&Path> {
    self.path.as_deref()
  }
}

fn read_sentinel_files(document: &JsonValue) -> Vec<String> {
  document["sentinel_files"].members().filter_map(|member| member.as_string_option()).collect()
}

fn table_to_json(table: &BTreeMap<String, Fingerprint>) -> JsonValue {
  let mut versions = JsonValue::new_object();
  for (version, fingerprint) in table {
    let mut record = JsonValue::new_object();
    for (sentinel, hash) in fingerprint {
      record[sentinel.as_str()] = hash.as_str().into();
    }
    versions[version.as_str()] = record;
  }
  versions
}
