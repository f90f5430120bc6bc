use std::collections::BTreeMap;

use json::JsonValue;

use crate::structures::{Error, Fingerprint};
use crate::traits::AsString;

/// Parses a fingerprint document, either a store file with a `versions` table or the bare table itself
pub fn parse_fingerprints(text: &str) -> Result<BTreeMap<String, Fingerprint>, Error> {
  let document = json::parse(text)?;
  if !document.is_object() {
    return Err(Error::InvalidManifest("fingerprint document is not a JSON object".to_string()));
  }
  if document["versions"].is_object() {
    return Ok(fingerprint_table(&document["versions"]));
  }
  Ok(fingerprint_table(&document))
}

/// `{version: {sentinel: hash}}`, entries of the wrong shape are dropped
pub(crate) fn fingerprint_table(value: &JsonValue) -> BTreeMap<String, Fingerprint> {
  let mut table = BTreeMap::new();
  if !value.is_object() {
    return table;
  }
  for (version, record) in value.entries() {
    if !record.is_object() {
      continue;
    }
    let fingerprint: Fingerprint = record
      .entries()
      .filter_map(|(sentinel, hash)| hash.as_string_option().map(|hash| (sentinel.to_string(), hash)))
      .collect();
    if !fingerprint.is_empty() {
      table.insert(version.to_string(), fingerprint);
    }
  }
  table
}
