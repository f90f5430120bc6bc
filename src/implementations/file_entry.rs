use crate::structures::FileEntry;

impl FileEntry {
  /// Creates an entry whose filename is the last path segment of `url`
  pub fn new(url: impl Into<String>, size: u64, md5: impl Into<String>) -> Self {
    let url = url.into();
    let filename = Self::filename_from_url(&url);
    Self {
      url,
      size,
      md5: md5.into(),
      filename,
    }
  }

  pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
    self.filename = filename.into();
    self
  }

  pub fn has_hash(&self) -> bool {
    !self.md5.trim().is_empty()
  }

  /// Last non-empty path segment of the url, ignoring query and fragment
  pub fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
      if let Some(segment) = parsed.path_segments().and_then(|segments| segments.filter(|s| !s.is_empty()).last()) {
        return segment.to_string();
      }
      return String::new();
    }
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
      .rsplit(['/', '\\'])
      .find(|segment| !segment.is_empty())
      .unwrap_or_default()
      .to_string()
  }

  /// A filename is stored directly inside the download directory, so it must not walk out of it
  pub(crate) fn has_safe_filename(&self) -> bool {
    !self.filename.is_empty()
      && self.filename != "."
      && self.filename != ".."
      && !self.filename.contains(['/', '\\'])
  }
}
