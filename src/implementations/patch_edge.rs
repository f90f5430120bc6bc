use crate::structures::{FileEntry, PatchEdge};

impl PatchEdge {
  pub fn new(version_from: impl Into<String>, version_to: impl Into<String>, files: Vec<FileEntry>) -> Self {
    Self {
      version_from: version_from.into(),
      version_to: version_to.into(),
      files,
      crack: None,
    }
  }

  pub fn with_crack(mut self, crack: FileEntry) -> Self {
    self.crack = Some(crack);
    self
  }

  /// Bytes to transfer for this edge, crack included
  pub fn total_size(&self) -> u64 {
    self.all_files().fold(0u64, |total, file| total.saturating_add(file.size))
  }

  /// The edge's files in download order, the crack comes last
  pub fn all_files(&self) -> impl Iterator<Item = &FileEntry> {
    self.files.iter().chain(self.crack.iter())
  }

  /// Name of the subdirectory this edge's files are downloaded into
  pub fn directory_name(&self) -> String {
    format!("{}_to_{}", sanitize(&self.version_from), sanitize(&self.version_to))
  }
}

fn sanitize(version: &str) -> String {
  version
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn total_size_includes_crack() {
    let edge = PatchEdge::new("1.0", "1.1", vec![
      FileEntry::new("https://cdn.example.com/a.bin", 100, ""),
      FileEntry::new("https://cdn.example.com/b.bin", 50, ""),
    ]).with_crack(FileEntry::new("https://cdn.example.com/crack.zip", 7, ""));
    assert_eq!(edge.total_size(), 157);
    let names: Vec<&str> = edge.all_files().map(|f| f.filename.as_str()).collect();
    assert_eq!(names, vec!["a.bin", "b.bin", "crack.zip"]);
  }

  #[test]
  fn directory_name_is_filesystem_safe() {
    let edge = PatchEdge::new("1.0 beta", "1.1/rc", vec![]);
    assert_eq!(edge.directory_name(), "1.0_beta_to_1.1_rc");
  }
}
