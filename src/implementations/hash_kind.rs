use crate::structures::HashKind;

impl HashKind {
  /// SHA-256 for 64 hex characters, MD5 for everything else
  pub fn for_digest(expected: &str) -> Self {
    if expected.trim().len() == 64 {
      Self::Sha256
    } else {
      Self::Md5
    }
  }

  pub fn matches(actual: &str, expected: &str) -> bool {
    actual.trim().eq_ignore_ascii_case(expected.trim())
  }
}
