use crate::structures::{Confidence, DetectionResult};

impl DetectionResult {
  pub fn is_definitive(&self) -> bool {
    self.confidence == Confidence::Definitive
  }

  pub fn is_unknown(&self) -> bool {
    self.confidence == Confidence::Unknown
  }
}

impl std::fmt::Display for Confidence {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    match self {
      Self::Definitive => write!(f, "definitive"),
      Self::Probable => write!(f, "probable"),
      Self::Unknown => write!(f, "unknown"),
    }
  }
}
