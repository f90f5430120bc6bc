/// Lenient accessors for loosely typed JSON documents
pub(crate) trait AsString {
  fn as_string_option(&self) -> Option<String>;
  /// Sizes arrive as numbers or as numeric strings depending on who generated the document
  fn as_size(&self) -> Option<u64>;
}

impl AsString for json::JsonValue {
  fn as_string_option(&self) -> Option<String> {
    match *self {
      json::JsonValue::Short(ref value)  => Some(value.to_string()),
      json::JsonValue::String(ref value) => Some(value.to_string()),
      _                                  => None
    }
  }

  fn as_size(&self) -> Option<u64> {
    match *self {
      json::JsonValue::Number(_)         => self.as_u64(),
      json::JsonValue::Short(ref value)  => value.as_str().trim().parse().ok(),
      json::JsonValue::String(ref value) => value.trim().parse().ok(),
      _                                  => None
    }
  }
}
