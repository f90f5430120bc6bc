/// Digest algorithm, picked from the length of the expected hash
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
  Md5,
  Sha256,
}
