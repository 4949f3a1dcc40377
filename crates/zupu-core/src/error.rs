//! Error types for `zupu-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("missing required field: {0}")]
  MissingField(&'static str),

  #[error("sex must be MALE or FEMALE")]
  InvalidSex,

  #[error("unsupported relationship kind: {0:?}")]
  UnsupportedKind(String),

  #[error("not signed in")]
  NotSignedIn,

  #[error("administrator role required")]
  AdminRequired,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
