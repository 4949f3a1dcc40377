//! Error type for `zupu-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored column could not be decoded into its domain type.
  #[error("decode error: {0}")]
  Decode(String),

  #[error("password hashing failed: {0}")]
  PasswordHash(String),

  #[error("session lifetime {0} is out of range")]
  SessionTtl(chrono::Duration),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
