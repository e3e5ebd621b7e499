//! Error type for `taglore-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] taglore_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value outside its closed vocabulary.
  #[error("column decode error: {0}")]
  Decode(String),

  /// Attempted to learn from an event that was never recorded.
  #[error("event not found: {0}")]
  EventNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
