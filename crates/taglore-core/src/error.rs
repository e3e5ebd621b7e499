//! Error types for `taglore-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown action type: {0:?}")]
  UnknownActionType(String),

  #[error("decision payload {payload:?} does not match action {action:?}")]
  PayloadMismatch {
    action:  &'static str,
    payload: &'static str,
  },

  #[error("scorecard window must cover at least one day")]
  EmptyWindow,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
