//! Handler for `GET /scorecard`.
//!
//! The scorecard is recomputed from the raw event log on every read; event
//! volume is admin-paced, so there is no materialised rollup to invalidate.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use taglore_core::{
  scorecard::{Scorecard, ScorecardWindow, compute_scorecard},
  store::TagStore,
};

use crate::error::ApiError;

const DEFAULT_WINDOW_DAYS: u32 = 14;

#[derive(Debug, Deserialize, Default)]
pub struct ScorecardParams {
  /// Trailing window size in whole UTC days; defaults to 14, must be ≥ 1.
  pub days:  Option<u32>,
  /// Window end; defaults to now.
  pub until: Option<DateTime<Utc>>,
}

/// `GET /scorecard[?days=14][&until=rfc3339]`
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ScorecardParams>,
) -> Result<Json<Scorecard>, ApiError>
where
  S: TagStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let window = ScorecardWindow::trailing(
    params.days.unwrap_or(DEFAULT_WINDOW_DAYS),
    params.until.unwrap_or_else(Utc::now),
  )
  .map_err(|e| ApiError::Validation(e.to_string()))?;

  let events = store
    .events_between(window.start(), window.until)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(compute_scorecard(window, &events)))
}
