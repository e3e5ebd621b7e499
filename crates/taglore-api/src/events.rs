//! Handlers for `/events` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/events` | Body: [`NewEventBody`]; records the event and runs the learning engine; returns 201 |
//! | `GET`  | `/events` | Optional `action`, `since`, `until`, `limit` |
//! | `GET`  | `/events/:id` | Single event |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taglore_core::{
  event::{ActionType, Decision, Event, NewEvent},
  reinforce::LearningOutcome,
  store::{EventQuery, TagStore},
};
use uuid::Uuid;

use crate::error::ApiError;

// ─── Record ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /events`.
#[derive(Debug, Deserialize)]
pub struct NewEventBody {
  pub action:              ActionType,
  pub document_id:         Option<String>,
  pub rationale:           Option<String>,
  pub decision:            Decision,
  pub time_to_decision_ms: Option<i64>,
}

impl From<NewEventBody> for NewEvent {
  fn from(b: NewEventBody) -> Self {
    NewEvent {
      action:              b.action,
      document_id:         b.document_id,
      rationale:           b.rationale,
      decision:            b.decision,
      time_to_decision_ms: b.time_to_decision_ms,
    }
  }
}

/// The stored event together with what the learning engine did with it.
#[derive(Debug, Serialize)]
pub struct RecordedEvent {
  pub event:    Event,
  pub learning: LearningOutcome,
}

/// `POST /events` — returns 201 + [`RecordedEvent`].
///
/// Mismatched action/payload combinations are rejected with 422 before
/// anything is persisted.
pub async fn record<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewEventBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TagStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let input = NewEvent::from(body);
  input.validate().map_err(|e| ApiError::Validation(e.to_string()))?;

  let event = store
    .record_event(input)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let learning = store
    .learn_from(event.event_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok((StatusCode::CREATED, Json(RecordedEvent { event, learning })))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub action: Option<ActionType>,
  pub since:  Option<DateTime<Utc>>,
  pub until:  Option<DateTime<Utc>>,
  pub limit:  Option<usize>,
}

/// `GET /events[?action=...][&since=...][&until=...][&limit=...]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Event>>, ApiError>
where
  S: TagStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let query = EventQuery {
    action: params.action,
    since:  params.since,
    until:  params.until,
    limit:  params.limit,
  };

  let events = store
    .list_events(&query)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(events))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /events/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Event>, ApiError>
where
  S: TagStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let event = store
    .get_event(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("event {id} not found")))?;
  Ok(Json(event))
}
