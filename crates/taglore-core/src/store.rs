//! The `TagStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `taglore-store-sqlite`). Higher layers (`taglore-api`, `taglore-server`)
//! depend on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  association::{Association, Polarity},
  event::{ActionType, Event, NewEvent},
  reinforce::LearningOutcome,
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`TagStore::list_events`].
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
  pub action: Option<ActionType>,
  pub since:  Option<DateTime<Utc>>,
  pub until:  Option<DateTime<Utc>>,
  pub limit:  Option<usize>,
}

/// Sort order for association listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssociationSort {
  #[default]
  Strength,
  Occurrence,
}

/// Parameters for [`TagStore::list_associations`].
#[derive(Debug, Clone, Default)]
pub struct AssociationQuery {
  /// Substring filter on the keyword column.
  pub keyword: Option<String>,
  /// Substring filter on the taxonomy code column.
  pub code:    Option<String>,
  pub sort:    AssociationSort,
  pub limit:   Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a taglore storage backend.
///
/// The event log is append-only; associations are mutated only through
/// [`learn_from`](TagStore::learn_from) (reinforcement) and
/// [`delete_association`](TagStore::delete_association) (explicit admin
/// removal).
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait TagStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Event log — append-only writes ────────────────────────────────────

  /// Validate and persist a new event. `event_id` and `created_at` are set
  /// by the store. Invalid action/payload combinations are rejected and
  /// nothing is persisted.
  fn record_event(
    &self,
    input: NewEvent,
  ) -> impl Future<Output = Result<Event, Self::Error>> + Send + '_;

  /// Retrieve an event by id. Returns `None` if not found.
  fn get_event(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Event>, Self::Error>> + Send + '_;

  /// List events for the audit view, newest first.
  fn list_events<'a>(
    &'a self,
    query: &'a EventQuery,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + 'a;

  /// All events with `created_at` in `[start, end]`, oldest first (ties
  /// broken by insertion order). Input for scorecard aggregation.
  fn events_between(
    &self,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Event>, Self::Error>> + Send + '_;

  // ── Reinforcement ─────────────────────────────────────────────────────

  /// Apply the learning plan for an already-recorded event, exactly once.
  ///
  /// The plan is applied atomically together with a ledger entry for the
  /// event id; replaying the same id returns
  /// [`LearningOutcome::AlreadyApplied`] and mutates nothing. Errors if the
  /// event id is unknown.
  fn learn_from(
    &self,
    event_id: Uuid,
  ) -> impl Future<Output = Result<LearningOutcome, Self::Error>> + Send + '_;

  // ── Associations ──────────────────────────────────────────────────────

  /// List one polarity's associations, filtered and sorted per `query`.
  fn list_associations<'a>(
    &'a self,
    polarity: Polarity,
    query: &'a AssociationQuery,
  ) -> impl Future<Output = Result<Vec<Association>, Self::Error>> + Send + 'a;

  /// Fetch a single association by its natural key.
  fn get_association<'a>(
    &'a self,
    polarity: Polarity,
    keyword: &'a str,
    taxonomy_code: &'a str,
  ) -> impl Future<Output = Result<Option<Association>, Self::Error>> + Send + 'a;

  /// Delete an association row by id, whichever polarity it belongs to.
  /// Idempotent: returns `false` when no row existed, which is success.
  fn delete_association(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Raw `(correlations, restrictions)` rows for the given keywords, for
  /// [`crate::bias::resolve_bias`]. Must not queue behind reinforcement
  /// writes beyond ordinary statement granularity — this path is called
  /// inline during document ingestion.
  fn bias_rows<'a>(
    &'a self,
    keywords: &'a [String],
  ) -> impl Future<Output = Result<(Vec<Association>, Vec<Association>), Self::Error>>
  + Send
  + 'a;
}
