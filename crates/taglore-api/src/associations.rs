//! Handlers for the learned-association endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET` | `/correlations` | Optional `keyword`, `code`, `sort`, `limit` |
//! | `GET` | `/restrictions` | Same parameters, negative polarity |
//! | `DELETE` | `/associations/:id` | Idempotent; always 204 |

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  Json,
};
use serde::Deserialize;
use taglore_core::{
  association::{Association, Polarity},
  store::{AssociationQuery, AssociationSort, TagStore},
};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  /// Substring filter on the keyword column.
  pub keyword: Option<String>,
  /// Substring filter on the taxonomy code column.
  pub code:    Option<String>,
  /// `strength` (default) or `occurrence`, descending.
  pub sort:    Option<AssociationSort>,
  pub limit:   Option<usize>,
}

impl From<ListParams> for AssociationQuery {
  fn from(p: ListParams) -> Self {
    AssociationQuery {
      keyword: p.keyword,
      code:    p.code,
      sort:    p.sort.unwrap_or_default(),
      limit:   p.limit,
    }
  }
}

async fn list<S>(
  store: Arc<S>,
  polarity: Polarity,
  params: ListParams,
) -> Result<Json<Vec<Association>>, ApiError>
where
  S: TagStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let rows = store
    .list_associations(polarity, &params.into())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(rows))
}

/// `GET /correlations[?keyword=...][&code=...][&sort=...][&limit=...]`
pub async fn list_correlations<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Association>>, ApiError>
where
  S: TagStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  list(store, Polarity::Correlate, params).await
}

/// `GET /restrictions[?keyword=...][&code=...][&sort=...][&limit=...]`
pub async fn list_restrictions<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Association>>, ApiError>
where
  S: TagStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  list(store, Polarity::Restrict, params).await
}

/// `DELETE /associations/:id` — 204 whether or not the row existed.
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: TagStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  store
    .delete_association(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(StatusCode::NO_CONTENT)
}
