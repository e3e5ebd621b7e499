//! Handler for `GET /bias` — the read path consumed by the tag-suggestion
//! pipeline during document ingestion.
//!
//! `keywords` is accepted as a comma-separated string. Unknown keywords get
//! empty entries; a restriction always wins over a correlation for the same
//! (keyword, code) pair.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use taglore_core::{
  bias::{BiasEntry, resolve_bias},
  store::TagStore,
};

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct BiasParams {
  /// Comma-separated keywords, e.g. `balanço,contabilidade`.
  pub keywords: Option<String>,
}

/// `GET /bias?keywords=a,b,c`
pub async fn handler<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<BiasParams>,
) -> Result<Json<BTreeMap<String, BiasEntry>>, ApiError>
where
  S: TagStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let keywords: Vec<String> = params
    .keywords
    .map(|s| {
      s.split(',')
        .map(|k| k.trim().to_owned())
        .filter(|k| !k.is_empty())
        .collect()
    })
    .unwrap_or_default();

  let (correlations, restrictions) = store
    .bias_rows(&keywords)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  Ok(Json(resolve_bias(&keywords, &correlations, &restrictions)))
}
