//! JSON REST API for taglore.
//!
//! Exposes an axum [`Router`] backed by any [`taglore_core::store::TagStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", taglore_api::api_router(store.clone()))
//! ```

pub mod associations;
pub mod bias;
pub mod error;
pub mod events;
pub mod scorecard;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get},
};
use taglore_core::store::TagStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: TagStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Event log
    .route("/events", get(events::list::<S>).post(events::record::<S>))
    .route("/events/{id}", get(events::get_one::<S>))
    // Learned associations
    .route("/correlations", get(associations::list_correlations::<S>))
    .route("/restrictions", get(associations::list_restrictions::<S>))
    .route("/associations/{id}", delete(associations::delete_one::<S>))
    // Dashboards
    .route("/scorecard", get(scorecard::handler::<S>))
    // Suggestion pipeline
    .route("/bias", get(bias::handler::<S>))
    .with_state(store)
}
