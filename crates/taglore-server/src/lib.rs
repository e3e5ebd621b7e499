//! HTTP server layer for taglore.
//!
//! Mounts the [`taglore_api`] router under `/api` behind HTTP Basic auth,
//! with request tracing. Storage is an in-process SQLite file.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::get};
use taglore_core::store::TagStore;
use tower_http::trace::TraceLayer;

use auth::AuthConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(serde::Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  pub auth_username:      String,
  /// PHC string produced by argon2; see the `--hash-password` helper.
  pub auth_password_hash: String,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the server layer.
#[derive(Clone)]
pub struct AppState<S: TagStore> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub auth:   Arc<AuthConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full axum [`Router`]: `/health` (unauthenticated) plus the
/// JSON API under `/api` behind Basic auth.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: TagStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let api = taglore_api::api_router(state.store.clone()).layer(
    middleware::from_fn_with_state(state.auth.clone(), auth::require_auth),
  );

  Router::new()
    .route("/health", get(health))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

async fn health() -> &'static str { "ok" }
