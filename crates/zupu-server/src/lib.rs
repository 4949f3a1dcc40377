//! HTTP host for the zupu JSON API.
//!
//! Mounts [`zupu_api::api_router`] under `/api`, adds a liveness probe and
//! request tracing.

pub mod config;

use std::sync::Arc;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use zupu_api::ApiSettings;
use zupu_core::{
  account::{Role, UserProfile},
  store::{GenealogyBackend, IdentityStore},
};
use zupu_store_sqlite::SqliteStore;

pub use crate::config::ServerConfig;

/// Build the complete application router.
pub fn app<S>(store: Arc<S>, settings: ApiSettings) -> Router
where
  S: GenealogyBackend + 'static,
{
  Router::new()
    .route("/health", get(health))
    .nest("/api", zupu_api::api_router(store, settings))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

/// Grant the ADMIN role to the account registered under `email`.
///
/// Returns `None` if no such account exists.
pub async fn promote_admin(
  store: &SqliteStore,
  email: &str,
) -> zupu_store_sqlite::Result<Option<UserProfile>> {
  let Some(account_id) = store.account_id_by_email(email).await? else {
    return Ok(None);
  };
  let profile = store.update_role(account_id, Role::Admin).await?;
  tracing::info!(%account_id, email, "account promoted to admin");
  Ok(profile)
}
