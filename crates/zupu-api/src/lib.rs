//! JSON REST API for the zupu family register.
//!
//! Exposes an axum [`Router`] backed by any [`GenealogyBackend`]. Sessions
//! are resolved from the bearer token on every request; TLS and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", zupu_api::api_router(store.clone(), ApiSettings::default()))
//! ```

pub mod accounts;
pub mod admin;
pub mod audit;
pub mod auth;
pub mod error;
pub mod events;
pub mod individuals;
pub mod relationships;
pub mod views;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use zupu_core::{describe::Locale, store::GenealogyBackend};

pub use error::ApiError;

/// Behaviour switches supplied by the host server.
#[derive(Debug, Clone)]
pub struct ApiSettings {
  /// Language of relationship descriptions and edge labels.
  pub locale:               Locale,
  /// Confirm new accounts immediately instead of issuing a verification
  /// token out of band.
  pub auto_confirm_signups: bool,
}

impl Default for ApiSettings {
  fn default() -> Self { Self { locale: Locale::En, auto_confirm_signups: true } }
}

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub settings: Arc<ApiSettings>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), settings: Arc::clone(&self.settings) }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, settings: ApiSettings) -> Router<()>
where
  S: GenealogyBackend + 'static,
{
  let state = AppState { store, settings: Arc::new(settings) };

  Router::new()
    // Accounts
    .route("/auth/signup", post(accounts::sign_up::<S>))
    .route("/auth/confirm", post(accounts::confirm::<S>))
    .route("/auth/signin", post(accounts::sign_in::<S>))
    .route("/auth/signout", post(accounts::sign_out::<S>))
    .route("/auth/session", get(accounts::current::<S>))
    .route("/profiles/{id}", get(accounts::profile::<S>))
    // Individuals
    .route("/individuals", get(individuals::list::<S>).post(individuals::create::<S>))
    .route(
      "/individuals/{id}",
      get(individuals::get_one::<S>)
        .patch(individuals::update::<S>)
        .delete(individuals::remove::<S>),
    )
    .route("/individuals/{id}/family", get(individuals::family::<S>))
    // Relationships
    .route("/relationships", get(relationships::list::<S>).post(relationships::create::<S>))
    .route("/relationships/{id}", axum::routing::delete(relationships::remove::<S>))
    // Events
    .route("/events", get(events::list::<S>).post(events::create::<S>))
    .route(
      "/events/{id}",
      get(events::get_one::<S>).patch(events::update::<S>).delete(events::remove::<S>),
    )
    // Views
    .route("/stats", get(views::stats::<S>))
    .route("/tree", get(views::tree::<S>))
    .route("/branches", get(views::branches::<S>))
    .route("/branches/{surname}", get(views::branch::<S>))
    // Administration
    .route("/admin/users", get(admin::users::<S>))
    .route("/admin/users/{id}/role", put(admin::set_role::<S>))
    .route("/admin/logs", get(admin::logs::<S>))
    .with_state(state)
}
