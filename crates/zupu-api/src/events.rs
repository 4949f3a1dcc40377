//! Handlers for `/events` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/events` | Most recent date first |
//! | `POST`   | `/events` | Admin. Body: [`NewEvent`] |
//! | `GET`    | `/events/{id}` | 404 if not found |
//! | `PATCH`  | `/events/{id}` | Admin. Body: [`EventPatch`] |
//! | `DELETE` | `/events/{id}` | Admin |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use zupu_core::{
  audit::AuditAction,
  event::{EventId, EventPatch, FamilyEvent, NewEvent},
  store::GenealogyBackend,
};

use crate::{
  AppState,
  audit::record,
  auth::{AdminOnly, Authenticated},
  error::ApiError,
};

/// `GET /events`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _caller: Authenticated,
) -> Result<Json<Vec<FamilyEvent>>, ApiError>
where
  S: GenealogyBackend,
{
  Ok(Json(state.store.list_events().await.map_err(ApiError::store)?))
}

/// `POST /events`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  AdminOnly(caller): AdminOnly,
  Json(body): Json<NewEvent>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GenealogyBackend,
{
  let created = state.store.create_event(body.normalized()?).await.map_err(ApiError::store)?;
  record(
    state.store.as_ref(),
    caller
      .audit(AuditAction::CreateEvent)
      .with("event_id", created.id)
      .with("title", created.title.clone()),
  )
  .await;
  Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /events/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _caller: Authenticated,
  Path(id): Path<EventId>,
) -> Result<Json<FamilyEvent>, ApiError>
where
  S: GenealogyBackend,
{
  state
    .store
    .get_event(id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| not_found(id))
}

/// `PATCH /events/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  AdminOnly(caller): AdminOnly,
  Path(id): Path<EventId>,
  Json(body): Json<EventPatch>,
) -> Result<Json<FamilyEvent>, ApiError>
where
  S: GenealogyBackend,
{
  let updated = state
    .store
    .update_event(id, body.normalized()?)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  record(
    state.store.as_ref(),
    caller
      .audit(AuditAction::UpdateEvent)
      .with("event_id", id)
      .with("title", updated.title.clone()),
  )
  .await;
  Ok(Json(updated))
}

/// `DELETE /events/{id}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  AdminOnly(caller): AdminOnly,
  Path(id): Path<EventId>,
) -> Result<StatusCode, ApiError>
where
  S: GenealogyBackend,
{
  if !state.store.delete_event(id).await.map_err(ApiError::store)? {
    return Err(not_found(id));
  }
  record(state.store.as_ref(), caller.audit(AuditAction::DeleteEvent).with("event_id", id)).await;
  Ok(StatusCode::NO_CONTENT)
}

fn not_found(id: EventId) -> ApiError { ApiError::NotFound(format!("event {id} not found")) }
