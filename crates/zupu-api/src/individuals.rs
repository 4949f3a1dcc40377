//! Handlers for `/individuals` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/individuals` | Optional `?q=<substring>&order=name\|created\|created_desc` |
//! | `POST`   | `/individuals` | Admin. Body: [`NewIndividual`] |
//! | `GET`    | `/individuals/{id}` | 404 if not found |
//! | `PATCH`  | `/individuals/{id}` | Admin. Body: [`IndividualPatch`] |
//! | `DELETE` | `/individuals/{id}` | Admin. Removes the individual's relationships too |
//! | `GET`    | `/individuals/{id}/family` | Parents, children and spouses |

use std::collections::HashMap;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use zupu_core::{
  audit::AuditAction,
  family::{FamilyView, family_view},
  individual::{Individual, IndividualId, IndividualPatch, NewIndividual},
  store::{DirectoryStore, GenealogyBackend, IndividualOrder, IndividualQuery, RelationshipQuery},
};

use crate::{
  AppState,
  audit::record,
  auth::{AdminOnly, Authenticated},
  error::ApiError,
};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub q:     Option<String>,
  #[serde(default)]
  pub order: IndividualOrder,
}

/// `GET /individuals`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _caller: Authenticated,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Individual>>, ApiError>
where
  S: GenealogyBackend,
{
  let query = IndividualQuery {
    ids:           None,
    name_contains: params.q.map(|q| q.trim().to_owned()).filter(|q| !q.is_empty()),
    order:         params.order,
  };
  let people = state.store.list_individuals(&query).await.map_err(ApiError::store)?;
  Ok(Json(people))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /individuals`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  AdminOnly(caller): AdminOnly,
  Json(body): Json<NewIndividual>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GenealogyBackend,
{
  let input = body.normalized()?;
  let created = state.store.create_individual(input).await.map_err(ApiError::store)?;

  record(
    state.store.as_ref(),
    caller
      .audit(AuditAction::CreateIndividual)
      .with("individual_id", created.id)
      .with("full_name", created.full_name.clone()),
  )
  .await;

  Ok((StatusCode::CREATED, Json(created)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /individuals/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  _caller: Authenticated,
  Path(id): Path<IndividualId>,
) -> Result<Json<Individual>, ApiError>
where
  S: GenealogyBackend,
{
  Ok(Json(find(&state, id).await?))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PATCH /individuals/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  AdminOnly(caller): AdminOnly,
  Path(id): Path<IndividualId>,
  Json(body): Json<IndividualPatch>,
) -> Result<Json<Individual>, ApiError>
where
  S: GenealogyBackend,
{
  let patch = body.normalized()?;
  if patch.is_empty() {
    return Err(ApiError::BadRequest("patch contains no fields".into()));
  }
  let fields = serde_json::to_value(&patch)
    .ok()
    .and_then(|v| v.as_object().map(|o| o.keys().cloned().collect::<Vec<_>>()))
    .unwrap_or_default();

  let updated = state
    .store
    .update_individual(id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;

  record(
    state.store.as_ref(),
    caller
      .audit(AuditAction::UpdateIndividual)
      .with("individual_id", id)
      .with("full_name", updated.full_name.clone())
      .with("fields", fields),
  )
  .await;

  Ok(Json(updated))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /individuals/{id}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  AdminOnly(caller): AdminOnly,
  Path(id): Path<IndividualId>,
) -> Result<StatusCode, ApiError>
where
  S: GenealogyBackend,
{
  let existing = find(&state, id).await?;
  if !state.store.delete_individual(id).await.map_err(ApiError::store)? {
    return Err(not_found(id));
  }

  record(
    state.store.as_ref(),
    caller
      .audit(AuditAction::DeleteIndividual)
      .with("individual_id", id)
      .with("full_name", existing.full_name),
  )
  .await;

  Ok(StatusCode::NO_CONTENT)
}

// ─── Family ──────────────────────────────────────────────────────────────────

/// `GET /individuals/{id}/family`
pub async fn family<S>(
  State(state): State<AppState<S>>,
  caller: Authenticated,
  Path(id): Path<IndividualId>,
) -> Result<Json<FamilyView>, ApiError>
where
  S: GenealogyBackend,
{
  let individual = find(&state, id).await?;
  let rel_query = RelationshipQuery { involving: Some(id), newest_first: false };
  let relationships =
    state.store.list_relationships(&rel_query).await.map_err(ApiError::store)?;

  let others = relationships.iter().filter_map(|r| r.other_side(id));
  let people: HashMap<_, _> = state
    .store
    .list_individuals(&IndividualQuery::by_ids(others))
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .map(|p| (p.id, p))
    .collect();

  let view = family_view(individual, &relationships, &people);

  record(
    state.store.as_ref(),
    caller
      .audit(AuditAction::ViewIndividual)
      .with("individual_id", id)
      .with("full_name", view.individual.full_name.clone())
      .with("relatives", view.relative_count()),
  )
  .await;

  Ok(Json(view))
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn find<S: DirectoryStore>(
  state: &AppState<S>,
  id: IndividualId,
) -> Result<Individual, ApiError> {
  state
    .store
    .get_individual(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))
}

fn not_found(id: IndividualId) -> ApiError { ApiError::NotFound(format!("individual {id} not found")) }
