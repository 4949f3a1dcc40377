//! Handlers for `/relationships` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/relationships` | Newest first, with names and a description |
//! | `POST`   | `/relationships` | Admin. Body: [`NewRelationship`]; 422 with a reason `code` when rejected |
//! | `DELETE` | `/relationships/{id}` | Admin |

use std::collections::{BTreeSet, HashMap};

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use zupu_core::{
  Error as CoreError,
  audit::AuditAction,
  describe::DescribedRelationship,
  individual::{Individual, IndividualId},
  relationship::{NewRelationship, RelationshipId},
  store::{DirectoryStore, GenealogyBackend, IndividualQuery, RelationshipQuery},
  validate::{Rejection, Validation, validate_new_relationship},
};

use crate::{
  AppState,
  audit::record,
  auth::{AdminOnly, Authenticated},
  error::ApiError,
};

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /relationships`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _caller: Authenticated,
) -> Result<Json<Vec<DescribedRelationship>>, ApiError>
where
  S: GenealogyBackend,
{
  let query = RelationshipQuery { involving: None, newest_first: true };
  let relationships = state.store.list_relationships(&query).await.map_err(ApiError::store)?;

  let ids: BTreeSet<IndividualId> =
    relationships.iter().flat_map(|r| [r.person_a_id, r.person_b_id]).collect();
  let people = people_by_id(state.store.as_ref(), ids).await?;

  let locale = state.settings.locale;
  let rows = relationships
    .into_iter()
    .map(|r| DescribedRelationship::new(r, &people, locale))
    .collect();
  Ok(Json(rows))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /relationships`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  AdminOnly(caller): AdminOnly,
  Json(body): Json<NewRelationship>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GenealogyBackend,
{
  if !body.kind.is_creatable() {
    return Err(CoreError::UnsupportedKind(body.kind.to_string()).into());
  }

  // Rejected before any lookup, so unknown ids still get the reason code.
  if body.person_a_id == body.person_b_id {
    return Err(ApiError::Rejected(Rejection::SelfRelationship));
  }

  let people = people_by_id(state.store.as_ref(), [body.person_a_id, body.person_b_id]).await?;
  for id in [body.person_a_id, body.person_b_id] {
    if !people.contains_key(&id) {
      return Err(ApiError::NotFound(format!("individual {id} not found")));
    }
  }

  // Any duplicate necessarily involves person A.
  let of_a = RelationshipQuery { involving: Some(body.person_a_id), newest_first: false };
  let existing = state.store.list_relationships(&of_a).await.map_err(ApiError::store)?;

  let verdict = validate_new_relationship(
    body.person_a_id,
    body.person_b_id,
    &body.kind,
    &existing,
    &people,
  );
  if let Validation::Rejected(reason) = verdict {
    tracing::debug!(code = reason.code(), "relationship rejected");
    return Err(ApiError::Rejected(reason));
  }

  let created = state.store.create_relationship(body).await.map_err(ApiError::store)?;
  let description =
    DescribedRelationship::new(created.clone(), &people, state.settings.locale).description;

  record(
    state.store.as_ref(),
    caller
      .audit(AuditAction::CreateRelationship)
      .with("relationship_id", created.id)
      .with("person_a_id", created.person_a_id)
      .with("person_b_id", created.person_b_id)
      .with("kind", created.kind.as_str())
      .with("description", description),
  )
  .await;

  Ok((StatusCode::CREATED, Json(created)))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /relationships/{id}`
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  AdminOnly(caller): AdminOnly,
  Path(id): Path<RelationshipId>,
) -> Result<StatusCode, ApiError>
where
  S: GenealogyBackend,
{
  let existing = state
    .store
    .get_relationship(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("relationship {id} not found")))?;

  if !state.store.delete_relationship(id).await.map_err(ApiError::store)? {
    return Err(ApiError::NotFound(format!("relationship {id} not found")));
  }

  record(
    state.store.as_ref(),
    caller
      .audit(AuditAction::DeleteRelationship)
      .with("relationship_id", id)
      .with("person_a_id", existing.person_a_id)
      .with("person_b_id", existing.person_b_id)
      .with("kind", existing.kind.as_str()),
  )
  .await;

  Ok(StatusCode::NO_CONTENT)
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn people_by_id<S: DirectoryStore>(
  store: &S,
  ids: impl IntoIterator<Item = IndividualId>,
) -> Result<HashMap<IndividualId, Individual>, ApiError> {
  let query = IndividualQuery::by_ids(ids);
  Ok(
    store
      .list_individuals(&query)
      .await
      .map_err(ApiError::store)?
      .into_iter()
      .map(|p| (p.id, p))
      .collect(),
  )
}
