//! Read-only aggregate views: dashboard statistics, the tree graph and
//! surname branches.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/stats` | [`Stats`] over every individual |
//! | `GET`  | `/tree` | Optional `?family=<surname>`; `all` or blank means everyone |
//! | `GET`  | `/branches` | Distinct surnames |
//! | `GET`  | `/branches/{surname}` | Members sorted by name |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use zupu_core::{
  audit::AuditAction,
  individual::Individual,
  stats::{Stats, compute_stats},
  store::{DirectoryStore, GenealogyBackend, IndividualOrder, IndividualQuery, RelationshipQuery},
  tree::{TreeFilter, TreeGraph, branch_members, build_tree, surnames},
};

use crate::{AppState, audit::record, auth::Authenticated, error::ApiError};

/// `GET /stats`
pub async fn stats<S>(
  State(state): State<AppState<S>>,
  _caller: Authenticated,
) -> Result<Json<Stats>, ApiError>
where
  S: GenealogyBackend,
{
  let everyone = everyone(state.store.as_ref()).await?;
  Ok(Json(compute_stats(&everyone, Utc::now())))
}

#[derive(Debug, Deserialize)]
pub struct TreeParams {
  pub family: Option<String>,
}

/// `GET /tree`
pub async fn tree<S>(
  State(state): State<AppState<S>>,
  caller: Authenticated,
  Query(params): Query<TreeParams>,
) -> Result<Json<TreeGraph>, ApiError>
where
  S: GenealogyBackend,
{
  let filter = TreeFilter::from_param(params.family.as_deref());
  let everyone = everyone(state.store.as_ref()).await?;
  let all_relationships = RelationshipQuery { involving: None, newest_first: false };
  let relationships =
    state.store.list_relationships(&all_relationships).await.map_err(ApiError::store)?;

  let graph = build_tree(&everyone, &relationships, &filter, state.settings.locale);

  let family = match &filter {
    TreeFilter::All => "all".to_owned(),
    TreeFilter::Surname(s) => s.clone(),
  };
  record(
    state.store.as_ref(),
    caller
      .audit(AuditAction::GenerateFamilyTree)
      .with("family", family)
      .with("node_count", graph.node_count())
      .with("edge_count", graph.edge_count()),
  )
  .await;

  Ok(Json(graph))
}

/// `GET /branches`
pub async fn branches<S>(
  State(state): State<AppState<S>>,
  _caller: Authenticated,
) -> Result<Json<Vec<String>>, ApiError>
where
  S: GenealogyBackend,
{
  let everyone = everyone(state.store.as_ref()).await?;
  Ok(Json(surnames(&everyone)))
}

/// `GET /branches/{surname}`
pub async fn branch<S>(
  State(state): State<AppState<S>>,
  caller: Authenticated,
  Path(surname): Path<String>,
) -> Result<Json<Vec<Individual>>, ApiError>
where
  S: GenealogyBackend,
{
  let surname = surname.trim();
  if surname.is_empty() {
    return Err(ApiError::BadRequest("surname must not be blank".into()));
  }

  let everyone = everyone(state.store.as_ref()).await?;
  let members: Vec<Individual> = branch_members(&everyone, surname).into_iter().cloned().collect();

  record(
    state.store.as_ref(),
    caller
      .audit(AuditAction::ViewFamilyBranch)
      .with("surname", surname)
      .with("member_count", members.len()),
  )
  .await;

  Ok(Json(members))
}

/// Every individual in insertion order, which fixes tree node positions.
async fn everyone<S: DirectoryStore>(store: &S) -> Result<Vec<Individual>, ApiError> {
  let query = IndividualQuery { order: IndividualOrder::CreatedAsc, ..IndividualQuery::default() };
  store.list_individuals(&query).await.map_err(ApiError::store)
}
