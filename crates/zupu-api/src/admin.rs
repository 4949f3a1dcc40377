//! Handlers for `/admin` endpoints. Every route requires the ADMIN role.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/admin/users` | Accounts with e-mail and role |
//! | `PUT`  | `/admin/users/{id}/role` | Body: `{"role":"ADMIN"\|"USER"}` |
//! | `GET`  | `/admin/logs` | `?action=<TAG>&page=<n>`, 50 entries per page |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use uuid::Uuid;
use zupu_core::{
  account::{AccountSummary, Role, UserProfile},
  audit::{AuditAction, AuditQuery, LogPage},
  store::GenealogyBackend,
};

use crate::{AppState, audit::record, auth::AdminOnly, error::ApiError};

pub const LOG_PAGE_SIZE: usize = 50;

/// `GET /admin/users`
pub async fn users<S>(
  State(state): State<AppState<S>>,
  _admin: AdminOnly,
) -> Result<Json<Vec<AccountSummary>>, ApiError>
where
  S: GenealogyBackend,
{
  Ok(Json(state.store.list_accounts().await.map_err(ApiError::store)?))
}

#[derive(Debug, Deserialize)]
pub struct RoleBody {
  pub role: Role,
}

/// `PUT /admin/users/{id}/role`
pub async fn set_role<S>(
  State(state): State<AppState<S>>,
  AdminOnly(caller): AdminOnly,
  Path(account_id): Path<Uuid>,
  Json(body): Json<RoleBody>,
) -> Result<Json<UserProfile>, ApiError>
where
  S: GenealogyBackend,
{
  let not_found = || ApiError::NotFound(format!("account {account_id} not found"));

  let previous = state
    .store
    .get_profile(account_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(not_found)?;
  let updated = state
    .store
    .update_role(account_id, body.role)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(not_found)?;

  record(
    state.store.as_ref(),
    caller
      .audit(AuditAction::RoleChange)
      .with("account_id", account_id.to_string())
      .with("previous_role", previous.role.as_str())
      .with("new_role", updated.role.as_str()),
  )
  .await;

  Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct LogParams {
  pub action: Option<String>,
  pub page:   Option<usize>,
}

/// `GET /admin/logs`
pub async fn logs<S>(
  State(state): State<AppState<S>>,
  _admin: AdminOnly,
  Query(params): Query<LogParams>,
) -> Result<Json<LogPage>, ApiError>
where
  S: GenealogyBackend,
{
  let page = params.page.unwrap_or(1).max(1);
  let action = params
    .action
    .map(|a| a.trim().to_ascii_uppercase())
    .filter(|a| !a.is_empty() && a != "ALL");

  let offset = (page - 1)
    .checked_mul(LOG_PAGE_SIZE)
    .ok_or_else(|| ApiError::BadRequest(format!("page {page} is out of range")))?;

  // One extra row tells whether another page exists.
  let query = AuditQuery { action, limit: LOG_PAGE_SIZE + 1, offset };
  let mut entries = state.store.list_entries(&query).await.map_err(ApiError::store)?;
  let has_more = entries.len() > LOG_PAGE_SIZE;
  entries.truncate(LOG_PAGE_SIZE);

  Ok(Json(LogPage { entries, page, has_more }))
}
