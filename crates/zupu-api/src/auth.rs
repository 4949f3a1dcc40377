//! Bearer-token extractors.
//!
//! [`Authenticated`] resolves the session on every request; [`AdminOnly`]
//! additionally requires the ADMIN role.

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use zupu_core::{
  account::{Role, Session, UserProfile},
  audit::{AuditAction, NewAuditEntry},
  store::{GenealogyBackend, IdentityStore},
};

use crate::{AppState, error::ApiError};

/// The caller's session and profile.
#[derive(Debug, Clone)]
pub struct Authenticated {
  pub session: Session,
  pub profile: UserProfile,
}

impl Authenticated {
  pub fn account_id(&self) -> uuid::Uuid { self.session.account_id }

  pub fn is_admin(&self) -> bool { self.profile.is_admin() }

  /// An audit entry attributed to this caller.
  pub fn audit(&self, action: AuditAction) -> NewAuditEntry {
    NewAuditEntry::new(Some(self.account_id()), action)
  }
}

/// An [`Authenticated`] caller holding the ADMIN role.
#[derive(Debug, Clone)]
pub struct AdminOnly(pub Authenticated);

/// The token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
  let (scheme, token) = value.split_once(' ')?;
  let token = token.trim();
  (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: GenealogyBackend + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)
      .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))?;

    let session = state
      .store
      .get_session(token)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::Unauthorized("invalid or expired session".into()))?;

    // A missing profile row is treated as the default role.
    let profile = state
      .store
      .get_profile(session.account_id)
      .await
      .map_err(ApiError::store)?
      .unwrap_or_else(|| UserProfile {
        account_id: session.account_id,
        role:       Role::User,
        updated_at: session.expires_at,
      });

    Ok(Authenticated { session, profile })
  }
}

impl<S> FromRequestParts<AppState<S>> for AdminOnly
where
  S: GenealogyBackend + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let caller = Authenticated::from_request_parts(parts, state).await?;
    if !caller.is_admin() {
      return Err(ApiError::Forbidden("administrator role required".into()));
    }
    Ok(AdminOnly(caller))
  }
}
