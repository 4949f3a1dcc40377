//! Handlers for `/auth` and `/profiles` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/auth/signup` | Body: [`Credentials`]. 201, 409 if the e-mail is taken |
//! | `POST` | `/auth/confirm` | Body: `{"token":"..."}` |
//! | `POST` | `/auth/signin` | Body: [`Credentials`]. Returns [`SessionInfo`] |
//! | `POST` | `/auth/signout` | 204 |
//! | `GET`  | `/auth/session` | The caller's [`SessionInfo`] |
//! | `GET`  | `/profiles/{id}` | Own profile, or any profile for admins |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zupu_core::{
  account::{Credentials, SessionInfo, SignIn, SignUp, UserProfile},
  audit::AuditAction,
  store::{GenealogyBackend, IdentityStore},
};

use crate::{AppState, audit::record, auth::Authenticated, error::ApiError};

const MIN_PASSWORD_LEN: usize = 6;

// ─── Sign up ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct SignUpResponse {
  pub account_id: Uuid,
  /// `false` when the account still has to confirm its e-mail.
  pub confirmed:  bool,
}

/// `POST /auth/signup`
pub async fn sign_up<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<Credentials>,
) -> Result<impl IntoResponse, ApiError>
where
  S: GenealogyBackend,
{
  let email = body.email.trim();
  if !email.contains('@') {
    return Err(ApiError::BadRequest("a valid e-mail address is required".into()));
  }
  if body.password.chars().count() < MIN_PASSWORD_LEN {
    return Err(ApiError::BadRequest(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }

  let outcome = state.store.sign_up(email, &body.password).await.map_err(ApiError::store)?;
  let SignUp::PendingVerification { account_id, verification_token } = outcome else {
    return Err(ApiError::Conflict("e-mail address already registered".into()));
  };

  let confirmed = if state.settings.auto_confirm_signups {
    state.store.confirm_email(&verification_token).await.map_err(ApiError::store)?
  } else {
    // Stands in for mail delivery.
    tracing::info!(%account_id, %verification_token, "verification token issued");
    false
  };

  Ok((StatusCode::CREATED, Json(SignUpResponse { account_id, confirmed })))
}

// ─── Confirm ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ConfirmBody {
  pub token: String,
}

/// `POST /auth/confirm`
pub async fn confirm<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<ConfirmBody>,
) -> Result<StatusCode, ApiError>
where
  S: GenealogyBackend,
{
  if state.store.confirm_email(body.token.trim()).await.map_err(ApiError::store)? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound("unknown verification token".into()))
  }
}

// ─── Sign in / out ───────────────────────────────────────────────────────────

/// `POST /auth/signin`
pub async fn sign_in<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<Credentials>,
) -> Result<Json<SessionInfo>, ApiError>
where
  S: GenealogyBackend,
{
  let session = match state.store.sign_in(&body.email, &body.password).await {
    Ok(SignIn::Session(session)) => session,
    Ok(SignIn::InvalidCredentials) => {
      return Err(ApiError::Unauthorized("invalid e-mail or password".into()));
    }
    Ok(SignIn::EmailNotConfirmed) => {
      return Err(ApiError::Forbidden("e-mail address not confirmed".into()));
    }
    Err(e) => return Err(ApiError::store(e)),
  };

  let profile = load_profile(&state, session.account_id).await?;
  let caller = Authenticated { session, profile };
  record(
    state.store.as_ref(),
    caller.audit(AuditAction::UserLogin).with("email", caller.session.email.clone()),
  )
  .await;

  Ok(Json(SessionInfo { session: caller.session, profile: caller.profile }))
}

/// `POST /auth/signout`
pub async fn sign_out<S>(
  State(state): State<AppState<S>>,
  caller: Authenticated,
) -> Result<StatusCode, ApiError>
where
  S: GenealogyBackend,
{
  record(
    state.store.as_ref(),
    caller.audit(AuditAction::UserLogout).with("email", caller.session.email.clone()),
  )
  .await;
  state.store.sign_out(&caller.session.token).await.map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /auth/session`
pub async fn current<S>(caller: Authenticated) -> Json<SessionInfo>
where
  S: GenealogyBackend,
{
  Json(SessionInfo { session: caller.session, profile: caller.profile })
}

// ─── Profiles ────────────────────────────────────────────────────────────────

/// `GET /profiles/{id}`
pub async fn profile<S>(
  State(state): State<AppState<S>>,
  caller: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, ApiError>
where
  S: GenealogyBackend,
{
  if id != caller.account_id() && !caller.is_admin() {
    return Err(ApiError::Forbidden("profiles of other accounts are admin-only".into()));
  }
  state
    .store
    .get_profile(id)
    .await
    .map_err(ApiError::store)?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("profile {id} not found")))
}

async fn load_profile<S: IdentityStore>(
  state: &AppState<S>,
  account_id: Uuid,
) -> Result<UserProfile, ApiError> {
  state
    .store
    .get_profile(account_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile {account_id} not found")))
}
