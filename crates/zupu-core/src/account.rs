//! Accounts, sessions and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authorisation level of an account.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Role {
  #[default]
  User,
  Admin,
}

impl Role {
  pub fn as_str(self) -> &'static str { self.into() }
}

/// Per-account role assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
  pub account_id: Uuid,
  pub role:       Role,
  pub updated_at: DateTime<Utc>,
}

impl UserProfile {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

/// A profile joined with the account's e-mail, for the admin user list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
  #[serde(flatten)]
  pub profile: UserProfile,
  pub email:   String,
}

/// An authenticated session.
///
/// `token` is the bearer secret handed to the client; stores keep only a
/// digest of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
  pub token:      String,
  pub account_id: Uuid,
  pub email:      String,
  pub expires_at: DateTime<Utc>,
}

impl Session {
  pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool { self.expires_at <= now }
}

/// A session together with the profile it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
  pub session: Session,
  pub profile: UserProfile,
}

/// E-mail and password, as submitted to sign up or sign in.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
  pub email:    String,
  pub password: String,
}

impl std::fmt::Debug for Credentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Credentials")
      .field("email", &self.email)
      .field("password", &"<redacted>")
      .finish()
  }
}

/// Outcome of a sign-up attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUp {
  /// The account exists but must confirm its e-mail before signing in.
  PendingVerification {
    account_id:         Uuid,
    verification_token: String,
  },
  EmailTaken,
}

/// Outcome of a password sign-in attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignIn {
  Session(Session),
  InvalidCredentials,
  EmailNotConfirmed,
}

/// Normalise an e-mail address for lookup.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }
