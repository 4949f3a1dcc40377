//! The signed-in identity of a running client.
//!
//! [`SessionContext`] is created once, initialised explicitly (from a saved
//! token, if any) and torn down explicitly on sign-out. Code that needs to
//! know who is signed in reads it from the context; only the context talks
//! to the [`IdentityStore`].

use crate::{
  Error,
  account::{Session, SignIn, UserProfile},
  store::IdentityStore,
};

/// Result of [`SessionContext::sign_in`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignInOutcome {
  SignedIn,
  InvalidCredentials,
  EmailNotConfirmed,
}

pub struct SessionContext<I: IdentityStore> {
  identity: I,
  session:  Option<Session>,
  profile:  Option<UserProfile>,
}

impl<I: IdentityStore> SessionContext<I> {
  /// A signed-out context. Call [`initialize`](Self::initialize) next.
  pub fn new(identity: I) -> Self { Self { identity, session: None, profile: None } }

  pub fn identity(&self) -> &I { &self.identity }

  /// Restore state from a previously saved token.
  ///
  /// An unknown or expired token leaves the context signed out.
  pub async fn initialize(&mut self, token: Option<&str>) -> Result<(), I::Error> {
    self.session = None;
    self.profile = None;
    let Some(token) = token else {
      return Ok(());
    };
    match self.identity.get_session(token).await? {
      Some(session) => {
        self.profile = self.identity.get_profile(session.account_id).await?;
        tracing::debug!(account_id = %session.account_id, "session restored");
        self.session = Some(session);
      }
      None => tracing::debug!("saved session is no longer valid"),
    }
    Ok(())
  }

  pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<SignInOutcome, I::Error> {
    match self.identity.sign_in(email, password).await? {
      SignIn::Session(session) => {
        self.profile = self.identity.get_profile(session.account_id).await?;
        self.session = Some(session);
        Ok(SignInOutcome::SignedIn)
      }
      SignIn::InvalidCredentials => Ok(SignInOutcome::InvalidCredentials),
      SignIn::EmailNotConfirmed => Ok(SignInOutcome::EmailNotConfirmed),
    }
  }

  /// Clear local state, then invalidate the token remotely.
  ///
  /// Local state is cleared even when the remote call fails; the failure is
  /// still returned.
  pub async fn sign_out(&mut self) -> Result<(), I::Error> {
    self.profile = None;
    match self.session.take() {
      Some(session) => self.identity.sign_out(&session.token).await,
      None => Ok(()),
    }
  }

  /// Re-fetch the profile, e.g. after a role change.
  pub async fn refresh_profile(&mut self) -> Result<(), I::Error> {
    if let Some(session) = &self.session {
      self.profile = self.identity.get_profile(session.account_id).await?;
    }
    Ok(())
  }

  pub fn session(&self) -> Option<&Session> { self.session.as_ref() }

  pub fn profile(&self) -> Option<&UserProfile> { self.profile.as_ref() }

  pub fn token(&self) -> Option<&str> { self.session.as_ref().map(|s| s.token.as_str()) }

  pub fn is_signed_in(&self) -> bool { self.session.is_some() }

  pub fn is_admin(&self) -> bool { self.profile.as_ref().is_some_and(UserProfile::is_admin) }

  pub fn require_session(&self) -> crate::Result<&Session> {
    self.session.as_ref().ok_or(Error::NotSignedIn)
  }

  pub fn require_admin(&self) -> crate::Result<&Session> {
    let session = self.require_session()?;
    if self.is_admin() { Ok(session) } else { Err(Error::AdminRequired) }
  }
}
