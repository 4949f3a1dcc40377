//! Collaborator traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g. `zupu-store-sqlite`)
//! and by remote clients (e.g. the CLI's HTTP client for [`IdentityStore`]).
//! Higher layers (`zupu-api`, `zupu-cli`) depend on these abstractions, not
//! on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  account::{AccountSummary, Role, Session, SignIn, SignUp, UserProfile},
  audit::{AuditEntry, AuditQuery, NewAuditEntry},
  event::{EventId, EventPatch, FamilyEvent, NewEvent},
  individual::{Individual, IndividualId, IndividualPatch, NewIndividual},
  relationship::{NewRelationship, Relationship, RelationshipId},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Sort order for [`DirectoryStore::list_individuals`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndividualOrder {
  #[default]
  Name,
  #[serde(alias = "created")]
  CreatedAsc,
  CreatedDesc,
}

/// Parameters for [`DirectoryStore::list_individuals`].
#[derive(Debug, Clone, Default)]
pub struct IndividualQuery {
  /// Restrict to these ids. `Some(vec![])` matches nothing.
  pub ids:           Option<Vec<IndividualId>>,
  /// Case-insensitive substring match on the full name.
  pub name_contains: Option<String>,
  pub order:         IndividualOrder,
}

impl IndividualQuery {
  pub fn by_ids(ids: impl IntoIterator<Item = IndividualId>) -> Self {
    Self { ids: Some(ids.into_iter().collect()), ..Default::default() }
  }
}

/// Parameters for [`DirectoryStore::list_relationships`].
#[derive(Debug, Clone, Default)]
pub struct RelationshipQuery {
  /// Only relationships with this individual on either side.
  pub involving:    Option<IndividualId>,
  /// Newest first when `true`, otherwise creation order.
  pub newest_first: bool,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Shared error surface of the collaborator traits.
pub trait Backend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
}

/// Individuals, relationships and family events.
///
/// Deleting an individual removes every relationship that references it.
pub trait DirectoryStore: Backend {
  // ── Individuals ───────────────────────────────────────────────────────

  /// Persist a new individual. `id` and `created_at` are set by the store.
  fn create_individual(
    &self,
    input: NewIndividual,
  ) -> impl Future<Output = Result<Individual, Self::Error>> + Send + '_;

  fn get_individual(
    &self,
    id: IndividualId,
  ) -> impl Future<Output = Result<Option<Individual>, Self::Error>> + Send + '_;

  fn list_individuals<'a>(
    &'a self,
    query: &'a IndividualQuery,
  ) -> impl Future<Output = Result<Vec<Individual>, Self::Error>> + Send + 'a;

  /// Returns `None` if the individual does not exist.
  fn update_individual(
    &self,
    id: IndividualId,
    patch: IndividualPatch,
  ) -> impl Future<Output = Result<Option<Individual>, Self::Error>> + Send + '_;

  /// Returns `false` if nothing was deleted.
  fn delete_individual(
    &self,
    id: IndividualId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Relationships ─────────────────────────────────────────────────────

  /// Fails if the (A, B, kind) triple already exists or an endpoint is
  /// missing.
  fn create_relationship(
    &self,
    input: NewRelationship,
  ) -> impl Future<Output = Result<Relationship, Self::Error>> + Send + '_;

  fn get_relationship(
    &self,
    id: RelationshipId,
  ) -> impl Future<Output = Result<Option<Relationship>, Self::Error>> + Send + '_;

  fn list_relationships<'a>(
    &'a self,
    query: &'a RelationshipQuery,
  ) -> impl Future<Output = Result<Vec<Relationship>, Self::Error>> + Send + 'a;

  fn delete_relationship(
    &self,
    id: RelationshipId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Events ────────────────────────────────────────────────────────────

  fn create_event(
    &self,
    input: NewEvent,
  ) -> impl Future<Output = Result<FamilyEvent, Self::Error>> + Send + '_;

  fn get_event(
    &self,
    id: EventId,
  ) -> impl Future<Output = Result<Option<FamilyEvent>, Self::Error>> + Send + '_;

  /// All events, most recent date first.
  fn list_events(&self) -> impl Future<Output = Result<Vec<FamilyEvent>, Self::Error>> + Send + '_;

  fn update_event(
    &self,
    id: EventId,
    patch: EventPatch,
  ) -> impl Future<Output = Result<Option<FamilyEvent>, Self::Error>> + Send + '_;

  fn delete_event(
    &self,
    id: EventId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

/// Accounts, sessions and role assignment.
pub trait IdentityStore: Backend {
  /// Register an account. A profile with [`Role::User`] is created with it.
  fn sign_up<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<SignUp, Self::Error>> + Send + 'a;

  /// Consume a verification token. Returns `false` if it is unknown.
  fn confirm_email<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn sign_in<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<SignIn, Self::Error>> + Send + 'a;

  /// Invalidate a session token. Unknown tokens are ignored.
  fn sign_out<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Resolve a bearer token. Expired sessions resolve to `None`.
  fn get_session<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<Option<Session>, Self::Error>> + Send + 'a;

  fn get_profile(
    &self,
    account_id: Uuid,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + '_;

  /// Every account, most recently updated profile first.
  fn list_accounts(
    &self,
  ) -> impl Future<Output = Result<Vec<AccountSummary>, Self::Error>> + Send + '_;

  /// Returns `None` if the account does not exist.
  fn update_role(
    &self,
    account_id: Uuid,
    role: Role,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + '_;
}

/// Append-only audit trail.
pub trait AuditSink: Backend {
  fn append(
    &self,
    entry: NewAuditEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Entries newest first, for display only.
  fn list_entries<'a>(
    &'a self,
    query: &'a AuditQuery,
  ) -> impl Future<Output = Result<Vec<AuditEntry>, Self::Error>> + Send + 'a;
}

/// Everything a full genealogy backend provides.
pub trait GenealogyBackend: DirectoryStore + IdentityStore + AuditSink {}

impl<T> GenealogyBackend for T where T: DirectoryStore + IdentityStore + AuditSink {}
