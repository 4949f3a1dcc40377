//! Async HTTP client wrapping the zupu JSON API.
//!
//! [`ApiClient`] implements [`DirectoryStore`] and [`IdentityStore`] so the
//! rest of the client works against the same traits as the server does.
//! Endpoints without a trait counterpart (views, administration) are
//! inherent methods.

use std::{sync::RwLock, time::Duration};

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;
use zupu_core::{
  account::{AccountSummary, Credentials, Role, Session, SessionInfo, SignIn, SignUp, UserProfile},
  audit::LogPage,
  describe::DescribedRelationship,
  event::{EventId, EventPatch, FamilyEvent, NewEvent},
  family::FamilyView,
  individual::{Individual, IndividualId, IndividualPatch, NewIndividual},
  relationship::{NewRelationship, Relationship, RelationshipId},
  stats::Stats,
  store::{Backend, DirectoryStore, IdentityStore, IndividualOrder, IndividualQuery, RelationshipQuery},
  tree::TreeGraph,
};

#[derive(Debug, Error)]
pub enum Error {
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("invalid server url: {0}")]
  InvalidUrl(String),

  /// A non-success response. `code` carries the rejection reason when the
  /// server supplied one.
  #[error("{status}: {message}")]
  Api {
    status:  StatusCode,
    message: String,
    code:    Option<String>,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
  #[serde(default)]
  error: String,
  code:  Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignUpBody {
  account_id: Uuid,
}

/// Async HTTP client for the zupu JSON REST API.
///
/// The bearer token is set by a successful sign-in or session restore and
/// cleared on sign-out.
pub struct ApiClient {
  client:   Client,
  base_url: String,
  token:    RwLock<Option<String>>,
}

impl ApiClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let base_url = base_url.into();
    reqwest::Url::parse(&base_url).map_err(|e| Error::InvalidUrl(format!("{base_url}: {e}")))?;
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, base_url, token: RwLock::new(None) })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.base_url.trim_end_matches('/'), path)
  }

  fn token(&self) -> Option<String> {
    self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
  }

  fn set_token(&self, token: Option<String>) {
    *self.token.write().unwrap_or_else(|e| e.into_inner()) = token;
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    let req = self.client.request(method, self.url(path));
    match self.token() {
      Some(token) => req.bearer_auth(token),
      None => req,
    }
  }

  async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
    Ok(check(req.send().await?).await?.json().await?)
  }

  /// Like [`fetch`](Self::fetch), but a 404 becomes `None`.
  async fn fetch_optional<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<Option<T>> {
    let resp = req.send().await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    Ok(Some(check(resp).await?.json().await?))
  }

  /// `true` on success, `false` on 404.
  async fn delete(&self, path: &str) -> Result<bool> {
    let resp = self.request(Method::DELETE, path).send().await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(false);
    }
    check(resp).await?;
    Ok(true)
  }

  // ── Views ─────────────────────────────────────────────────────────────────

  /// `GET /api/relationships`, with names and descriptions.
  pub async fn described_relationships(&self) -> Result<Vec<DescribedRelationship>> {
    self.fetch(self.request(Method::GET, "/relationships")).await
  }

  /// `GET /api/individuals/{id}/family`
  pub async fn family(&self, id: IndividualId) -> Result<Option<FamilyView>> {
    self.fetch_optional(self.request(Method::GET, &format!("/individuals/{id}/family"))).await
  }

  /// `GET /api/stats`
  pub async fn stats(&self) -> Result<Stats> { self.fetch(self.request(Method::GET, "/stats")).await }

  /// `GET /api/tree[?family=<surname>]`
  pub async fn tree(&self, family: Option<&str>) -> Result<TreeGraph> {
    let mut req = self.request(Method::GET, "/tree");
    if let Some(family) = family {
      req = req.query(&[("family", family)]);
    }
    self.fetch(req).await
  }

  /// `GET /api/branches`
  pub async fn branches(&self) -> Result<Vec<String>> {
    self.fetch(self.request(Method::GET, "/branches")).await
  }

  /// `GET /api/branches/{surname}`
  pub async fn branch(&self, surname: &str) -> Result<Vec<Individual>> {
    let mut url =
      reqwest::Url::parse(&self.url("/branches/")).map_err(|e| Error::InvalidUrl(e.to_string()))?;
    if let Ok(mut segments) = url.path_segments_mut() {
      segments.pop_if_empty().push(surname);
    }
    let mut req = self.client.get(url);
    if let Some(token) = self.token() {
      req = req.bearer_auth(token);
    }
    self.fetch(req).await
  }

  // ── Administration ────────────────────────────────────────────────────────

  /// `GET /api/admin/logs`
  pub async fn audit_log(&self, action: Option<&str>, page: usize) -> Result<LogPage> {
    let mut req = self.request(Method::GET, "/admin/logs").query(&[("page", page.to_string())]);
    if let Some(action) = action {
      req = req.query(&[("action", action)]);
    }
    self.fetch(req).await
  }
}

async fn check(resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body: ErrorBody = resp.json().await.unwrap_or_default();
  let message = if body.error.is_empty() {
    status.canonical_reason().unwrap_or("request failed").to_owned()
  } else {
    body.error
  };
  Err(Error::Api { status, message, code: body.code })
}

fn order_param(order: IndividualOrder) -> &'static str {
  match order {
    IndividualOrder::Name => "name",
    IndividualOrder::CreatedAsc => "created_asc",
    IndividualOrder::CreatedDesc => "created_desc",
  }
}

impl Backend for ApiClient {
  type Error = Error;
}

// ─── DirectoryStore ──────────────────────────────────────────────────────────

impl DirectoryStore for ApiClient {
  async fn create_individual(&self, input: NewIndividual) -> Result<Individual> {
    self.fetch(self.request(Method::POST, "/individuals").json(&input)).await
  }

  async fn get_individual(&self, id: IndividualId) -> Result<Option<Individual>> {
    self.fetch_optional(self.request(Method::GET, &format!("/individuals/{id}"))).await
  }

  /// The API has no id filter; `ids` is applied to the full listing.
  async fn list_individuals(&self, query: &IndividualQuery) -> Result<Vec<Individual>> {
    let mut req = self
      .request(Method::GET, "/individuals")
      .query(&[("order", order_param(query.order))]);
    if let Some(q) = &query.name_contains {
      req = req.query(&[("q", q.as_str())]);
    }
    let mut people: Vec<Individual> = self.fetch(req).await?;
    if let Some(ids) = &query.ids {
      people.retain(|p| ids.contains(&p.id));
    }
    Ok(people)
  }

  async fn update_individual(
    &self,
    id: IndividualId,
    patch: IndividualPatch,
  ) -> Result<Option<Individual>> {
    let req = self.request(Method::PATCH, &format!("/individuals/{id}")).json(&patch);
    self.fetch_optional(req).await
  }

  async fn delete_individual(&self, id: IndividualId) -> Result<bool> {
    self.delete(&format!("/individuals/{id}")).await
  }

  async fn create_relationship(&self, input: NewRelationship) -> Result<Relationship> {
    self.fetch(self.request(Method::POST, "/relationships").json(&input)).await
  }

  async fn get_relationship(&self, id: RelationshipId) -> Result<Option<Relationship>> {
    let all = self.list_relationships(&RelationshipQuery::default()).await?;
    Ok(all.into_iter().find(|r| r.id == id))
  }

  async fn list_relationships(&self, query: &RelationshipQuery) -> Result<Vec<Relationship>> {
    // The listing is newest first.
    let mut rels: Vec<Relationship> = self
      .described_relationships()
      .await?
      .into_iter()
      .map(|d| d.relationship)
      .filter(|r| query.involving.is_none_or(|id| r.involves(id)))
      .collect();
    if !query.newest_first {
      rels.reverse();
    }
    Ok(rels)
  }

  async fn delete_relationship(&self, id: RelationshipId) -> Result<bool> {
    self.delete(&format!("/relationships/{id}")).await
  }

  async fn create_event(&self, input: NewEvent) -> Result<FamilyEvent> {
    self.fetch(self.request(Method::POST, "/events").json(&input)).await
  }

  async fn get_event(&self, id: EventId) -> Result<Option<FamilyEvent>> {
    self.fetch_optional(self.request(Method::GET, &format!("/events/{id}"))).await
  }

  async fn list_events(&self) -> Result<Vec<FamilyEvent>> {
    self.fetch(self.request(Method::GET, "/events")).await
  }

  async fn update_event(&self, id: EventId, patch: EventPatch) -> Result<Option<FamilyEvent>> {
    self.fetch_optional(self.request(Method::PATCH, &format!("/events/{id}")).json(&patch)).await
  }

  async fn delete_event(&self, id: EventId) -> Result<bool> {
    self.delete(&format!("/events/{id}")).await
  }
}

// ─── IdentityStore ───────────────────────────────────────────────────────────

impl IdentityStore for ApiClient {
  /// Verification tokens are never sent to clients, so a successful
  /// sign-up always reports an empty token.
  async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp> {
    let creds = Credentials { email: email.to_owned(), password: password.to_owned() };
    let resp = self.request(Method::POST, "/auth/signup").json(&creds).send().await?;
    if resp.status() == StatusCode::CONFLICT {
      return Ok(SignUp::EmailTaken);
    }
    let body: SignUpBody = check(resp).await?.json().await?;
    Ok(SignUp::PendingVerification { account_id: body.account_id, verification_token: String::new() })
  }

  async fn confirm_email(&self, token: &str) -> Result<bool> {
    let body = serde_json::json!({ "token": token });
    let resp = self.request(Method::POST, "/auth/confirm").json(&body).send().await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(false);
    }
    check(resp).await?;
    Ok(true)
  }

  async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn> {
    let creds = Credentials { email: email.to_owned(), password: password.to_owned() };
    let resp = self.request(Method::POST, "/auth/signin").json(&creds).send().await?;
    match resp.status() {
      StatusCode::UNAUTHORIZED => Ok(SignIn::InvalidCredentials),
      StatusCode::FORBIDDEN => Ok(SignIn::EmailNotConfirmed),
      _ => {
        let info: SessionInfo = check(resp).await?.json().await?;
        self.set_token(Some(info.session.token.clone()));
        Ok(SignIn::Session(info.session))
      }
    }
  }

  async fn sign_out(&self, token: &str) -> Result<()> {
    let resp = self.client.post(self.url("/auth/signout")).bearer_auth(token).send().await?;
    if self.token().as_deref() == Some(token) {
      self.set_token(None);
    }
    if resp.status() == StatusCode::UNAUTHORIZED {
      return Ok(());
    }
    check(resp).await?;
    Ok(())
  }

  /// Adopts `token` for subsequent requests when it is still valid.
  async fn get_session(&self, token: &str) -> Result<Option<Session>> {
    let resp = self.client.get(self.url("/auth/session")).bearer_auth(token).send().await?;
    if resp.status() == StatusCode::UNAUTHORIZED {
      return Ok(None);
    }
    let info: SessionInfo = check(resp).await?.json().await?;
    self.set_token(Some(info.session.token.clone()));
    Ok(Some(info.session))
  }

  async fn get_profile(&self, account_id: Uuid) -> Result<Option<UserProfile>> {
    self.fetch_optional(self.request(Method::GET, &format!("/profiles/{account_id}"))).await
  }

  async fn list_accounts(&self) -> Result<Vec<AccountSummary>> {
    self.fetch(self.request(Method::GET, "/admin/users")).await
  }

  async fn update_role(&self, account_id: Uuid, role: Role) -> Result<Option<UserProfile>> {
    let body = serde_json::json!({ "role": role });
    let req = self.request(Method::PUT, &format!("/admin/users/{account_id}/role")).json(&body);
    self.fetch_optional(req).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn urls_are_rooted_under_api() {
    let client = ApiClient::new("http://localhost:8080/").unwrap();
    assert_eq!(client.url("/individuals"), "http://localhost:8080/api/individuals");
  }

  #[test]
  fn rejects_malformed_base_url() {
    assert!(matches!(ApiClient::new("not a url"), Err(Error::InvalidUrl(_))));
  }

  #[test]
  fn token_is_held_for_requests() {
    let client = ApiClient::new("http://localhost:8080").unwrap();
    assert_eq!(client.token(), None);
    client.set_token(Some("abc".into()));
    assert_eq!(client.token().as_deref(), Some("abc"));
  }

  #[test]
  fn order_params_match_server_names() {
    assert_eq!(order_param(IndividualOrder::Name), "name");
    assert_eq!(order_param(IndividualOrder::CreatedAsc), "created_asc");
    assert_eq!(order_param(IndividualOrder::CreatedDesc), "created_desc");
  }
}
