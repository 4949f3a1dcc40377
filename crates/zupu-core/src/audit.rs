//! Audit trail records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Action tags written to the audit trail.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
  CreateIndividual,
  UpdateIndividual,
  DeleteIndividual,
  ViewIndividual,
  CreateRelationship,
  DeleteRelationship,
  CreateEvent,
  UpdateEvent,
  DeleteEvent,
  RoleChange,
  UserLogin,
  UserLogout,
  GenerateFamilyTree,
  ViewFamilyBranch,
  RefreshData,
  ViewPage,
}

impl AuditAction {
  pub fn as_str(self) -> &'static str { self.into() }
}

/// A stored audit entry. `action` stays a plain string so entries written by
/// other clients remain readable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
  pub id:         i64,
  pub actor_id:   Option<Uuid>,
  pub action:     String,
  pub details:    Value,
  pub created_at: DateTime<Utc>,
}

/// Input to [`AuditSink::append`](crate::store::AuditSink::append).
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
  pub actor_id: Option<Uuid>,
  pub action:   String,
  pub details:  Value,
}

impl NewAuditEntry {
  pub fn new(actor_id: Option<Uuid>, action: AuditAction) -> Self {
    Self { actor_id, action: action.as_str().to_owned(), details: Value::Object(Map::new()) }
  }

  /// Add a key to the detail object.
  pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
    if let Value::Object(map) = &mut self.details {
      map.insert(key.to_owned(), value.into());
    }
    self
  }
}

/// Parameters for [`AuditSink::list_entries`](crate::store::AuditSink::list_entries).
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
  pub action: Option<String>,
  /// `0` means no limit.
  pub limit:  usize,
  pub offset: usize,
}

/// One page of audit entries, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogPage {
  pub entries:  Vec<AuditEntry>,
  /// 1-based.
  pub page:     usize,
  pub has_more: bool,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn action_tags_are_screaming_snake() {
    assert_eq!(AuditAction::CreateRelationship.as_str(), "CREATE_RELATIONSHIP");
    assert_eq!(AuditAction::ViewFamilyBranch.to_string(), "VIEW_FAMILY_BRANCH");
    assert_eq!("ROLE_CHANGE".parse::<AuditAction>().unwrap(), AuditAction::RoleChange);
  }

  #[test]
  fn details_builder() {
    let entry = NewAuditEntry::new(None, AuditAction::DeleteIndividual)
      .with("individual_id", 4)
      .with("full_name", "张三");
    assert_eq!(entry.action, "DELETE_INDIVIDUAL");
    assert_eq!(entry.details["individual_id"], 4);
    assert_eq!(entry.details["full_name"], "张三");
  }
}
