//! Relationships between two individuals.
//!
//! The pair is ordered. For [`RelationshipKind::Parent`], person A is the
//! parent and person B the child. For [`RelationshipKind::Spouse`] the order
//! carries no meaning but is preserved, since labels are phrased from A's
//! side.

use std::{convert::Infallible, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::individual::IndividualId;

/// Store-assigned identifier of a [`Relationship`].
pub type RelationshipId = i64;

// ─── Kind ────────────────────────────────────────────────────────────────────

/// The kind of a relationship.
///
/// Only `Parent` and `Spouse` can be created. `Other` keeps any unrecognised
/// tag read back from storage so it can still be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RelationshipKind {
  Parent,
  Spouse,
  Other(String),
}

impl RelationshipKind {
  pub fn as_str(&self) -> &str {
    match self {
      Self::Parent => "parent",
      Self::Spouse => "spouse",
      Self::Other(tag) => tag,
    }
  }

  /// Whether new relationships of this kind may be recorded.
  pub fn is_creatable(&self) -> bool { !matches!(self, Self::Other(_)) }
}

impl fmt::Display for RelationshipKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for RelationshipKind {
  type Err = Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let trimmed = s.trim();
    Ok(if trimmed.eq_ignore_ascii_case("parent") {
      Self::Parent
    } else if trimmed.eq_ignore_ascii_case("spouse") {
      Self::Spouse
    } else {
      Self::Other(trimmed.to_owned())
    })
  }
}

impl Serialize for RelationshipKind {
  fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
    ser.serialize_str(self.as_str())
  }
}

impl<'de> Deserialize<'de> for RelationshipKind {
  fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(de)?;
    Ok(raw.parse::<Self>().unwrap_or_else(|never| match never {}))
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A persisted relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
  pub id:          RelationshipId,
  pub person_a_id: IndividualId,
  pub person_b_id: IndividualId,
  pub kind:        RelationshipKind,
  pub created_at:  DateTime<Utc>,
}

impl Relationship {
  pub fn involves(&self, id: IndividualId) -> bool {
    self.person_a_id == id || self.person_b_id == id
  }

  /// The endpoint opposite `id`, if `id` is one of the two endpoints.
  pub fn other_side(&self, id: IndividualId) -> Option<IndividualId> {
    if self.person_a_id == id {
      Some(self.person_b_id)
    } else if self.person_b_id == id {
      Some(self.person_a_id)
    } else {
      None
    }
  }

  /// Same unordered pair and same kind.
  pub fn connects(
    &self,
    a: IndividualId,
    b: IndividualId,
    kind: &RelationshipKind,
  ) -> bool {
    &self.kind == kind
      && ((self.person_a_id == a && self.person_b_id == b)
        || (self.person_a_id == b && self.person_b_id == a))
  }
}

/// Input to [`DirectoryStore::create_relationship`](crate::store::DirectoryStore::create_relationship).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRelationship {
  pub person_a_id: IndividualId,
  pub person_b_id: IndividualId,
  pub kind:        RelationshipKind,
}

impl NewRelationship {
  /// `parent` is recorded as person A, `child` as person B.
  pub fn parent(parent: IndividualId, child: IndividualId) -> Self {
    Self { person_a_id: parent, person_b_id: child, kind: RelationshipKind::Parent }
  }

  pub fn spouse(a: IndividualId, b: IndividualId) -> Self {
    Self { person_a_id: a, person_b_id: b, kind: RelationshipKind::Spouse }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn kind_roundtrips_known_and_unknown_tags() {
    let k: RelationshipKind = serde_json::from_str("\"PARENT\"").unwrap();
    assert_eq!(k, RelationshipKind::Parent);
    let k: RelationshipKind = serde_json::from_str("\"sibling\"").unwrap();
    assert_eq!(k, RelationshipKind::Other("sibling".into()));
    assert!(!k.is_creatable());
    assert_eq!(serde_json::to_string(&RelationshipKind::Spouse).unwrap(), "\"spouse\"");
  }

  #[test]
  fn connects_ignores_order_but_not_kind() {
    let rel = Relationship {
      id:          1,
      person_a_id: 10,
      person_b_id: 20,
      kind:        RelationshipKind::Spouse,
      created_at:  Utc::now(),
    };
    assert!(rel.connects(20, 10, &RelationshipKind::Spouse));
    assert!(!rel.connects(10, 20, &RelationshipKind::Parent));
    assert_eq!(rel.other_side(20), Some(10));
    assert_eq!(rel.other_side(30), None);
  }
}
