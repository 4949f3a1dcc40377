//! Admission checks for new relationships.
//!
//! Everything here is pure and total: every combination of inputs maps to a
//! [`Validation`], never to a panic or an error. The caller creates the
//! relationship in the directory store only after [`Validation::Accepted`].

use std::collections::HashMap;

use serde::Serialize;

use crate::{
  individual::{Individual, IndividualId},
  relationship::{Relationship, RelationshipKind},
};

/// Why a proposed relationship was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, thiserror::Error)]
#[serde(rename_all = "kebab-case")]
pub enum Rejection {
  #[error("a person cannot be related to themselves")]
  SelfRelationship,

  #[error("the parent must be born before the child")]
  ParentNotBornBeforeChild,

  #[error("this relationship already exists")]
  DuplicateRelationship,
}

impl Rejection {
  /// Stable machine-readable reason code.
  pub fn code(self) -> &'static str {
    match self {
      Self::SelfRelationship => "self-relationship",
      Self::ParentNotBornBeforeChild => "parent-not-born-before-child",
      Self::DuplicateRelationship => "duplicate-relationship",
    }
  }
}

/// Outcome of [`validate_new_relationship`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
  Accepted,
  Rejected(Rejection),
}

impl Validation {
  pub fn is_accepted(self) -> bool { matches!(self, Self::Accepted) }

  pub fn into_result(self) -> Result<(), Rejection> {
    match self {
      Self::Accepted => Ok(()),
      Self::Rejected(r) => Err(r),
    }
  }
}

/// Decide whether `person_a -kind-> person_b` may be added to `existing`.
///
/// Checks run in order: self-relationship, parent birth ordering, duplicate.
/// The birth-date check is skipped when either person is missing from
/// `people`.
pub fn validate_new_relationship(
  person_a: IndividualId,
  person_b: IndividualId,
  kind: &RelationshipKind,
  existing: &[Relationship],
  people: &HashMap<IndividualId, Individual>,
) -> Validation {
  if person_a == person_b {
    return Validation::Rejected(Rejection::SelfRelationship);
  }

  if *kind == RelationshipKind::Parent
    && let (Some(parent), Some(child)) = (people.get(&person_a), people.get(&person_b))
    && parent.birth_date >= child.birth_date
  {
    return Validation::Rejected(Rejection::ParentNotBornBeforeChild);
  }

  if existing.iter().any(|rel| rel.connects(person_a, person_b, kind)) {
    return Validation::Rejected(Rejection::DuplicateRelationship);
  }

  Validation::Accepted
}
