//! Immediate family of one individual.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
  describe::Kinship,
  individual::{Individual, IndividualId},
  relationship::Relationship,
};

/// A relationship together with the individual on the other side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relative {
  pub relationship: Relationship,
  /// `None` when the other endpoint could not be loaded.
  pub person:       Option<Individual>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyView {
  pub individual: Individual,
  pub parents:    Vec<Relative>,
  pub children:   Vec<Relative>,
  pub spouses:    Vec<Relative>,
}

impl FamilyView {
  pub fn relative_count(&self) -> usize {
    self.parents.len() + self.children.len() + self.spouses.len()
  }
}

/// Group the relationships involving `individual` by kinship.
///
/// Relationships that do not involve `individual`, and those of an
/// unrecognised kind, are skipped.
pub fn family_view(
  individual: Individual,
  relationships: &[Relationship],
  people: &HashMap<IndividualId, Individual>,
) -> FamilyView {
  let mut view = FamilyView {
    individual,
    parents: Vec::new(),
    children: Vec::new(),
    spouses: Vec::new(),
  };
  let me = view.individual.id;

  for rel in relationships {
    let (Some(kinship), Some(other)) = (Kinship::of(rel, me), rel.other_side(me)) else {
      continue;
    };
    let relative = Relative { relationship: rel.clone(), person: people.get(&other).cloned() };
    match kinship {
      Kinship::Parent => view.parents.push(relative),
      Kinship::Child => view.children.push(relative),
      Kinship::Spouse => view.spouses.push(relative),
      Kinship::Other(_) => {}
    }
  }
  view
}
