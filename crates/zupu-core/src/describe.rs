//! Human-readable labels for relationships.
//!
//! Labels are phrased from person A's side and depend on the recorded sex of
//! both endpoints. Every function here is total: an unknown sex or an
//! unrecognised kind falls back to the generic wording.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
  individual::{Individual, IndividualId, Sex},
  relationship::{Relationship, RelationshipKind},
};

/// Output language for labels.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Locale {
  #[default]
  #[strum(serialize = "en")]
  En,
  #[strum(serialize = "zh")]
  Zh,
}

/// One endpoint of a relationship, as far as labelling is concerned.
#[derive(Debug, Clone, Copy)]
pub struct Party<'a> {
  pub name: &'a str,
  pub sex:  Sex,
}

impl<'a> Party<'a> {
  pub fn new(name: &'a str, sex: Sex) -> Self { Self { name, sex } }
}

/// Short role of person A towards person B.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeRole {
  Father,
  Mother,
  Parent,
  Husband,
  Wife,
  Spouse,
  Other(String),
}

impl EdgeRole {
  /// Derive A's role; the priority is kind first, then sex of A, then sex of B.
  pub fn derive(kind: &RelationshipKind, a: Sex, b: Sex) -> Self {
    match kind {
      RelationshipKind::Parent => match a {
        Sex::Male => Self::Father,
        Sex::Female => Self::Mother,
        Sex::Unknown => Self::Parent,
      },
      RelationshipKind::Spouse => match (a, b) {
        (Sex::Male, Sex::Female) => Self::Husband,
        (Sex::Female, Sex::Male) => Self::Wife,
        _ => Self::Spouse,
      },
      RelationshipKind::Other(tag) => Self::Other(tag.clone()),
    }
  }

  pub fn label(&self, locale: Locale) -> &str {
    match (self, locale) {
      (Self::Father, Locale::En) => "father",
      (Self::Mother, Locale::En) => "mother",
      (Self::Parent, Locale::En) => "parent",
      (Self::Husband, Locale::En) => "husband",
      (Self::Wife, Locale::En) => "wife",
      (Self::Spouse, Locale::En) => "spouse",
      (Self::Father, Locale::Zh) => "父亲",
      (Self::Mother, Locale::Zh) => "母亲",
      (Self::Parent, Locale::Zh) => "父母",
      (Self::Husband, Locale::Zh) => "丈夫",
      (Self::Wife, Locale::Zh) => "妻子",
      (Self::Spouse, Locale::Zh) => "配偶",
      (Self::Other(tag), _) => tag,
    }
  }
}

/// Short edge label such as `father` or `wife`, used on tree edges.
pub fn edge_label(kind: &RelationshipKind, a: Sex, b: Sex, locale: Locale) -> String {
  EdgeRole::derive(kind, a, b).label(locale).to_owned()
}

/// Full sentence describing a relationship, e.g. `张三 is 李四's father`.
pub fn describe_relationship(
  kind: &RelationshipKind,
  a: Party<'_>,
  b: Party<'_>,
  locale: Locale,
) -> String {
  let role = EdgeRole::derive(kind, a.sex, b.sex);
  match (&role, locale) {
    (EdgeRole::Spouse, Locale::En) => format!("{} and {} are spouses", a.name, b.name),
    (EdgeRole::Spouse, Locale::Zh) => format!("{} 与 {} 是配偶关系", a.name, b.name),
    (EdgeRole::Other(tag), Locale::En) => {
      format!("{} and {}'s relationship: {tag}", a.name, b.name)
    }
    (EdgeRole::Other(tag), Locale::Zh) => format!("{} 与 {} 的关系: {tag}", a.name, b.name),
    (_, Locale::En) => format!("{} is {}'s {}", a.name, b.name, role.label(locale)),
    (_, Locale::Zh) => format!("{} 是 {} 的{}", a.name, b.name, role.label(locale)),
  }
}

/// A relationship with both endpoint names and its sentence, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribedRelationship {
  #[serde(flatten)]
  pub relationship:  Relationship,
  pub person_a_name: Option<String>,
  pub person_b_name: Option<String>,
  pub description:   String,
}

impl DescribedRelationship {
  /// Endpoints missing from `people` are described as `?` with unknown sex.
  pub fn new(
    relationship: Relationship,
    people: &HashMap<IndividualId, Individual>,
    locale: Locale,
  ) -> Self {
    let a = people.get(&relationship.person_a_id);
    let b = people.get(&relationship.person_b_id);
    let description = describe_relationship(&relationship.kind, party(a), party(b), locale);
    Self {
      person_a_name: a.map(|p| p.full_name.clone()),
      person_b_name: b.map(|p| p.full_name.clone()),
      relationship,
      description,
    }
  }
}

fn party(person: Option<&Individual>) -> Party<'_> {
  person.map_or(Party::new("?", Sex::Unknown), |p| Party::new(&p.full_name, p.sex))
}

// ─── Perspective ─────────────────────────────────────────────────────────────

/// What the other endpoint of a relationship is to a given individual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "tag", rename_all = "snake_case")]
pub enum Kinship {
  Parent,
  Child,
  Spouse,
  Other(String),
}

impl Kinship {
  /// Returns `None` when `viewer` is not an endpoint of `rel`.
  pub fn of(rel: &Relationship, viewer: IndividualId) -> Option<Self> {
    if !rel.involves(viewer) {
      return None;
    }
    Some(match &rel.kind {
      RelationshipKind::Parent if rel.person_a_id == viewer => Self::Child,
      RelationshipKind::Parent => Self::Parent,
      RelationshipKind::Spouse => Self::Spouse,
      RelationshipKind::Other(tag) => Self::Other(tag.clone()),
    })
  }

  pub fn label(&self, locale: Locale) -> &str {
    match (self, locale) {
      (Self::Parent, Locale::En) => "parent",
      (Self::Child, Locale::En) => "child",
      (Self::Spouse, Locale::En) => "spouse",
      (Self::Parent, Locale::Zh) => "父母",
      (Self::Child, Locale::Zh) => "子女",
      (Self::Spouse, Locale::Zh) => "配偶",
      (Self::Other(tag), _) => tag,
    }
  }
}
