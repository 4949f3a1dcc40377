//! Family tree graph and surname branches.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
  describe::{Locale, edge_label},
  individual::{Individual, IndividualId, Sex},
  relationship::{Relationship, RelationshipKind},
};

const COLUMNS: usize = 4;
const COLUMN_WIDTH: i64 = 250;
const ROW_HEIGHT: i64 = 150;

/// Which individuals a tree is built from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TreeFilter {
  #[default]
  All,
  /// Full name starts with this surname.
  Surname(String),
}

impl TreeFilter {
  /// `None`, blank and `"all"` select everyone.
  pub fn from_param(family: Option<&str>) -> Self {
    match family.map(str::trim) {
      None | Some("") => Self::All,
      Some(s) if s.eq_ignore_ascii_case("all") => Self::All,
      Some(s) => Self::Surname(s.to_owned()),
    }
  }

  pub fn matches(&self, individual: &Individual) -> bool {
    match self {
      Self::All => true,
      Self::Surname(s) => individual.full_name.starts_with(s.as_str()),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
  pub x: i64,
  pub y: i64,
}

impl Position {
  /// Grid slot of the `index`-th node.
  pub fn grid(index: usize) -> Self {
    Self {
      x: (index % COLUMNS) as i64 * COLUMN_WIDTH,
      y: (index / COLUMNS) as i64 * ROW_HEIGHT,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
  pub id:         IndividualId,
  pub name:       String,
  pub sex:        Sex,
  pub birth_year: i32,
  pub death_year: Option<i32>,
  pub position:   Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEdge {
  pub id:     String,
  pub source: IndividualId,
  pub target: IndividualId,
  pub kind:   RelationshipKind,
  pub label:  String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeGraph {
  pub nodes: Vec<TreeNode>,
  pub edges: Vec<TreeEdge>,
}

impl TreeGraph {
  pub fn node_count(&self) -> usize { self.nodes.len() }

  pub fn edge_count(&self) -> usize { self.edges.len() }
}

/// Lay out the filtered individuals on a grid and connect them.
///
/// Nodes keep the order of `individuals`. A relationship becomes an edge
/// only when both endpoints are in the tree.
pub fn build_tree(
  individuals: &[Individual],
  relationships: &[Relationship],
  filter: &TreeFilter,
  locale: Locale,
) -> TreeGraph {
  let kept: Vec<&Individual> = individuals.iter().filter(|p| filter.matches(p)).collect();

  let nodes: Vec<TreeNode> = kept
    .iter()
    .enumerate()
    .map(|(index, p)| TreeNode {
      id:         p.id,
      name:       p.full_name.clone(),
      sex:        p.sex,
      birth_year: p.birth_year(),
      death_year: p.death_year(),
      position:   Position::grid(index),
    })
    .collect();

  let sex_of: HashMap<IndividualId, Sex> = kept.iter().map(|p| (p.id, p.sex)).collect();

  let edges = relationships
    .iter()
    .filter_map(|rel| {
      let a = *sex_of.get(&rel.person_a_id)?;
      let b = *sex_of.get(&rel.person_b_id)?;
      Some(TreeEdge {
        id:     format!("{}-{}", rel.person_a_id, rel.person_b_id),
        source: rel.person_a_id,
        target: rel.person_b_id,
        kind:   rel.kind.clone(),
        label:  edge_label(&rel.kind, a, b, locale),
      })
    })
    .collect();

  TreeGraph { nodes, edges }
}

// ─── Branches ────────────────────────────────────────────────────────────────

/// Distinct surnames in sorted order.
pub fn surnames(individuals: &[Individual]) -> Vec<String> {
  individuals
    .iter()
    .filter_map(Individual::surname)
    .collect::<BTreeSet<char>>()
    .into_iter()
    .map(String::from)
    .collect()
}

/// Members of one surname branch, sorted by name.
pub fn branch_members<'a>(individuals: &'a [Individual], surname: &str) -> Vec<&'a Individual> {
  let mut members: Vec<&Individual> = individuals
    .iter()
    .filter(|p| !surname.is_empty() && p.full_name.starts_with(surname))
    .collect();
  members.sort_by(|a, b| a.full_name.cmp(&b.full_name));
  members
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, Utc};

  use super::*;

  fn person(id: IndividualId, name: &str, sex: Sex, year: i32) -> Individual {
    Individual {
      id,
      full_name: name.into(),
      sex,
      birth_date: NaiveDate::from_ymd_opt(year, 6, 1).unwrap(),
      death_date: None,
      birth_place: "北京".into(),
      residence: None,
      biography: None,
      photo_url: None,
      created_at: Utc::now(),
    }
  }

  fn rel(a: IndividualId, b: IndividualId, kind: RelationshipKind) -> Relationship {
    Relationship { id: a * 100 + b, person_a_id: a, person_b_id: b, kind, created_at: Utc::now() }
  }

  fn family() -> (Vec<Individual>, Vec<Relationship>) {
    let people = vec![
      person(1, "张大山", Sex::Male, 1930),
      person(2, "王秀英", Sex::Female, 1932),
      person(3, "张三", Sex::Male, 1955),
      person(4, "李四", Sex::Female, 1957),
      person(5, "张小明", Sex::Male, 1982),
    ];
    let rels = vec![
      rel(1, 2, RelationshipKind::Spouse),
      rel(1, 3, RelationshipKind::Parent),
      rel(2, 3, RelationshipKind::Parent),
      rel(3, 4, RelationshipKind::Spouse),
      rel(3, 5, RelationshipKind::Parent),
    ];
    (people, rels)
  }

  #[test]
  fn full_tree_uses_grid_layout() {
    let (people, rels) = family();
    let graph = build_tree(&people, &rels, &TreeFilter::All, Locale::En);
    assert_eq!(graph.node_count(), 5);
    assert_eq!(graph.edge_count(), 5);
    assert_eq!(graph.nodes[3].position, Position { x: 750, y: 0 });
    assert_eq!(graph.nodes[4].position, Position { x: 0, y: 150 });

    let edge = graph.edges.iter().find(|e| e.id == "2-3").unwrap();
    assert_eq!(edge.label, "mother");
    let edge = graph.edges.iter().find(|e| e.id == "1-2").unwrap();
    assert_eq!(edge.label, "husband");
  }

  #[test]
  fn surname_filter_drops_dangling_edges() {
    let (people, rels) = family();
    let filter = TreeFilter::from_param(Some("张"));
    let graph = build_tree(&people, &rels, &filter, Locale::Zh);
    let ids: Vec<_> = graph.nodes.iter().map(|n| n.id).collect();
    assert_eq!(ids, vec![1, 3, 5]);
    let edges: Vec<_> = graph.edges.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(edges, vec!["1-3", "3-5"]);
    assert_eq!(graph.edges[0].label, "父亲");
  }

  #[test]
  fn filter_param_all() {
    assert_eq!(TreeFilter::from_param(None), TreeFilter::All);
    assert_eq!(TreeFilter::from_param(Some("  ")), TreeFilter::All);
    assert_eq!(TreeFilter::from_param(Some("ALL")), TreeFilter::All);
    assert_eq!(TreeFilter::from_param(Some("李")), TreeFilter::Surname("李".into()));
  }

  #[test]
  fn surnames_are_unique_and_sorted() {
    let (people, _) = family();
    let mut expected = vec!["张".to_owned(), "王".to_owned(), "李".to_owned()];
    expected.sort();
    assert_eq!(surnames(&people), expected);
  }

  #[test]
  fn branch_members_in_name_order() {
    let (people, _) = family();
    let names: Vec<_> =
      branch_members(&people, "张").iter().map(|p| p.full_name.as_str()).collect();
    let mut expected = vec!["张大山", "张三", "张小明"];
    expected.sort();
    assert_eq!(names, expected);
    assert!(branch_members(&people, "赵").is_empty());
    assert!(branch_members(&people, "").is_empty());
  }
}
