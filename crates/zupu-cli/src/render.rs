//! Plain-text rendering of API results for the terminal.

use zupu_core::{
  account::AccountSummary,
  audit::LogPage,
  describe::DescribedRelationship,
  event::FamilyEvent,
  family::{FamilyView, Relative},
  individual::Individual,
  stats::Stats,
  tree::TreeGraph,
};

fn lifespan(birth: i32, death: Option<i32>) -> String {
  match death {
    Some(death) => format!("{birth}-{death}"),
    None => format!("{birth}-"),
  }
}

pub fn individuals(people: &[Individual]) -> String {
  if people.is_empty() {
    return "no members".to_owned();
  }
  people
    .iter()
    .map(|p| {
      format!(
        "{:>5}  {:<12} {:<7} {:<10} {}",
        p.id,
        p.full_name,
        p.sex.as_str(),
        lifespan(p.birth_year(), p.death_year()),
        p.birth_place
      )
    })
    .collect::<Vec<_>>()
    .join("\n")
}

pub fn individual(p: &Individual) -> String {
  let mut lines = vec![
    format!("#{} {}", p.id, p.full_name),
    format!("  sex:         {}", p.sex.as_str()),
    format!("  born:        {} in {}", p.birth_date, p.birth_place),
  ];
  if let Some(died) = p.death_date {
    lines.push(format!("  died:        {died}"));
  }
  if let Some(residence) = &p.residence {
    lines.push(format!("  residence:   {residence}"));
  }
  if let Some(photo) = &p.photo_url {
    lines.push(format!("  photo:       {photo}"));
  }
  if let Some(bio) = &p.biography {
    lines.push(String::new());
    lines.push(bio.clone());
  }
  lines.join("\n")
}

fn relatives(title: &str, list: &[Relative]) -> Vec<String> {
  if list.is_empty() {
    return Vec::new();
  }
  let mut lines = vec![format!("{title}:")];
  for r in list {
    let name = r.person.as_ref().map_or("?", |p| p.full_name.as_str());
    lines.push(format!("  {name} (relationship #{})", r.relationship.id));
  }
  lines
}

pub fn family(view: &FamilyView) -> String {
  let mut lines = vec![individual(&view.individual)];
  let sections = [
    relatives("parents", &view.parents),
    relatives("spouses", &view.spouses),
    relatives("children", &view.children),
  ];
  for section in sections.into_iter().filter(|s| !s.is_empty()) {
    lines.push(String::new());
    lines.extend(section);
  }
  lines.join("\n")
}

pub fn relationships(rows: &[DescribedRelationship]) -> String {
  if rows.is_empty() {
    return "no relationships".to_owned();
  }
  rows
    .iter()
    .map(|r| format!("{:>5}  {:<7} {}", r.relationship.id, r.relationship.kind, r.description))
    .collect::<Vec<_>>()
    .join("\n")
}

pub fn events(events: &[FamilyEvent]) -> String {
  if events.is_empty() {
    return "no events".to_owned();
  }
  events
    .iter()
    .map(|e| format!("{:>5}  {}  {}\n       {}", e.id, e.date, e.title, e.description))
    .collect::<Vec<_>>()
    .join("\n")
}

pub fn stats(s: &Stats) -> String {
  let mut lines = vec![
    format!("members:          {}", s.total),
    format!("living:           {}", s.living),
    format!("male / female:    {} / {}", s.male, s.female),
    format!("added this month: {}", s.added_this_month),
  ];
  if s.unknown_sex > 0 {
    lines.push(format!("sex unknown:      {}", s.unknown_sex));
  }
  if let Some(first) = s.first_added {
    lines.push(format!("first added:      {}", first.format("%Y-%m-%d")));
  }
  if !s.births_by_decade.is_empty() {
    lines.push(String::new());
    lines.push("births by decade:".to_owned());
    for d in &s.births_by_decade {
      lines.push(format!("  {}s  {}", d.decade, "#".repeat(d.count)));
    }
  }
  if !s.growth.is_empty() {
    lines.push(String::new());
    lines.push("members added per month:".to_owned());
    for m in &s.growth {
      lines.push(format!("  {}  {}", m.month, m.count));
    }
  }
  lines.join("\n")
}

pub fn tree(graph: &TreeGraph) -> String {
  let mut lines = vec![format!("{} members, {} links", graph.node_count(), graph.edge_count())];
  let name = |id| {
    graph.nodes.iter().find(|n| n.id == id).map_or("?", |n| n.name.as_str())
  };
  for edge in &graph.edges {
    lines.push(format!("  {} -[{}]-> {}", name(edge.source), edge.label, name(edge.target)));
  }
  lines.join("\n")
}

pub fn accounts(accounts: &[AccountSummary]) -> String {
  accounts
    .iter()
    .map(|a| format!("{}  {:<5}  {}", a.profile.account_id, a.profile.role, a.email))
    .collect::<Vec<_>>()
    .join("\n")
}

pub fn log_page(page: &LogPage) -> String {
  let mut lines: Vec<String> = page
    .entries
    .iter()
    .map(|e| {
      let actor = e.actor_id.map_or_else(|| "-".to_owned(), |id| id.to_string());
      format!("{}  {:<22} {}  {}", e.created_at.format("%Y-%m-%d %H:%M:%S"), e.action, actor, e.details)
    })
    .collect();
  if page.has_more {
    lines.push(format!("(more: --page {})", page.page + 1));
  }
  lines.join("\n")
}

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, Utc};
  use zupu_core::{
    individual::Sex,
    relationship::{Relationship, RelationshipKind},
    tree::{TreeEdge, TreeNode, Position},
  };

  use super::*;

  fn person(id: i64, name: &str, death: Option<NaiveDate>) -> Individual {
    Individual {
      id,
      full_name: name.into(),
      sex: Sex::Male,
      birth_date: NaiveDate::from_ymd_opt(1950, 1, 1).unwrap(),
      death_date: death,
      birth_place: "绍兴".into(),
      residence: None,
      biography: None,
      photo_url: None,
      created_at: Utc::now(),
    }
  }

  #[test]
  fn member_rows_show_lifespan() {
    let died = NaiveDate::from_ymd_opt(2020, 5, 5);
    let out = individuals(&[person(1, "张三", died), person(2, "张小明", None)]);
    let lines: Vec<&str> = out.lines().collect();
    assert!(lines[0].contains("1950-2020"));
    assert!(lines[1].contains("1950-"));
    assert!(lines[1].contains("MALE"));
  }

  #[test]
  fn empty_lists_say_so() {
    assert_eq!(individuals(&[]), "no members");
    assert_eq!(events(&[]), "no events");
    assert_eq!(relationships(&[]), "no relationships");
  }

  #[test]
  fn family_lists_relatives_by_section() {
    let rel = Relationship {
      id:          7,
      person_a_id: 1,
      person_b_id: 2,
      kind:        RelationshipKind::Parent,
      created_at:  Utc::now(),
    };
    let view = FamilyView {
      individual: person(1, "张三", None),
      parents:    vec![],
      children:   vec![Relative { relationship: rel, person: Some(person(2, "张小明", None)) }],
      spouses:    vec![],
    };
    let out = family(&view);
    assert!(out.contains("children:\n  张小明 (relationship #7)"));
    assert!(!out.contains("parents:"));
  }

  #[test]
  fn tree_edges_use_names() {
    let node = |id, name: &str| TreeNode {
      id,
      name: name.into(),
      sex: Sex::Male,
      birth_year: 1950,
      death_year: None,
      position: Position::grid(0),
    };
    let graph = TreeGraph {
      nodes: vec![node(1, "张三"), node(2, "张小明")],
      edges: vec![TreeEdge {
        id:     "1-2".into(),
        source: 1,
        target: 2,
        kind:   RelationshipKind::Parent,
        label:  "father".into(),
      }],
    };
    assert_eq!(tree(&graph), "2 members, 1 links\n  张三 -[father]-> 张小明");
  }
}
