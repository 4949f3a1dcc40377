//! Register-wide statistics.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::individual::{Individual, Sex};

/// Months shown in [`Stats::growth`].
const GROWTH_MONTHS: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecadeCount {
  /// First year of the decade, e.g. `1950`.
  pub decade: i32,
  pub count:  usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthCount {
  /// `YYYY-MM`.
  pub month: String,
  pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Stats {
  pub total:            usize,
  pub living:           usize,
  pub male:             usize,
  pub female:           usize,
  pub unknown_sex:      usize,
  /// Members whose record was created in the same calendar month as `now`.
  pub added_this_month: usize,
  pub first_added:      Option<DateTime<Utc>>,
  pub births_by_decade: Vec<DecadeCount>,
  pub growth:           Vec<MonthCount>,
}

pub fn compute_stats(individuals: &[Individual], now: DateTime<Utc>) -> Stats {
  let mut stats = Stats { total: individuals.len(), ..Default::default() };
  let mut decades: BTreeMap<i32, usize> = BTreeMap::new();
  let mut months: BTreeMap<String, usize> = BTreeMap::new();
  let this_month = month_key(now);

  for person in individuals {
    if person.is_living() {
      stats.living += 1;
    }
    match person.sex {
      Sex::Male => stats.male += 1,
      Sex::Female => stats.female += 1,
      Sex::Unknown => stats.unknown_sex += 1,
    }
    *decades.entry(person.birth_year().div_euclid(10) * 10).or_default() += 1;

    let key = month_key(person.created_at);
    if key == this_month {
      stats.added_this_month += 1;
    }
    *months.entry(key).or_default() += 1;

    if stats.first_added.is_none_or(|first| person.created_at < first) {
      stats.first_added = Some(person.created_at);
    }
  }

  stats.births_by_decade = decades
    .into_iter()
    .map(|(decade, count)| DecadeCount { decade, count })
    .collect();

  let skip = months.len().saturating_sub(GROWTH_MONTHS);
  stats.growth = months
    .into_iter()
    .skip(skip)
    .map(|(month, count)| MonthCount { month, count })
    .collect();

  stats
}

fn month_key(at: DateTime<Utc>) -> String { format!("{:04}-{:02}", at.year(), at.month()) }

#[cfg(test)]
mod tests {
  use chrono::{NaiveDate, TimeZone};

  use super::*;

  fn person(sex: Sex, born: i32, died: Option<i32>, added: (i32, u32)) -> Individual {
    Individual {
      id: 0,
      full_name: "张三".into(),
      sex,
      birth_date: NaiveDate::from_ymd_opt(born, 1, 1).unwrap(),
      death_date: died.map(|y| NaiveDate::from_ymd_opt(y, 1, 1).unwrap()),
      birth_place: "北京".into(),
      residence: None,
      biography: None,
      photo_url: None,
      created_at: Utc.with_ymd_and_hms(added.0, added.1, 15, 8, 0, 0).unwrap(),
    }
  }

  #[test]
  fn empty_register() {
    let stats = compute_stats(&[], Utc::now());
    assert_eq!(stats.total, 0);
    assert!(stats.births_by_decade.is_empty());
    assert!(stats.growth.is_empty());
    assert_eq!(stats.first_added, None);
  }

  #[test]
  fn counts_and_decades() {
    let now = Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap();
    let people = vec![
      person(Sex::Male, 1958, Some(2020), (2024, 1)),
      person(Sex::Female, 1951, None, (2024, 3)),
      person(Sex::Unknown, 1983, None, (2024, 3)),
      person(Sex::Male, 1949, Some(2001), (2023, 12)),
    ];
    let stats = compute_stats(&people, now);
    assert_eq!(stats.total, 4);
    assert_eq!(stats.living, 2);
    assert_eq!((stats.male, stats.female, stats.unknown_sex), (2, 1, 1));
    assert_eq!(stats.added_this_month, 2);
    assert_eq!(stats.first_added, Some(people[3].created_at));

    let decades: Vec<_> = stats.births_by_decade.iter().map(|d| (d.decade, d.count)).collect();
    assert_eq!(decades, vec![(1940, 1), (1950, 2), (1980, 1)]);

    let months: Vec<_> = stats.growth.iter().map(|m| m.month.as_str()).collect();
    assert_eq!(months, vec!["2023-12", "2024-01", "2024-03"]);
  }

  #[test]
  fn growth_keeps_last_twelve_months() {
    let people: Vec<_> = (1..=12)
      .map(|m| person(Sex::Male, 1990, None, (2022, m)))
      .chain((1..=3).map(|m| person(Sex::Female, 1990, None, (2023, m))))
      .collect();
    let stats = compute_stats(&people, Utc::now());
    assert_eq!(stats.growth.len(), 12);
    assert_eq!(stats.growth[0].month, "2022-04");
    assert_eq!(stats.growth[11].month, "2023-03");
  }
}
