//! Individuals: the people recorded in the family register.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result};

/// Store-assigned identifier of an [`Individual`].
pub type IndividualId = i64;

// ─── Sex ─────────────────────────────────────────────────────────────────────

/// Recorded sex of an individual.
///
/// Stored data has historically used both Chinese (`男` / `女`) and English
/// labels. Anything that is not recognisable is kept as [`Sex::Unknown`]
/// rather than rejected, so reads never fail on legacy rows.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  strum::Display,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
  Male,
  Female,
  #[default]
  Unknown,
}

impl Sex {
  /// Lenient parse used wherever external data is ingested.
  pub fn parse(label: &str) -> Self {
    match label.trim() {
      "男" => Self::Male,
      "女" => Self::Female,
      other if other.eq_ignore_ascii_case("male") || other.eq_ignore_ascii_case("m") => {
        Self::Male
      }
      other
        if other.eq_ignore_ascii_case("female") || other.eq_ignore_ascii_case("f") =>
      {
        Self::Female
      }
      _ => Self::Unknown,
    }
  }

  pub fn as_str(self) -> &'static str { self.into() }

  pub fn is_known(self) -> bool { !matches!(self, Self::Unknown) }
}

impl<'de> Deserialize<'de> for Sex {
  fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(de)?;
    Ok(Sex::parse(&raw))
  }
}

// ─── Individual ──────────────────────────────────────────────────────────────

/// A persisted individual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Individual {
  pub id:          IndividualId,
  pub full_name:   String,
  pub sex:         Sex,
  pub birth_date:  NaiveDate,
  /// Absent while living.
  pub death_date:  Option<NaiveDate>,
  pub birth_place: String,
  pub residence:   Option<String>,
  pub biography:   Option<String>,
  /// URI of a portrait; the store never holds image bytes.
  pub photo_url:   Option<String>,
  pub created_at:  DateTime<Utc>,
}

impl Individual {
  pub fn is_living(&self) -> bool { self.death_date.is_none() }

  pub fn birth_year(&self) -> i32 { self.birth_date.year() }

  pub fn death_year(&self) -> Option<i32> { self.death_date.map(|d| d.year()) }

  /// Surname, taken as the first character of the full name.
  pub fn surname(&self) -> Option<char> { self.full_name.trim().chars().next() }

  /// Apply a partial update in place.
  pub fn apply(&mut self, patch: IndividualPatch) {
    if let Some(v) = patch.full_name {
      self.full_name = v;
    }
    if let Some(v) = patch.sex {
      self.sex = v;
    }
    if let Some(v) = patch.birth_date {
      self.birth_date = v;
    }
    if let Some(v) = patch.death_date {
      self.death_date = v;
    }
    if let Some(v) = patch.birth_place {
      self.birth_place = v;
    }
    if let Some(v) = patch.residence {
      self.residence = v;
    }
    if let Some(v) = patch.biography {
      self.biography = v;
    }
    if let Some(v) = patch.photo_url {
      self.photo_url = v;
    }
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`DirectoryStore::create_individual`](crate::store::DirectoryStore::create_individual).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIndividual {
  pub full_name:   String,
  pub sex:         Sex,
  pub birth_date:  NaiveDate,
  #[serde(default)]
  pub death_date:  Option<NaiveDate>,
  pub birth_place: String,
  #[serde(default)]
  pub residence:   Option<String>,
  #[serde(default)]
  pub biography:   Option<String>,
  #[serde(default)]
  pub photo_url:   Option<String>,
}

impl NewIndividual {
  pub fn new(
    full_name: impl Into<String>,
    sex: Sex,
    birth_date: NaiveDate,
    birth_place: impl Into<String>,
  ) -> Self {
    Self {
      full_name: full_name.into(),
      sex,
      birth_date,
      death_date: None,
      birth_place: birth_place.into(),
      residence: None,
      biography: None,
      photo_url: None,
    }
  }

  /// Check the required fields and normalise blank optionals to `None`.
  pub fn normalized(mut self) -> Result<Self> {
    self.full_name = required("full_name", self.full_name)?;
    self.birth_place = required("birth_place", self.birth_place)?;
    if !self.sex.is_known() {
      return Err(Error::InvalidSex);
    }
    self.residence = blank_to_none(self.residence);
    self.biography = blank_to_none(self.biography);
    self.photo_url = blank_to_none(self.photo_url);
    Ok(self)
  }
}

/// Partial update for an [`Individual`].
///
/// Nullable fields use `Option<Option<T>>`: a missing key leaves the value
/// untouched, an explicit JSON `null` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndividualPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub full_name:   Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sex:         Option<Sex>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub birth_date:  Option<NaiveDate>,
  #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
  pub death_date:  Option<Option<NaiveDate>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub birth_place: Option<String>,
  #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
  pub residence:   Option<Option<String>>,
  #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
  pub biography:   Option<Option<String>>,
  #[serde(default, deserialize_with = "double_option", skip_serializing_if = "Option::is_none")]
  pub photo_url:   Option<Option<String>>,
}

impl IndividualPatch {
  pub fn normalized(mut self) -> Result<Self> {
    self.full_name = self.full_name.map(|v| required("full_name", v)).transpose()?;
    self.birth_place = self
      .birth_place
      .map(|v| required("birth_place", v))
      .transpose()?;
    if self.sex.is_some_and(|s| !s.is_known()) {
      return Err(Error::InvalidSex);
    }
    self.residence = self.residence.map(blank_to_none);
    self.biography = self.biography.map(blank_to_none);
    self.photo_url = self.photo_url.map(blank_to_none);
    Ok(self)
  }

  pub fn is_empty(&self) -> bool {
    self.full_name.is_none()
      && self.sex.is_none()
      && self.birth_date.is_none()
      && self.death_date.is_none()
      && self.birth_place.is_none()
      && self.residence.is_none()
      && self.biography.is_none()
      && self.photo_url.is_none()
  }
}

fn required(field: &'static str, value: String) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    Err(Error::MissingField(field))
  } else {
    Ok(trimmed.to_owned())
  }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

pub(crate) fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(de).map(Some)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sex_parse_accepts_both_label_sets() {
    assert_eq!(Sex::parse("男"), Sex::Male);
    assert_eq!(Sex::parse("女"), Sex::Female);
    assert_eq!(Sex::parse("MALE"), Sex::Male);
    assert_eq!(Sex::parse("female"), Sex::Female);
    assert_eq!(Sex::parse(" F "), Sex::Female);
    assert_eq!(Sex::parse("other"), Sex::Unknown);
    assert_eq!(Sex::parse(""), Sex::Unknown);
  }

  #[test]
  fn sex_deserialises_leniently() {
    let s: Sex = serde_json::from_str("\"男\"").unwrap();
    assert_eq!(s, Sex::Male);
    let s: Sex = serde_json::from_str("\"???\"").unwrap();
    assert_eq!(s, Sex::Unknown);
    assert_eq!(serde_json::to_string(&Sex::Female).unwrap(), "\"FEMALE\"");
  }

  #[test]
  fn new_individual_requires_known_sex() {
    let date = NaiveDate::from_ymd_opt(1950, 1, 1).unwrap();
    let input = NewIndividual::new("张三", Sex::Unknown, date, "北京");
    assert!(matches!(input.normalized(), Err(Error::InvalidSex)));
  }

  #[test]
  fn new_individual_rejects_blank_name() {
    let date = NaiveDate::from_ymd_opt(1950, 1, 1).unwrap();
    let input = NewIndividual::new("   ", Sex::Male, date, "北京");
    assert!(matches!(input.normalized(), Err(Error::MissingField("full_name"))));
  }

  #[test]
  fn patch_distinguishes_missing_and_null() {
    let patch: IndividualPatch =
      serde_json::from_str(r#"{"residence": null, "full_name": "李四"}"#).unwrap();
    assert_eq!(patch.residence, Some(None));
    assert_eq!(patch.biography, None);
    assert_eq!(patch.full_name.as_deref(), Some("李四"));
  }

  #[test]
  fn apply_patch_clears_and_sets() {
    let mut person = Individual {
      id:          1,
      full_name:   "张三".into(),
      sex:         Sex::Male,
      birth_date:  NaiveDate::from_ymd_opt(1950, 3, 1).unwrap(),
      death_date:  None,
      birth_place: "北京".into(),
      residence:   Some("上海".into()),
      biography:   None,
      photo_url:   None,
      created_at:  Utc::now(),
    };
    person.apply(IndividualPatch {
      residence: Some(None),
      death_date: Some(NaiveDate::from_ymd_opt(2020, 5, 1)),
      ..Default::default()
    });
    assert_eq!(person.residence, None);
    assert_eq!(person.death_year(), Some(2020));
    assert!(!person.is_living());
    assert_eq!(person.surname(), Some('张'));
  }
}
