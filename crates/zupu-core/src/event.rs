//! Family events: dated entries on the clan timeline.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub type EventId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyEvent {
  pub id:          EventId,
  pub title:       String,
  pub date:        NaiveDate,
  pub description: String,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
  pub title:       String,
  pub date:        NaiveDate,
  pub description: String,
}

impl NewEvent {
  pub fn normalized(self) -> Result<Self> {
    let title = self.title.trim().to_owned();
    let description = self.description.trim().to_owned();
    if title.is_empty() {
      return Err(Error::MissingField("title"));
    }
    if description.is_empty() {
      return Err(Error::MissingField("description"));
    }
    Ok(Self { title, date: self.date, description })
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub title:       Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub date:        Option<NaiveDate>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

impl EventPatch {
  /// Trim text fields; present fields may not be blank.
  pub fn normalized(self) -> Result<Self> {
    let nonblank = |field: &'static str, v: String| {
      let v = v.trim().to_owned();
      if v.is_empty() { Err(Error::MissingField(field)) } else { Ok(v) }
    };
    Ok(Self {
      title:       self.title.map(|v| nonblank("title", v)).transpose()?,
      date:        self.date,
      description: self.description.map(|v| nonblank("description", v)).transpose()?,
    })
  }
}

impl FamilyEvent {
  pub fn apply(&mut self, patch: EventPatch) {
    if let Some(v) = patch.title {
      self.title = v;
    }
    if let Some(v) = patch.date {
      self.date = v;
    }
    if let Some(v) = patch.description {
      self.description = v;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn new_event_requires_text() {
    let date = NaiveDate::from_ymd_opt(2023, 4, 5).unwrap();
    let event = NewEvent { title: " 祭祖 ".into(), date, description: "清明".into() };
    assert_eq!(event.normalized().unwrap().title, "祭祖");

    let blank = NewEvent { title: "祭祖".into(), date, description: "  ".into() };
    assert!(matches!(blank.normalized(), Err(Error::MissingField("description"))));
  }

  #[test]
  fn patch_rejects_blank_title() {
    let patch = EventPatch { title: Some(" ".into()), ..Default::default() };
    assert!(matches!(patch.normalized(), Err(Error::MissingField("title"))));
    assert!(EventPatch::default().normalized().is_ok());
  }
}
