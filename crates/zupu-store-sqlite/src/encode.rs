//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 UTC strings with a fixed microsecond
//! precision so that they sort lexically. Calendar dates are `YYYY-MM-DD`.
//! UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::Row;
use uuid::Uuid;
use zupu_core::{
  account::{AccountSummary, Role, Session, UserProfile},
  audit::AuditEntry,
  event::FamilyEvent,
  individual::{Individual, Sex},
  relationship::{Relationship, RelationshipKind},
};

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

pub fn decode_role(s: &str) -> Result<Role> {
  s.parse().map_err(|_| Error::Decode(format!("unknown role: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `individuals` row.
pub struct RawIndividual {
  pub id:          i64,
  pub full_name:   String,
  pub sex:         String,
  pub birth_date:  String,
  pub death_date:  Option<String>,
  pub birth_place: String,
  pub residence:   Option<String>,
  pub biography:   Option<String>,
  pub photo_url:   Option<String>,
  pub created_at:  String,
}

impl RawIndividual {
  pub const COLUMNS: &'static str = "id, full_name, sex, birth_date, death_date, birth_place, \
                                     residence, biography, photo_url, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      full_name:   row.get(1)?,
      sex:         row.get(2)?,
      birth_date:  row.get(3)?,
      death_date:  row.get(4)?,
      birth_place: row.get(5)?,
      residence:   row.get(6)?,
      biography:   row.get(7)?,
      photo_url:   row.get(8)?,
      created_at:  row.get(9)?,
    })
  }

  pub fn into_individual(self) -> Result<Individual> {
    Ok(Individual {
      id:          self.id,
      full_name:   self.full_name,
      sex:         Sex::parse(&self.sex),
      birth_date:  decode_date(&self.birth_date)?,
      death_date:  self.death_date.as_deref().map(decode_date).transpose()?,
      birth_place: self.birth_place,
      residence:   self.residence,
      biography:   self.biography,
      photo_url:   self.photo_url,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `relationships` row.
pub struct RawRelationship {
  pub id:          i64,
  pub person_a_id: i64,
  pub person_b_id: i64,
  pub kind:        String,
  pub created_at:  String,
}

impl RawRelationship {
  pub const COLUMNS: &'static str = "id, person_a_id, person_b_id, kind, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      person_a_id: row.get(1)?,
      person_b_id: row.get(2)?,
      kind:        row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn into_relationship(self) -> Result<Relationship> {
    let kind: RelationshipKind = self.kind.parse().unwrap_or_else(|never| match never {});
    Ok(Relationship {
      id: self.id,
      person_a_id: self.person_a_id,
      person_b_id: self.person_b_id,
      kind,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `events` row.
pub struct RawEvent {
  pub id:          i64,
  pub title:       String,
  pub date:        String,
  pub description: String,
  pub created_at:  String,
}

impl RawEvent {
  pub const COLUMNS: &'static str = "id, title, date, description, created_at";

  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      title:       row.get(1)?,
      date:        row.get(2)?,
      description: row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn into_event(self) -> Result<FamilyEvent> {
    Ok(FamilyEvent {
      id:          self.id,
      title:       self.title,
      date:        decode_date(&self.date)?,
      description: self.description,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// A `profiles` row, optionally joined with the account e-mail.
pub struct RawProfile {
  pub account_id: String,
  pub role:       String,
  pub updated_at: String,
  pub email:      Option<String>,
}

impl RawProfile {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id: row.get(0)?,
      role:       row.get(1)?,
      updated_at: row.get(2)?,
      email:      row.get(3)?,
    })
  }

  pub fn into_profile(self) -> Result<UserProfile> {
    Ok(UserProfile {
      account_id: decode_uuid(&self.account_id)?,
      role:       decode_role(&self.role)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }

  pub fn into_summary(mut self) -> Result<AccountSummary> {
    let email = self.email.take().unwrap_or_else(|| "Unknown".to_owned());
    Ok(AccountSummary { profile: self.into_profile()?, email })
  }
}

/// A `sessions` row joined with the account e-mail. Carries the plaintext
/// token, which is never read from the database.
pub struct RawSession {
  pub account_id: String,
  pub email:      String,
  pub expires_at: String,
}

impl RawSession {
  pub fn into_session(self, token: String) -> Result<Session> {
    Ok(Session {
      token,
      account_id: decode_uuid(&self.account_id)?,
      email: self.email,
      expires_at: decode_dt(&self.expires_at)?,
    })
  }
}

/// Raw strings read directly from an `audit_log` row.
pub struct RawAuditEntry {
  pub id:         i64,
  pub actor_id:   Option<String>,
  pub action:     String,
  pub details:    String,
  pub created_at: String,
}

impl RawAuditEntry {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      actor_id:   row.get(1)?,
      action:     row.get(2)?,
      details:    row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_entry(self) -> Result<AuditEntry> {
    Ok(AuditEntry {
      id:         self.id,
      actor_id:   self.actor_id.as_deref().map(decode_uuid).transpose()?,
      action:     self.action,
      details:    serde_json::from_str(&self.details)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
