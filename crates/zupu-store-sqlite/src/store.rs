//! [`SqliteStore`]: the SQLite implementation of [`DirectoryStore`].
//!
//! The identity and audit halves live in `identity.rs` and `audit.rs`.

use std::path::Path;

use chrono::{Duration, Utc};
use rusqlite::OptionalExtension as _;

use zupu_core::{
  event::{EventId, EventPatch, FamilyEvent, NewEvent},
  individual::{Individual, IndividualId, IndividualPatch, NewIndividual},
  relationship::{NewRelationship, Relationship, RelationshipId},
  store::{Backend, DirectoryStore, IndividualOrder, IndividualQuery, RelationshipQuery},
};

use crate::{
  Error, Result,
  encode::{RawEvent, RawIndividual, RawRelationship, encode_date, encode_dt},
  schema::SCHEMA,
};

const DEFAULT_SESSION_TTL_HOURS: i64 = 24 * 7;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A zupu store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn:        tokio_rusqlite::Connection,
  pub(crate) session_ttl: Duration,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  /// Lifetime of sessions created by subsequent sign-ins.
  pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
    self.session_ttl = ttl;
    self
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn, session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS) })
  }
}

impl Backend for SqliteStore {
  type Error = Error;
}

// ─── DirectoryStore impl ─────────────────────────────────────────────────────

impl DirectoryStore for SqliteStore {
  // ── Individuals ───────────────────────────────────────────────────────────

  async fn create_individual(&self, input: NewIndividual) -> Result<Individual> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let sex = input.sex.as_str();
    let birth = encode_date(input.birth_date);
    let death = input.death_date.map(encode_date);
    let row = input.clone();

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO individuals (
             full_name, sex, birth_date, death_date, birth_place,
             residence, biography, photo_url, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            row.full_name,
            sex,
            birth,
            death,
            row.birth_place,
            row.residence,
            row.biography,
            row.photo_url,
            at_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    tracing::debug!(id, "individual created");
    Ok(Individual {
      id,
      full_name: input.full_name,
      sex: input.sex,
      birth_date: input.birth_date,
      death_date: input.death_date,
      birth_place: input.birth_place,
      residence: input.residence,
      biography: input.biography,
      photo_url: input.photo_url,
      created_at,
    })
  }

  async fn get_individual(&self, id: IndividualId) -> Result<Option<Individual>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM individuals WHERE id = ?1", RawIndividual::COLUMNS),
              rusqlite::params![id],
              RawIndividual::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawIndividual::into_individual).transpose()
  }

  async fn list_individuals(&self, query: &IndividualQuery) -> Result<Vec<Individual>> {
    // The id list only ever holds integers, so it is safe to inline.
    let id_clause = match &query.ids {
      Some(ids) if ids.is_empty() => return Ok(Vec::new()),
      Some(ids) => {
        let list: Vec<String> = ids.iter().map(i64::to_string).collect();
        format!("AND id IN ({})", list.join(", "))
      }
      None => String::new(),
    };
    let pattern = query.name_contains.as_deref().map(like_pattern);
    let order = match query.order {
      IndividualOrder::Name => "full_name, id",
      IndividualOrder::CreatedAsc => "created_at, id",
      IndividualOrder::CreatedDesc => "created_at DESC, id DESC",
    };

    let sql = format!(
      "SELECT {} FROM individuals
       WHERE (?1 IS NULL OR full_name LIKE ?1 ESCAPE '\\') {id_clause}
       ORDER BY {order}",
      RawIndividual::COLUMNS
    );

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![pattern], RawIndividual::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawIndividual::into_individual).collect()
  }

  async fn update_individual(
    &self,
    id: IndividualId,
    patch: IndividualPatch,
  ) -> Result<Option<Individual>> {
    // Nullable columns take a (touch, value) pair so that `Some(None)` clears.
    let sex = patch.sex.map(|s| s.as_str());
    let birth = patch.birth_date.map(encode_date);
    let touch_death = patch.death_date.is_some();
    let death = patch.death_date.flatten().map(encode_date);
    let touch_residence = patch.residence.is_some();
    let residence = patch.residence.flatten();
    let touch_biography = patch.biography.is_some();
    let biography = patch.biography.flatten();
    let touch_photo = patch.photo_url.is_some();
    let photo = patch.photo_url.flatten();
    let full_name = patch.full_name;
    let birth_place = patch.birth_place;

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE individuals SET
             full_name   = COALESCE(?2, full_name),
             sex         = COALESCE(?3, sex),
             birth_date  = COALESCE(?4, birth_date),
             death_date  = CASE WHEN ?5 THEN ?6 ELSE death_date END,
             birth_place = COALESCE(?7, birth_place),
             residence   = CASE WHEN ?8 THEN ?9 ELSE residence END,
             biography   = CASE WHEN ?10 THEN ?11 ELSE biography END,
             photo_url   = CASE WHEN ?12 THEN ?13 ELSE photo_url END
           WHERE id = ?1",
          rusqlite::params![
            id,
            full_name,
            sex,
            birth,
            touch_death,
            death,
            birth_place,
            touch_residence,
            residence,
            touch_biography,
            biography,
            touch_photo,
            photo,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = tx.query_row(
          &format!("SELECT {} FROM individuals WHERE id = ?1", RawIndividual::COLUMNS),
          rusqlite::params![id],
          RawIndividual::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawIndividual::into_individual).transpose()
  }

  async fn delete_individual(&self, id: IndividualId) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM individuals WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;
    if deleted > 0 {
      tracing::debug!(id, "individual deleted with its relationships");
    }
    Ok(deleted > 0)
  }

  // ── Relationships ─────────────────────────────────────────────────────────

  async fn create_relationship(&self, input: NewRelationship) -> Result<Relationship> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let kind = input.kind.as_str().to_owned();
    let (a, b) = (input.person_a_id, input.person_b_id);

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO relationships (person_a_id, person_b_id, kind, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![a, b, kind, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Relationship {
      id,
      person_a_id: input.person_a_id,
      person_b_id: input.person_b_id,
      kind: input.kind,
      created_at,
    })
  }

  async fn get_relationship(&self, id: RelationshipId) -> Result<Option<Relationship>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM relationships WHERE id = ?1", RawRelationship::COLUMNS),
              rusqlite::params![id],
              RawRelationship::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawRelationship::into_relationship).transpose()
  }

  async fn list_relationships(&self, query: &RelationshipQuery) -> Result<Vec<Relationship>> {
    let involving = query.involving;
    let order = if query.newest_first { "id DESC" } else { "id" };
    let sql = format!(
      "SELECT {} FROM relationships
       WHERE (?1 IS NULL OR person_a_id = ?1 OR person_b_id = ?1)
       ORDER BY {order}",
      RawRelationship::COLUMNS
    );

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![involving], RawRelationship::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRelationship::into_relationship).collect()
  }

  async fn delete_relationship(&self, id: RelationshipId) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM relationships WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;
    Ok(deleted > 0)
  }

  // ── Events ────────────────────────────────────────────────────────────────

  async fn create_event(&self, input: NewEvent) -> Result<FamilyEvent> {
    let created_at = Utc::now();
    let at_str = encode_dt(created_at);
    let date = encode_date(input.date);
    let (title, description) = (input.title.clone(), input.description.clone());

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO events (title, date, description, created_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![title, date, description, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(FamilyEvent {
      id,
      title: input.title,
      date: input.date,
      description: input.description,
      created_at,
    })
  }

  async fn get_event(&self, id: EventId) -> Result<Option<FamilyEvent>> {
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {} FROM events WHERE id = ?1", RawEvent::COLUMNS),
              rusqlite::params![id],
              RawEvent::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn list_events(&self) -> Result<Vec<FamilyEvent>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM events ORDER BY date DESC, id DESC",
          RawEvent::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawEvent::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEvent::into_event).collect()
  }

  async fn update_event(&self, id: EventId, patch: EventPatch) -> Result<Option<FamilyEvent>> {
    let date = patch.date.map(encode_date);
    let (title, description) = (patch.title, patch.description);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE events SET
             title       = COALESCE(?2, title),
             date        = COALESCE(?3, date),
             description = COALESCE(?4, description)
           WHERE id = ?1",
          rusqlite::params![id, title, date, description],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        let raw = tx.query_row(
          &format!("SELECT {} FROM events WHERE id = ?1", RawEvent::COLUMNS),
          rusqlite::params![id],
          RawEvent::from_row,
        )?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawEvent::into_event).transpose()
  }

  async fn delete_event(&self, id: EventId) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM events WHERE id = ?1", rusqlite::params![id])?)
      })
      .await?;
    Ok(deleted > 0)
  }
}

/// `%needle%` with LIKE wildcards in the needle escaped.
fn like_pattern(needle: &str) -> String {
  let mut escaped = String::with_capacity(needle.len() + 2);
  escaped.push('%');
  for c in needle.chars() {
    if matches!(c, '%' | '_' | '\\') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped.push('%');
  escaped
}
