//! [`AuditSink`] for [`SqliteStore`].

use chrono::Utc;

use zupu_core::{
  audit::{AuditEntry, AuditQuery, NewAuditEntry},
  store::AuditSink,
};

use crate::{
  Result, SqliteStore,
  encode::{RawAuditEntry, encode_dt, encode_uuid},
};

impl AuditSink for SqliteStore {
  async fn append(&self, entry: NewAuditEntry) -> Result<()> {
    let actor = entry.actor_id.map(encode_uuid);
    let details = serde_json::to_string(&entry.details)?;
    let at_str = encode_dt(Utc::now());
    let action = entry.action;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO audit_log (actor_id, action, details, created_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![actor, action, details, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_entries(&self, query: &AuditQuery) -> Result<Vec<AuditEntry>> {
    let action = query.action.clone();
    let limit = match query.limit {
      0 => -1,
      n => i64::try_from(n).unwrap_or(i64::MAX),
    };
    let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);

    let raws = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, actor_id, action, details, created_at FROM audit_log
           WHERE (?1 IS NULL OR action = ?1)
           ORDER BY id DESC
           LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![action, limit, offset], RawAuditEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAuditEntry::into_entry).collect()
  }
}
