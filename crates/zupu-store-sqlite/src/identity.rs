//! [`IdentityStore`] for [`SqliteStore`]: accounts, sessions and roles.

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use zupu_core::{
  account::{AccountSummary, Role, Session, SignIn, SignUp, UserProfile, normalize_email},
  store::IdentityStore,
};

use crate::{
  Error, Result, SqliteStore,
  encode::{RawProfile, RawSession, encode_dt, encode_uuid},
  token::{generate_token, hash_password, token_digest, verify_password},
};

const PROFILE_COLUMNS: &str = "p.account_id, p.role, p.updated_at, a.email";

impl SqliteStore {
  /// Look up an account by e-mail. Used by the server's admin bootstrap.
  pub async fn account_id_by_email(&self, email: &str) -> Result<Option<Uuid>> {
    let email = normalize_email(email);
    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT account_id FROM accounts WHERE email = ?1",
              rusqlite::params![email],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    raw.as_deref().map(crate::encode::decode_uuid).transpose()
  }

  async fn profile_where(&self, account_id: Uuid) -> Result<Option<RawProfile>> {
    let id_str = encode_uuid(account_id);
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row(
                &format!(
                  "SELECT {PROFILE_COLUMNS} FROM profiles p
                   LEFT JOIN accounts a ON a.account_id = p.account_id
                   WHERE p.account_id = ?1"
                ),
                rusqlite::params![id_str],
                RawProfile::from_row,
              )
              .optional()?,
          )
        })
        .await?,
    )
  }
}

impl IdentityStore for SqliteStore {
  async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp> {
    let email = normalize_email(email);
    let password_hash = hash_password(password)?;
    let account_id = Uuid::new_v4();
    let verification_token = generate_token();

    let id_str = encode_uuid(account_id);
    let at_str = encode_dt(Utc::now());
    let token = verification_token.clone();

    let created = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let taken: bool = tx
          .query_row(
            "SELECT 1 FROM accounts WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }
        tx.execute(
          "INSERT INTO accounts (account_id, email, password_hash, verification_token, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, email, password_hash, token, at_str],
        )?;
        tx.execute(
          "INSERT INTO profiles (account_id, role, updated_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, Role::User.as_str(), at_str],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !created {
      return Ok(SignUp::EmailTaken);
    }
    tracing::info!(%account_id, "account created");
    Ok(SignUp::PendingVerification { account_id, verification_token })
  }

  async fn confirm_email(&self, token: &str) -> Result<bool> {
    let token = token.to_owned();
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE accounts SET confirmed = 1, verification_token = NULL
           WHERE verification_token = ?1",
          rusqlite::params![token],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn> {
    let email = normalize_email(email);
    let lookup = email.clone();
    let account: Option<(String, String, bool)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT account_id, password_hash, confirmed FROM accounts WHERE email = ?1",
              rusqlite::params![lookup],
              |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?,
        )
      })
      .await?;

    let Some((id_str, phc, confirmed)) = account else {
      return Ok(SignIn::InvalidCredentials);
    };
    if !verify_password(password, &phc) {
      return Ok(SignIn::InvalidCredentials);
    }
    if !confirmed {
      return Ok(SignIn::EmailNotConfirmed);
    }

    let token = generate_token();
    let digest = token_digest(&token);
    let now = Utc::now();
    let expires_at =
      now.checked_add_signed(self.session_ttl).ok_or(Error::SessionTtl(self.session_ttl))?;
    let (now_str, expires_str) = (encode_dt(now), encode_dt(expires_at));
    let account_id = crate::encode::decode_uuid(&id_str)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO sessions (token_hash, account_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![digest, id_str, now_str, expires_str],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(%account_id, "session opened");
    Ok(SignIn::Session(Session { token, account_id, email, expires_at }))
  }

  async fn sign_out(&self, token: &str) -> Result<()> {
    let digest = token_digest(token);
    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM sessions WHERE token_hash = ?1", rusqlite::params![digest])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_session(&self, token: &str) -> Result<Option<Session>> {
    let digest = token_digest(token);
    let now_str = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", rusqlite::params![now_str])?;
        Ok(
          conn
            .query_row(
              "SELECT s.account_id, a.email, s.expires_at
               FROM sessions s JOIN accounts a ON a.account_id = s.account_id
               WHERE s.token_hash = ?1",
              rusqlite::params![digest],
              |row| {
                Ok(RawSession {
                  account_id: row.get(0)?,
                  email:      row.get(1)?,
                  expires_at: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(|r| r.into_session(token.to_owned())).transpose()
  }

  async fn get_profile(&self, account_id: Uuid) -> Result<Option<UserProfile>> {
    self.profile_where(account_id).await?.map(RawProfile::into_profile).transpose()
  }

  async fn list_accounts(&self) -> Result<Vec<AccountSummary>> {
    let raws = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROFILE_COLUMNS} FROM profiles p
           LEFT JOIN accounts a ON a.account_id = p.account_id
           ORDER BY p.updated_at DESC"
        ))?;
        let rows = stmt
          .query_map([], RawProfile::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProfile::into_summary).collect()
  }

  async fn update_role(&self, account_id: Uuid, role: Role) -> Result<Option<UserProfile>> {
    let id_str = encode_uuid(account_id);
    let at_str = encode_dt(Utc::now());
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE profiles SET role = ?2, updated_at = ?3 WHERE account_id = ?1",
          rusqlite::params![id_str, role.as_str(), at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    tracing::info!(%account_id, role = role.as_str(), "role updated");
    self.get_profile(account_id).await
  }
}
