//! SQL schema for the zupu SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS individuals (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    full_name    TEXT NOT NULL,
    sex          TEXT NOT NULL,   -- 'MALE' | 'FEMALE' | 'UNKNOWN'
    birth_date   TEXT NOT NULL,   -- YYYY-MM-DD
    death_date   TEXT,
    birth_place  TEXT NOT NULL,
    residence    TEXT,
    biography    TEXT,
    photo_url    TEXT,
    created_at   TEXT NOT NULL    -- RFC 3339 UTC, microseconds
);

CREATE TABLE IF NOT EXISTS relationships (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    person_a_id  INTEGER NOT NULL REFERENCES individuals(id) ON DELETE CASCADE,
    person_b_id  INTEGER NOT NULL REFERENCES individuals(id) ON DELETE CASCADE,
    kind         TEXT NOT NULL,   -- 'parent' | 'spouse' | legacy tag
    created_at   TEXT NOT NULL,
    UNIQUE (person_a_id, person_b_id, kind)
);

CREATE TABLE IF NOT EXISTS events (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    title        TEXT NOT NULL,
    date         TEXT NOT NULL,
    description  TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS accounts (
    account_id          TEXT PRIMARY KEY,
    email               TEXT NOT NULL UNIQUE,
    password_hash       TEXT NOT NULL,   -- argon2 PHC string
    confirmed           INTEGER NOT NULL DEFAULT 0,
    verification_token  TEXT UNIQUE,     -- cleared once confirmed
    created_at          TEXT NOT NULL
);

-- One row per account, created with it. Never deleted.
CREATE TABLE IF NOT EXISTS profiles (
    account_id   TEXT PRIMARY KEY REFERENCES accounts(account_id),
    role         TEXT NOT NULL DEFAULT 'USER',
    updated_at   TEXT NOT NULL
);

-- Only the SHA-256 digest of a bearer token is stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_hash   TEXT PRIMARY KEY,
    account_id   TEXT NOT NULL REFERENCES accounts(account_id),
    created_at   TEXT NOT NULL,
    expires_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS audit_log (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    actor_id     TEXT,
    action       TEXT NOT NULL,
    details      TEXT NOT NULL DEFAULT '{}',
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS individuals_name_idx    ON individuals(full_name);
CREATE INDEX IF NOT EXISTS relationships_b_idx     ON relationships(person_b_id);
CREATE INDEX IF NOT EXISTS sessions_expiry_idx     ON sessions(expires_at);
CREATE INDEX IF NOT EXISTS audit_log_action_idx    ON audit_log(action);

PRAGMA user_version = 1;
";
