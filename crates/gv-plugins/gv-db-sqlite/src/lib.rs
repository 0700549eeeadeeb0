//! # gv-db-sqlite Implementation
//!
//! This crate implements the document collections (`posts`, `repoPosts`,
//! `messages`, `users`) on SQLite and maps rows back to `gv-core` models.
//!
//! Embedded collections (likes, replies) live in child tables keyed to their
//! parent post; their denormalized counters are updated in the same
//! transaction as the child row. A post is read, children included, inside
//! one transaction.

mod messages;
mod posts;
mod repo_posts;
mod users;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use gv_core::models::AuthorSnapshot;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS posts (
    id          BLOB PRIMARY KEY,
    text        TEXT NOT NULL,
    author_id   TEXT NOT NULL,
    author      TEXT,
    created_at  INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS posts_recency ON posts (created_at DESC, id DESC);

CREATE TABLE IF NOT EXISTS repo_posts (
    id              BLOB PRIMARY KEY,
    text            TEXT NOT NULL,
    repo_owner      TEXT NOT NULL,
    repo_name       TEXT NOT NULL,
    repo_full_name  TEXT NOT NULL,
    author_id       TEXT NOT NULL,
    author          TEXT,
    created_at      INTEGER NOT NULL,
    updated_at      INTEGER,
    likes_count     INTEGER NOT NULL DEFAULT 0,
    replies_count   INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS repo_posts_by_repo ON repo_posts (repo_full_name, created_at DESC);

CREATE TABLE IF NOT EXISTS repo_post_likes (
    post_id  BLOB NOT NULL REFERENCES repo_posts (id) ON DELETE CASCADE,
    user_id  TEXT NOT NULL,
    PRIMARY KEY (post_id, user_id)
);

CREATE TABLE IF NOT EXISTS repo_post_replies (
    seq         INTEGER PRIMARY KEY AUTOINCREMENT,
    id          BLOB NOT NULL UNIQUE,
    post_id     BLOB NOT NULL REFERENCES repo_posts (id) ON DELETE CASCADE,
    text        TEXT NOT NULL,
    author_id   TEXT NOT NULL,
    author      TEXT,
    created_at  INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS repo_post_replies_by_post ON repo_post_replies (post_id, seq);

CREATE TABLE IF NOT EXISTS messages (
    id           BLOB PRIMARY KEY,
    sender_id    TEXT NOT NULL,
    receiver_id  TEXT NOT NULL,
    text         TEXT NOT NULL,
    created_at   INTEGER NOT NULL,
    read         INTEGER NOT NULL DEFAULT 0,
    sender       TEXT
);
CREATE INDEX IF NOT EXISTS messages_by_pair ON messages (sender_id, receiver_id, created_at);
CREATE INDEX IF NOT EXISTS messages_by_receiver ON messages (receiver_id, created_at);

CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    display_name  TEXT,
    email         TEXT,
    avatar_url    TEXT
)
"#;

/// SQLite-backed implementation of every collection port.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (or creates) the database at `url` and applies the schema.
    ///
    /// In-memory databases are pinned to a single long-lived connection,
    /// since each SQLite connection would otherwise see its own empty database.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options)
                .await?
        };

        let store = Self { pool };
        store.migrate().await?;
        tracing::debug!(url, "sqlite store ready");
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        for statement in SCHEMA.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

// Helpers for column conversion

fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

/// Timestamps are stored as integer microseconds so they order numerically.
fn to_micros(at: DateTime<Utc>) -> i64 {
    at.timestamp_micros()
}

fn from_micros(micros: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(micros).unwrap_or_default()
}

fn author_to_json(author: &Option<AuthorSnapshot>) -> anyhow::Result<Option<String>> {
    author
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(Into::into)
}

fn author_from_json(raw: Option<String>) -> Option<AuthorSnapshot> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
}
