use async_trait::async_trait;
use chrono::Utc;
use gv_core::models::{FeedCursor, NewPost, Post};
use gv_core::traits::PostRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::{author_from_json, author_to_json, blob_to_uuid, from_micros, to_micros, uuid_to_blob, SqliteStore};

fn row_to_post(row: &SqliteRow) -> Post {
    Post {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        text: row.get("text"),
        author_id: row.get("author_id"),
        author: author_from_json(row.get("author")),
        created_at: from_micros(row.get("created_at")),
    }
}

#[async_trait]
impl PostRepo for SqliteStore {
    async fn insert_post(&self, post: NewPost) -> anyhow::Result<Post> {
        let stored = Post {
            id: Uuid::now_v7(),
            text: post.text,
            author_id: post.author_id,
            author: post.author,
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO posts (id, text, author_id, author, created_at) VALUES (?, ?, ?, ?, ?)")
            .bind(uuid_to_blob(stored.id))
            .bind(&stored.text)
            .bind(&stored.author_id)
            .bind(author_to_json(&stored.author)?)
            .bind(to_micros(stored.created_at))
            .execute(&self.pool)
            .await?;

        Ok(stored)
    }

    /// Keyset pagination on `(created_at, id)`, so inserts ahead of the
    /// cursor never shift later pages.
    async fn list_posts(&self, after: Option<FeedCursor>, limit: u32) -> anyhow::Result<Vec<Post>> {
        let rows = match after {
            Some(cursor) => {
                let at = to_micros(cursor.created_at);
                sqlx::query(
                    "SELECT id, text, author_id, author, created_at FROM posts \
                     WHERE created_at < ? OR (created_at = ? AND id < ?) \
                     ORDER BY created_at DESC, id DESC LIMIT ?",
                )
                .bind(at)
                .bind(at)
                .bind(uuid_to_blob(cursor.id))
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, text, author_id, author, created_at FROM posts \
                     ORDER BY created_at DESC, id DESC LIMIT ?",
                )
                .bind(i64::from(limit))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.iter().map(row_to_post).collect())
    }
}
