use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gv_core::models::{LikeSet, NewRepoPost, Reply, ReplyThread, RepoCoordinate, RepoPost};
use gv_core::traits::RepoPostRepo;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use crate::{author_from_json, author_to_json, blob_to_uuid, from_micros, to_micros, uuid_to_blob, SqliteStore};

const SELECT_REPO_POST: &str = "SELECT id, text, repo_owner, repo_name, author_id, author, created_at, \
     updated_at, likes_count, replies_count FROM repo_posts";

/// Loads the embedded likes and replies for a `repo_posts` row.
///
/// Takes the connection of the caller's transaction so the post row and
/// its children come from the same snapshot.
async fn hydrate_repo_post(conn: &mut SqliteConnection, row: &SqliteRow) -> anyhow::Result<RepoPost> {
    let id = blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice());

    let likes: Vec<String> =
        sqlx::query("SELECT user_id FROM repo_post_likes WHERE post_id = ? ORDER BY rowid ASC")
            .bind(uuid_to_blob(id))
            .fetch_all(&mut *conn)
            .await?
            .into_iter()
            .map(|r| r.get::<String, _>("user_id"))
            .collect();

    let replies: Vec<Reply> = sqlx::query(
        "SELECT id, text, author_id, author, created_at FROM repo_post_replies \
         WHERE post_id = ? ORDER BY seq ASC",
    )
    .bind(uuid_to_blob(id))
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|r| Reply {
        id: blob_to_uuid(r.get::<Vec<u8>, _>("id").as_slice()),
        text: r.get("text"),
        author_id: r.get("author_id"),
        author: author_from_json(r.get("author")),
        created_at: from_micros(r.get("created_at")),
    })
    .collect();

    let likes_count: i64 = row.get("likes_count");
    let replies_count: i64 = row.get("replies_count");
    if likes_count != likes.len() as i64 || replies_count != replies.len() as i64 {
        tracing::warn!(
            post_id = %id,
            likes_count,
            likes = likes.len(),
            replies_count,
            replies = replies.len(),
            "stored counters disagree with child rows"
        );
    }

    Ok(RepoPost {
        id,
        text: row.get("text"),
        repo: RepoCoordinate::new(row.get::<String, _>("repo_owner"), row.get::<String, _>("repo_name")),
        author_id: row.get("author_id"),
        author: author_from_json(row.get("author")),
        created_at: from_micros(row.get("created_at")),
        updated_at: row.get::<Option<i64>, _>("updated_at").map(from_micros),
        likes: LikeSet::restore(likes),
        replies: ReplyThread::restore(replies),
    })
}

/// Fails the surrounding transaction when the parent post is gone.
async fn ensure_repo_post(conn: &mut SqliteConnection, id: Uuid) -> anyhow::Result<()> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM repo_posts WHERE id = ?")
        .bind(uuid_to_blob(id))
        .fetch_optional(&mut *conn)
        .await?;
    if exists.is_none() {
        anyhow::bail!("repo post {id} not found");
    }
    Ok(())
}

#[async_trait]
impl RepoPostRepo for SqliteStore {
    async fn insert_repo_post(&self, post: NewRepoPost) -> anyhow::Result<RepoPost> {
        let stored = RepoPost {
            id: Uuid::now_v7(),
            text: post.text,
            repo: post.repo,
            author_id: post.author_id,
            author: post.author,
            created_at: Utc::now(),
            updated_at: None,
            likes: LikeSet::default(),
            replies: ReplyThread::default(),
        };

        sqlx::query(
            "INSERT INTO repo_posts (id, text, repo_owner, repo_name, repo_full_name, author_id, author, \
             created_at, updated_at, likes_count, replies_count) VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL, 0, 0)",
        )
        .bind(uuid_to_blob(stored.id))
        .bind(&stored.text)
        .bind(&stored.repo.owner)
        .bind(&stored.repo.name)
        .bind(stored.repo.full_name())
        .bind(&stored.author_id)
        .bind(author_to_json(&stored.author)?)
        .bind(to_micros(stored.created_at))
        .execute(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn get_repo_post(&self, id: Uuid) -> anyhow::Result<Option<RepoPost>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!("{SELECT_REPO_POST} WHERE id = ?"))
            .bind(uuid_to_blob(id))
            .fetch_optional(&mut *tx)
            .await?;

        let post = match row {
            Some(row) => Some(hydrate_repo_post(&mut *tx, &row).await?),
            None => None,
        };

        tx.commit().await?;
        Ok(post)
    }

    async fn list_repo_posts(&self, repo_full_name: &str, limit: u32) -> anyhow::Result<Vec<RepoPost>> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(&format!(
            "{SELECT_REPO_POST} WHERE repo_full_name = ? ORDER BY created_at DESC, id DESC LIMIT ?"
        ))
        .bind(repo_full_name)
        .bind(i64::from(limit))
        .fetch_all(&mut *tx)
        .await?;

        let mut posts = Vec::with_capacity(rows.len());
        for row in &rows {
            posts.push(hydrate_repo_post(&mut *tx, row).await?);
        }

        tx.commit().await?;
        Ok(posts)
    }

    /// The counter only moves when the membership row actually changed,
    /// so a duplicate add leaves `likes_count` equal to the set size.
    async fn add_like(&self, id: Uuid, user_id: &str) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        ensure_repo_post(&mut *tx, id).await?;

        let inserted = sqlx::query("INSERT OR IGNORE INTO repo_post_likes (post_id, user_id) VALUES (?, ?)")
            .bind(uuid_to_blob(id))
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if inserted > 0 {
            sqlx::query("UPDATE repo_posts SET likes_count = likes_count + 1 WHERE id = ?")
                .bind(uuid_to_blob(id))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn remove_like(&self, id: Uuid, user_id: &str) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM repo_post_likes WHERE post_id = ? AND user_id = ?")
            .bind(uuid_to_blob(id))
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed > 0 {
            sqlx::query("UPDATE repo_posts SET likes_count = likes_count - 1 WHERE id = ?")
                .bind(uuid_to_blob(id))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn append_reply(&self, id: Uuid, reply: Reply) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        ensure_repo_post(&mut *tx, id).await?;

        sqlx::query(
            "INSERT INTO repo_post_replies (id, post_id, text, author_id, author, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(reply.id))
        .bind(uuid_to_blob(id))
        .bind(&reply.text)
        .bind(&reply.author_id)
        .bind(author_to_json(&reply.author)?)
        .bind(to_micros(reply.created_at))
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE repo_posts SET replies_count = replies_count + 1 WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_text(&self, id: Uuid, text: &str, updated_at: DateTime<Utc>) -> anyhow::Result<()> {
        let updated = sqlx::query("UPDATE repo_posts SET text = ?, updated_at = ? WHERE id = ?")
            .bind(text)
            .bind(to_micros(updated_at))
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?
            .rows_affected();
        if updated == 0 {
            anyhow::bail!("repo post {id} not found");
        }
        Ok(())
    }

    async fn delete_repo_post(&self, id: Uuid) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        for table in ["repo_post_likes", "repo_post_replies"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE post_id = ?"))
                .bind(uuid_to_blob(id))
                .execute(&mut *tx)
                .await?;
        }
        sqlx::query("DELETE FROM repo_posts WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
