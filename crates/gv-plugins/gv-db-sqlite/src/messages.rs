use async_trait::async_trait;
use chrono::Utc;
use gv_core::models::{Message, NewMessage};
use gv_core::traits::MessageRepo;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use crate::{author_from_json, author_to_json, blob_to_uuid, from_micros, to_micros, uuid_to_blob, SqliteStore};

const SELECT_MESSAGE: &str = "SELECT id, sender_id, receiver_id, text, created_at, read, sender FROM messages";

fn row_to_message(row: &SqliteRow) -> Message {
    Message {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
        sender_id: row.get("sender_id"),
        receiver_id: row.get("receiver_id"),
        text: row.get("text"),
        created_at: from_micros(row.get("created_at")),
        read: row.get("read"),
        sender: author_from_json(row.get("sender")),
    }
}

#[async_trait]
impl MessageRepo for SqliteStore {
    async fn insert_message(&self, message: NewMessage) -> anyhow::Result<Message> {
        let stored = Message {
            id: Uuid::now_v7(),
            sender_id: message.sender_id,
            receiver_id: message.receiver_id,
            text: message.text,
            created_at: Utc::now(),
            read: false,
            sender: message.sender,
        };

        sqlx::query(
            "INSERT INTO messages (id, sender_id, receiver_id, text, created_at, read, sender) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(stored.id))
        .bind(&stored.sender_id)
        .bind(&stored.receiver_id)
        .bind(&stored.text)
        .bind(to_micros(stored.created_at))
        .bind(stored.read)
        .bind(author_to_json(&stored.sender)?)
        .execute(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn list_directed(&self, sender_id: &str, receiver_id: &str) -> anyhow::Result<Vec<Message>> {
        let rows = sqlx::query(&format!(
            "{SELECT_MESSAGE} WHERE sender_id = ? AND receiver_id = ? ORDER BY created_at ASC, id ASC"
        ))
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_message).collect())
    }

    async fn list_sent_by(&self, user_id: &str) -> anyhow::Result<Vec<Message>> {
        let rows = sqlx::query(&format!(
            "{SELECT_MESSAGE} WHERE sender_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_message).collect())
    }

    async fn list_received_by(&self, user_id: &str) -> anyhow::Result<Vec<Message>> {
        let rows = sqlx::query(&format!(
            "{SELECT_MESSAGE} WHERE receiver_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_message).collect())
    }
}
