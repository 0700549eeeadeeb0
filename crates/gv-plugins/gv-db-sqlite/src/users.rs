use async_trait::async_trait;
use gv_core::models::UserProfile;
use gv_core::traits::UserDirectory;
use sqlx::Row;

use crate::SqliteStore;

impl SqliteStore {
    /// Writes a profile into the `users` collection.
    ///
    /// Nothing in the stores calls this; the collection is filled by
    /// whatever provisions accounts (seeding, an identity-provider hook).
    pub async fn upsert_profile(&self, profile: &UserProfile) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO users (id, display_name, email, avatar_url) VALUES (?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET display_name = excluded.display_name, \
             email = excluded.email, avatar_url = excluded.avatar_url",
        )
        .bind(&profile.id)
        .bind(&profile.display_name)
        .bind(&profile.email)
        .bind(&profile.avatar_url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for SqliteStore {
    async fn get_profile(&self, user_id: &str) -> anyhow::Result<Option<UserProfile>> {
        let row = sqlx::query("SELECT id, display_name, email, avatar_url FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| UserProfile {
            id: row.get("id"),
            display_name: row.get("display_name"),
            email: row.get("email"),
            avatar_url: row.get("avatar_url"),
        }))
    }
}
