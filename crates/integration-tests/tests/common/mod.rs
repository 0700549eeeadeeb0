//! Shared fixtures: stores backed by in-memory SQLite and local storage.
#![allow(dead_code)]

use std::sync::Arc;

use gv_core::models::UserProfile;
use gv_db_sqlite::SqliteStore;
use gv_storage_local::MemoryStorage;
use gv_stores::{BookmarkSet, FeedStore, MessagingStore, RepoTimelineStore};

pub async fn sqlite() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::connect("sqlite::memory:", 1).await.unwrap())
}

pub async fn feed_store() -> FeedStore {
    FeedStore::new(sqlite().await, BookmarkSet::new(Arc::new(MemoryStorage::new())))
}

pub async fn timeline_store() -> RepoTimelineStore {
    RepoTimelineStore::new(sqlite().await)
}

pub async fn messaging_store() -> (MessagingStore, Arc<SqliteStore>) {
    let db = sqlite().await;
    (MessagingStore::new(db.clone(), db.clone()), db)
}

pub fn profile(id: &str, name: Option<&str>, email: Option<&str>) -> UserProfile {
    UserProfile {
        id: id.into(),
        display_name: name.map(Into::into),
        email: email.map(Into::into),
        avatar_url: Some(format!("https://avatars.example/{id}")),
    }
}
