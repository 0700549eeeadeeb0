//! Client-local bookmark set, stored as a JSON array of post ids.

use std::sync::Arc;

use gv_core::error::{AppError, Result};
use gv_core::traits::LocalStorage;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Storage key of the bookmarked post ids (a JSON array).
pub const BOOKMARKS_KEY: &str = "gitview_bookmarks";

/// Per-client set of bookmarked post ids.
///
/// Keyed by post id only, so every identity sharing the local storage
/// shares the bookmarks.
pub struct BookmarkSet {
    storage: Arc<dyn LocalStorage>,
    /// Serializes read-modify-write toggles
    write_lock: Mutex<()>,
}

impl BookmarkSet {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            storage,
            write_lock: Mutex::new(()),
        }
    }

    /// Adds or removes `post_id`; returns whether it is now bookmarked.
    pub async fn toggle(&self, post_id: Uuid) -> Result<bool> {
        let _guard = self.write_lock.lock().await;

        let mut ids = self.load().await?;
        let key = post_id.to_string();
        let bookmarked = match ids.iter().position(|id| *id == key) {
            Some(index) => {
                ids.remove(index);
                false
            }
            None => {
                ids.push(key);
                true
            }
        };

        let encoded = serde_json::to_string(&ids).map_err(|e| AppError::Internal(e.to_string()))?;
        self.storage
            .set_item(BOOKMARKS_KEY, &encoded)
            .await
            .map_err(AppError::external)?;
        Ok(bookmarked)
    }

    pub async fn contains(&self, post_id: Uuid) -> bool {
        let key = post_id.to_string();
        self.ids().await.iter().any(|id| *id == key)
    }

    /// Bookmarked ids in the order they were added.
    pub async fn ids(&self) -> Vec<String> {
        self.load().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "bookmarks unreadable");
            Vec::new()
        })
    }

    /// A value that is not a JSON string array is an error, so `toggle`
    /// never writes over it.
    async fn load(&self) -> Result<Vec<String>> {
        let raw = self
            .storage
            .get_item(BOOKMARKS_KEY)
            .await
            .map_err(AppError::external)?;

        match raw {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                tracing::error!(len = raw.len(), error = %e, "stored bookmark list is malformed");
                AppError::Internal(format!("malformed bookmark list: {e}"))
            }),
            None => Ok(Vec::new()),
        }
    }
}
