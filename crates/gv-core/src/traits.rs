//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be wired into the stores.
//! Collection ports mirror the document database's primitives: insert with a
//! generated id, point read, partial update (with atomic counters), delete,
//! and ordered range queries with equality filters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::ProviderError;
use crate::models::{
    FeedCursor, Message, NewMessage, NewPost, NewRepoPost, Post, ProviderKind, Reply, RepoPost,
    UserProfile,
};

/// The `posts` collection.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepo: Send + Sync {
    /// Stores the post with a generated id and a store-side timestamp.
    async fn insert_post(&self, post: NewPost) -> anyhow::Result<Post>;

    /// Newest first. With a cursor, only posts strictly older than it.
    async fn list_posts(&self, after: Option<FeedCursor>, limit: u32) -> anyhow::Result<Vec<Post>>;
}

/// The `repoPosts` collection.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RepoPostRepo: Send + Sync {
    async fn insert_repo_post(&self, post: NewRepoPost) -> anyhow::Result<RepoPost>;
    async fn get_repo_post(&self, id: Uuid) -> anyhow::Result<Option<RepoPost>>;

    /// Equality filter on the `owner/name` join key, newest first.
    async fn list_repo_posts(&self, repo_full_name: &str, limit: u32) -> anyhow::Result<Vec<RepoPost>>;

    /// Adds `user_id` to the like set and atomically increments the counter.
    async fn add_like(&self, id: Uuid, user_id: &str) -> anyhow::Result<()>;

    /// Removes `user_id` from the like set and atomically decrements the counter.
    async fn remove_like(&self, id: Uuid, user_id: &str) -> anyhow::Result<()>;

    /// Appends to the reply sequence and atomically increments the counter.
    async fn append_reply(&self, id: Uuid, reply: Reply) -> anyhow::Result<()>;

    async fn update_text(&self, id: Uuid, text: &str, updated_at: DateTime<Utc>) -> anyhow::Result<()>;

    /// Removes the post together with its embedded likes and replies.
    async fn delete_repo_post(&self, id: Uuid) -> anyhow::Result<()>;
}

/// The `messages` collection.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MessageRepo: Send + Sync {
    async fn insert_message(&self, message: NewMessage) -> anyhow::Result<Message>;

    /// Messages from `sender_id` to `receiver_id` only, oldest first.
    async fn list_directed(&self, sender_id: &str, receiver_id: &str) -> anyhow::Result<Vec<Message>>;

    /// Everything `user_id` sent, newest first.
    async fn list_sent_by(&self, user_id: &str) -> anyhow::Result<Vec<Message>>;

    /// Everything `user_id` received, newest first.
    async fn list_received_by(&self, user_id: &str) -> anyhow::Result<Vec<Message>>;
}

/// The `users` collection. Populated outside this system.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> anyhow::Result<Option<UserProfile>>;
}

/// Client-local key/value persistence (the browser-storage equivalent).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LocalStorage: Send + Sync {
    async fn get_item(&self, key: &str) -> anyhow::Result<Option<String>>;
    async fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()>;
}

/// A minimal HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Transport boundary for all outbound HTTP reads.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issues a GET. Non-2xx statuses are returned, not raised.
    async fn get(&self, url: &str) -> anyhow::Result<HttpResponse>;
}

/// Third-party identity provider contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The session persisted by the provider, if any.
    async fn restore_session(&self) -> Option<UserProfile>;
    async fn sign_in(&self, kind: ProviderKind) -> Result<UserProfile, ProviderError>;
    async fn sign_out(&self) -> Result<(), ProviderError>;
}
