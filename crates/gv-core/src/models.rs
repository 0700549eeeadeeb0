//! # Domain Models
//!
//! These structs represent the core entities of GitView.
//! Document identifiers are UUID v7 so they sort by creation time and stay
//! unique without coordination.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Either an identity-provider user id or the anonymous client token.
pub type UserId = String;

/// Literal used when neither a display name nor an email is known.
pub const FALLBACK_DISPLAY_NAME: &str = "User";

/// A user as seen by the identity provider or stored in the `users` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

impl UserProfile {
    /// Profile name, else the local part of the email, else [`FALLBACK_DISPLAY_NAME`].
    pub fn resolved_name(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        self.email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or(FALLBACK_DISPLAY_NAME)
            .to_string()
    }
}

/// Author display fields copied onto a record at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSnapshot {
    pub name: String,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
}

impl From<&UserProfile> for AuthorSnapshot {
    fn from(profile: &UserProfile) -> Self {
        Self {
            name: profile.resolved_name(),
            avatar_url: profile.avatar_url.clone(),
            email: profile.email.clone(),
        }
    }
}

/// A note on the global feed. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub text: String,
    pub author_id: UserId,
    /// Present only when the author was signed in
    pub author: Option<AuthorSnapshot>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn is_authenticated(&self) -> bool {
        self.author.is_some()
    }

    /// Keyset position of this post in the recency ordering.
    pub fn cursor(&self) -> FeedCursor {
        FeedCursor {
            created_at: self.created_at,
            id: self.id,
        }
    }
}

/// Insert payload for [`Post`]; id and timestamp are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub text: String,
    pub author_id: UserId,
    pub author: Option<AuthorSnapshot>,
}

/// Opaque pointer to the last post of a page.
///
/// The id breaks ties between posts written in the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedCursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

/// One page of the global feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPage {
    pub posts: Vec<Post>,
    /// `None` when the page was empty or the fetch failed
    pub next_cursor: Option<FeedCursor>,
}

/// `owner/name` pair identifying a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoCoordinate {
    pub owner: String,
    pub name: String,
}

impl RepoCoordinate {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// The join key used to partition repository timelines.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Parses `owner/name`. Both halves must be non-empty.
    pub fn parse(full_name: &str) -> Option<Self> {
        let (owner, name) = full_name.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name))
    }
}

/// The set of users who liked a post, paired with its denormalized counter.
///
/// Only `insert` and `remove` change membership, and both move the counter
/// with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeSet {
    members: Vec<UserId>,
    count: u32,
}

impl LikeSet {
    /// Rebuilds a like set from persisted members. The counter is taken
    /// from the member list, so the two cannot disagree.
    pub fn restore(members: Vec<UserId>) -> Self {
        let count = members.len() as u32;
        Self { members, count }
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m == user_id)
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn members(&self) -> &[UserId] {
        &self.members
    }

    /// Returns false if the user was already present.
    pub fn insert(&mut self, user_id: &str) -> bool {
        if self.contains(user_id) {
            return false;
        }
        self.members.push(user_id.to_string());
        self.count += 1;
        true
    }

    /// Returns false if the user was not present.
    pub fn remove(&mut self, user_id: &str) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != user_id);
        if self.members.len() == before {
            return false;
        }
        self.count = self.count.saturating_sub(1);
        true
    }
}

/// A reply embedded in a [`RepoPost`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub id: Uuid,
    pub text: String,
    pub author_id: UserId,
    pub author: Option<AuthorSnapshot>,
    pub created_at: DateTime<Utc>,
}

/// Append-only reply sequence paired with its denormalized counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyThread {
    replies: Vec<Reply>,
    count: u32,
}

impl ReplyThread {
    pub fn restore(replies: Vec<Reply>) -> Self {
        let count = replies.len() as u32;
        Self { replies, count }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn replies(&self) -> &[Reply] {
        &self.replies
    }

    pub fn push(&mut self, reply: Reply) {
        self.replies.push(reply);
        self.count += 1;
    }
}

/// A post on a single repository's timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoPost {
    pub id: Uuid,
    pub text: String,
    pub repo: RepoCoordinate,
    pub author_id: UserId,
    pub author: Option<AuthorSnapshot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub likes: LikeSet,
    pub replies: ReplyThread,
}

impl RepoPost {
    pub fn repo_full_name(&self) -> String {
        self.repo.full_name()
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.contains(user_id)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.author_id == user_id
    }
}

/// Insert payload for [`RepoPost`]. Likes and replies always start empty.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRepoPost {
    pub text: String,
    pub repo: RepoCoordinate,
    pub author_id: UserId,
    pub author: Option<AuthorSnapshot>,
}

/// A direct message between two identities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub text: String,
    pub created_at: DateTime<Utc>,
    /// Written as `false` on send; no read path consults it yet.
    pub read: bool,
    pub sender: Option<AuthorSnapshot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMessage {
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub text: String,
    pub sender: Option<AuthorSnapshot>,
}

/// Inbox row: the latest message exchanged with one counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub counterpart_id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
}

/// Identity providers the sign-in flow can delegate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    Google,
    GitHub,
}
