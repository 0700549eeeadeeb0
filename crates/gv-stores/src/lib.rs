//! # gv-stores
//!
//! Application-facing operations over the core ports. Every store receives
//! its collaborators as `Arc<dyn Port>` so the binary (or a test) decides
//! which plugins back them.
//!
//! Error policy: writes surface failures as [`AppError`]; reads that feed
//! a list or a card log the failure and return an empty value instead.

pub mod bookmarks;
pub mod feed;
pub mod identity;
pub mod messaging;
pub mod repo_timeline;

pub use bookmarks::BookmarkSet;
pub use feed::{FeedPager, FeedStore, DEFAULT_FEED_PAGE_SIZE};
pub use identity::{AnonymousIdentityStore, SessionContext};
pub use messaging::{merge_conversations, MessagingStore};
pub use repo_timeline::{RepoTimelineStore, DEFAULT_REPO_PAGE_SIZE};

use gv_core::error::AppError;

/// Logs a failed write and converts it for the caller.
pub(crate) fn write_error(action: &'static str) -> impl FnOnce(anyhow::Error) -> AppError {
    move |e| {
        tracing::error!(action, error = %e, "write failed");
        AppError::external(e)
    }
}
