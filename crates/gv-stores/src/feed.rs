//! The global feed: post creation, keyset-paginated reads and bookmarks.

use std::sync::Arc;

use gv_core::error::Result;
use gv_core::models::{AuthorSnapshot, FeedCursor, FeedPage, NewPost, UserProfile};
use gv_core::traits::PostRepo;
use gv_core::validation::validate_text;
use uuid::Uuid;

use crate::bookmarks::BookmarkSet;
use crate::write_error;

pub const DEFAULT_FEED_PAGE_SIZE: u32 = 10;

pub struct FeedStore {
    posts: Arc<dyn PostRepo>,
    bookmarks: BookmarkSet,
}

impl FeedStore {
    pub fn new(posts: Arc<dyn PostRepo>, bookmarks: BookmarkSet) -> Self {
        Self { posts, bookmarks }
    }

    /// Writes a post and returns its id.
    ///
    /// Author display fields are denormalized only when `profile` is given.
    pub async fn create_post(&self, text: &str, author_id: &str, profile: Option<&UserProfile>) -> Result<Uuid> {
        let text = validate_text(text, "post")?;

        let post = self
            .posts
            .insert_post(NewPost {
                text,
                author_id: author_id.to_string(),
                author: profile.map(AuthorSnapshot::from),
            })
            .await
            .map_err(write_error("create post"))?;

        tracing::info!(post_id = %post.id, author_id, "post created");
        Ok(post.id)
    }

    /// Up to `page_size` posts strictly older than `cursor`, newest first.
    ///
    /// Never fails: a store error yields an empty page without a cursor.
    pub async fn fetch_posts(&self, cursor: Option<FeedCursor>, page_size: u32) -> FeedPage {
        match self.posts.list_posts(cursor, page_size).await {
            Ok(posts) => {
                let next_cursor = posts.last().map(|p| p.cursor());
                FeedPage { posts, next_cursor }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch posts");
                FeedPage::default()
            }
        }
    }

    pub async fn toggle_bookmark(&self, post_id: Uuid) -> Result<bool> {
        self.bookmarks.toggle(post_id).await
    }

    pub async fn is_bookmarked(&self, post_id: Uuid) -> bool {
        self.bookmarks.contains(post_id).await
    }

    pub fn pager(&self, page_size: u32) -> FeedPager<'_> {
        FeedPager::new(self, page_size)
    }
}

/// Walks the feed page by page, tracking the cursor between calls.
///
/// Another page is assumed to exist while the last page came back full.
pub struct FeedPager<'a> {
    store: &'a FeedStore,
    page_size: u32,
    cursor: Option<FeedCursor>,
    has_more: bool,
}

impl<'a> FeedPager<'a> {
    pub fn new(store: &'a FeedStore, page_size: u32) -> Self {
        Self {
            store,
            page_size: page_size.max(1),
            cursor: None,
            has_more: true,
        }
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Fetches the next page; empty once the feed is exhausted.
    pub async fn load_more(&mut self) -> FeedPage {
        if !self.has_more {
            return FeedPage::default();
        }

        let page = self.store.fetch_posts(self.cursor, self.page_size).await;
        self.has_more = page.posts.len() == self.page_size as usize;
        if page.next_cursor.is_some() {
            self.cursor = page.next_cursor;
        }
        page
    }

    /// Back to the newest page (pull-to-refresh).
    pub fn reset(&mut self) {
        self.cursor = None;
        self.has_more = true;
    }
}
