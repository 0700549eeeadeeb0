//! Per-repository timelines with likes, replies, edits and deletes.
//!
//! Mutations on an existing post check, in order: existence, authorship
//! (edit/delete only), then text. A caller who is not the author therefore
//! always gets [`AppError::PermissionDenied`], whatever text they sent.

use std::sync::Arc;

use chrono::Utc;
use gv_core::error::{AppError, Result};
use gv_core::models::{AuthorSnapshot, NewRepoPost, Reply, RepoCoordinate, RepoPost, UserProfile};
use gv_core::traits::RepoPostRepo;
use gv_core::validation::validate_text;
use uuid::Uuid;

use crate::write_error;

pub const DEFAULT_REPO_PAGE_SIZE: u32 = 20;

pub struct RepoTimelineStore {
    repo_posts: Arc<dyn RepoPostRepo>,
}

impl RepoTimelineStore {
    pub fn new(repo_posts: Arc<dyn RepoPostRepo>) -> Self {
        Self { repo_posts }
    }

    pub async fn create_repo_post(
        &self,
        text: &str,
        owner: &str,
        name: &str,
        author_id: &str,
        profile: Option<&UserProfile>,
    ) -> Result<Uuid> {
        let text = validate_text(text, "post")?;
        let repo = RepoCoordinate::new(owner, name);

        let post = self
            .repo_posts
            .insert_repo_post(NewRepoPost {
                text,
                repo,
                author_id: author_id.to_string(),
                author: profile.map(AuthorSnapshot::from),
            })
            .await
            .map_err(write_error("create repo post"))?;

        tracing::info!(post_id = %post.id, repo = %post.repo_full_name(), "repo post created");
        Ok(post.id)
    }

    /// Newest first; empty on failure.
    pub async fn fetch_repo_posts(&self, owner: &str, name: &str, page_size: u32) -> Vec<RepoPost> {
        let key = RepoCoordinate::new(owner, name).full_name();
        self.repo_posts
            .list_repo_posts(&key, page_size)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(repo = %key, error = %e, "failed to fetch repo posts");
                Vec::new()
            })
    }

    /// Flips `user_id`'s like; returns whether the post is now liked by them.
    ///
    /// Two toggles racing for the same user may both observe the same state.
    pub async fn toggle_like(&self, post_id: Uuid, user_id: &str) -> Result<bool> {
        let post = self.load(post_id).await?;

        if post.is_liked_by(user_id) {
            self.repo_posts
                .remove_like(post_id, user_id)
                .await
                .map_err(write_error("unlike"))?;
            tracing::debug!(%post_id, user_id, "like removed");
            Ok(false)
        } else {
            self.repo_posts
                .add_like(post_id, user_id)
                .await
                .map_err(write_error("like"))?;
            tracing::debug!(%post_id, user_id, "like added");
            Ok(true)
        }
    }

    pub async fn add_reply(
        &self,
        post_id: Uuid,
        text: &str,
        user_id: &str,
        profile: Option<&UserProfile>,
    ) -> Result<Reply> {
        let text = validate_text(text, "reply")?;
        self.load(post_id).await?;

        let reply = Reply {
            id: Uuid::now_v7(),
            text,
            author_id: user_id.to_string(),
            author: profile.map(AuthorSnapshot::from),
            created_at: Utc::now(),
        };
        self.repo_posts
            .append_reply(post_id, reply.clone())
            .await
            .map_err(write_error("add reply"))?;

        tracing::info!(%post_id, reply_id = %reply.id, "reply added");
        Ok(reply)
    }

    pub async fn update_post(&self, post_id: Uuid, text: &str, user_id: &str) -> Result<()> {
        self.load_owned(post_id, user_id).await?;
        let text = validate_text(text, "post")?;

        self.repo_posts
            .update_text(post_id, &text, Utc::now())
            .await
            .map_err(write_error("update repo post"))?;
        tracing::info!(%post_id, "repo post updated");
        Ok(())
    }

    /// Removes the post along with its likes and replies.
    pub async fn delete_post(&self, post_id: Uuid, user_id: &str) -> Result<()> {
        self.load_owned(post_id, user_id).await?;

        self.repo_posts
            .delete_repo_post(post_id)
            .await
            .map_err(write_error("delete repo post"))?;
        tracing::info!(%post_id, "repo post deleted");
        Ok(())
    }

    async fn load(&self, post_id: Uuid) -> Result<RepoPost> {
        self.repo_posts
            .get_repo_post(post_id)
            .await
            .map_err(AppError::external)?
            .ok_or_else(|| AppError::NotFound("RepoPost".into(), post_id.to_string()))
    }

    async fn load_owned(&self, post_id: Uuid, user_id: &str) -> Result<RepoPost> {
        let post = self.load(post_id).await?;
        if !post.is_owned_by(user_id) {
            tracing::warn!(%post_id, user_id, "rejected change by non-author");
            return Err(AppError::PermissionDenied(format!(
                "only the author can change post {post_id}"
            )));
        }
        Ok(post)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gv_core::models::{LikeSet, ReplyThread};
    use gv_core::traits::MockRepoPostRepo;
    use gv_core::validation::MAX_TEXT_LENGTH;

    fn repo_post(id: Uuid, author: &str, likers: &[&str]) -> RepoPost {
        let likers: Vec<String> = likers.iter().map(|s| s.to_string()).collect();
        RepoPost {
            id,
            text: "nice crate".into(),
            repo: RepoCoordinate::new("tokio-rs", "tokio"),
            author_id: author.into(),
            author: None,
            created_at: Utc::now(),
            updated_at: None,
            likes: LikeSet::restore(likers),
            replies: ReplyThread::default(),
        }
    }

    #[tokio::test]
    async fn test_create_uses_join_key() {
        let mut repo = MockRepoPostRepo::new();
        repo.expect_insert_repo_post()
            .withf(|p| p.repo.full_name() == "tokio-rs/tokio" && p.text == "hi")
            .times(1)
            .returning(|p| {
                let mut post = repo_post(Uuid::now_v7(), &p.author_id, &[]);
                post.text = p.text;
                Ok(post)
            });

        let store = RepoTimelineStore::new(Arc::new(repo));
        store.create_repo_post(" hi ", "tokio-rs", "tokio", "anon", None).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_text_without_writing() {
        let mut repo = MockRepoPostRepo::new();
        repo.expect_insert_repo_post().times(0);

        let store = RepoTimelineStore::new(Arc::new(repo));
        let oversize = "x".repeat(MAX_TEXT_LENGTH + 1);
        for text in ["", " \n\t ", oversize.as_str()] {
            let err = store
                .create_repo_post(text, "tokio-rs", "tokio", "u1", None)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::ValidationError(_)));
        }
    }

    #[tokio::test]
    async fn test_toggle_like_adds_then_removes() {
        let id = Uuid::now_v7();
        let mut repo = MockRepoPostRepo::new();
        let mut reads = 0;
        repo.expect_get_repo_post().times(2).returning(move |id| {
            reads += 1;
            let likers: &[&str] = if reads == 1 { &[] } else { &["u1"] };
            Ok(Some(repo_post(id, "author", likers)))
        });
        repo.expect_add_like().times(1).returning(|_, _| Ok(()));
        repo.expect_remove_like().times(1).returning(|_, _| Ok(()));

        let store = RepoTimelineStore::new(Arc::new(repo));
        assert!(store.toggle_like(id, "u1").await.unwrap());
        assert!(!store.toggle_like(id, "u1").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_post_is_not_found() {
        let mut repo = MockRepoPostRepo::new();
        repo.expect_get_repo_post().returning(|_| Ok(None));
        repo.expect_add_like().times(0);
        repo.expect_append_reply().times(0);

        let store = RepoTimelineStore::new(Arc::new(repo));
        let id = Uuid::now_v7();
        assert!(matches!(store.toggle_like(id, "u1").await, Err(AppError::NotFound(..))));
        assert!(matches!(store.add_reply(id, "hey", "u1", None).await, Err(AppError::NotFound(..))));
        assert!(matches!(store.delete_post(id, "u1").await, Err(AppError::NotFound(..))));
    }

    #[tokio::test]
    async fn test_reply_validated_before_lookup() {
        let mut repo = MockRepoPostRepo::new();
        repo.expect_get_repo_post().times(0);

        let store = RepoTimelineStore::new(Arc::new(repo));
        let oversize = "r".repeat(MAX_TEXT_LENGTH + 1);
        for text in ["  ", oversize.as_str()] {
            let err = store.add_reply(Uuid::now_v7(), text, "u1", None).await.unwrap_err();
            assert!(matches!(err, AppError::ValidationError(_)));
        }
    }

    #[tokio::test]
    async fn test_add_reply_appends_with_fresh_id() {
        let id = Uuid::now_v7();
        let mut repo = MockRepoPostRepo::new();
        repo.expect_get_repo_post()
            .returning(|id| Ok(Some(repo_post(id, "author", &[]))));
        repo.expect_append_reply()
            .withf(move |post_id, reply| *post_id == id && reply.text == "thanks")
            .times(1)
            .returning(|_, _| Ok(()));

        let store = RepoTimelineStore::new(Arc::new(repo));
        let reply = store.add_reply(id, "thanks ", "u2", None).await.unwrap();
        assert_eq!(reply.author_id, "u2");
        assert_ne!(reply.id, id);
    }

    #[tokio::test]
    async fn test_non_author_is_denied_even_with_bad_text() {
        let mut repo = MockRepoPostRepo::new();
        repo.expect_get_repo_post()
            .returning(|id| Ok(Some(repo_post(id, "author", &[]))));
        repo.expect_update_text().times(0);
        repo.expect_delete_repo_post().times(0);

        let store = RepoTimelineStore::new(Arc::new(repo));
        let id = Uuid::now_v7();
        for text in ["edited", ""] {
            let err = store.update_post(id, text, "intruder").await.unwrap_err();
            assert!(matches!(err, AppError::PermissionDenied(_)));
        }
        let err = store.delete_post(id, "intruder").await.unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));
    }

    #[tokio::test]
    async fn test_author_can_update_and_delete() {
        let mut repo = MockRepoPostRepo::new();
        repo.expect_get_repo_post()
            .returning(|id| Ok(Some(repo_post(id, "author", &[]))));
        repo.expect_update_text()
            .withf(|_, text, _| text == "fixed typo")
            .times(1)
            .returning(|_, _, _| Ok(()));
        repo.expect_delete_repo_post().times(1).returning(|_| Ok(()));

        let store = RepoTimelineStore::new(Arc::new(repo));
        let id = Uuid::now_v7();
        let oversize = "e".repeat(MAX_TEXT_LENGTH + 1);
        for text in ["", oversize.as_str()] {
            let err = store.update_post(id, text, "author").await.unwrap_err();
            assert!(matches!(err, AppError::ValidationError(_)));
        }
        store.update_post(id, "fixed typo", "author").await.unwrap();
        store.delete_post(id, "author").await.unwrap();
    }

    #[tokio::test]
    async fn test_fetch_fails_soft() {
        let mut repo = MockRepoPostRepo::new();
        repo.expect_list_repo_posts()
            .withf(|key, limit| key == "a/b" && *limit == 20)
            .returning(|_, _| Err(anyhow::anyhow!("offline")));

        let store = RepoTimelineStore::new(Arc::new(repo));
        assert!(store.fetch_repo_posts("a", "b", DEFAULT_REPO_PAGE_SIZE).await.is_empty());
    }
}
