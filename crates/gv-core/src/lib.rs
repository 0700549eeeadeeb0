//! gitview/crates/gv-core/src/lib.rs
//!
//! The central domain models and interface definitions for GitView.

pub mod error;
pub mod models;
pub mod traits;
pub mod validation;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
pub use validation::*;

#[cfg(test)]
mod tests {
    use super::models::*;
    use uuid::Uuid;

    fn profile(name: Option<&str>, email: Option<&str>) -> UserProfile {
        UserProfile {
            id: "uid-1".into(),
            display_name: name.map(String::from),
            email: email.map(String::from),
            avatar_url: None,
        }
    }

    #[test]
    fn display_name_falls_back_to_email_then_literal() {
        assert_eq!(profile(Some("Ada"), Some("ada@x.io")).resolved_name(), "Ada");
        assert_eq!(profile(None, Some("ada@x.io")).resolved_name(), "ada");
        assert_eq!(profile(Some(""), None).resolved_name(), FALLBACK_DISPLAY_NAME);
    }

    #[test]
    fn like_set_counter_tracks_membership() {
        let mut likes = LikeSet::default();
        assert!(likes.insert("a"));
        assert!(!likes.insert("a"));
        assert!(likes.insert("b"));
        assert_eq!(likes.count(), 2);
        assert!(likes.remove("a"));
        assert!(!likes.remove("a"));
        assert_eq!(likes.count() as usize, likes.members().len());
    }

    #[test]
    fn reply_thread_counter_tracks_length() {
        let mut thread = ReplyThread::default();
        for n in 0..3 {
            thread.push(Reply {
                id: Uuid::now_v7(),
                text: format!("reply {n}"),
                author_id: "u".into(),
                author: None,
                created_at: chrono::Utc::now(),
            });
        }
        assert_eq!(thread.count(), 3);
        assert_eq!(thread.replies().len(), 3);
    }

    #[test]
    fn restored_counters_match_collections() {
        let likes = LikeSet::restore(vec!["a".into(), "b".into()]);
        assert_eq!(likes.count(), 2);
        assert!(LikeSet::restore(Vec::new()).count() == 0);

        let reply = Reply {
            id: Uuid::now_v7(),
            text: "hi".into(),
            author_id: "u".into(),
            author: None,
            created_at: chrono::Utc::now(),
        };
        let mut thread = ReplyThread::restore(vec![reply.clone()]);
        assert_eq!(thread.count(), 1);
        thread.push(reply);
        assert_eq!(thread.count() as usize, thread.replies().len());
    }

    #[test]
    fn repo_coordinate_join_key() {
        let repo = RepoCoordinate::parse("rust-lang/rust").unwrap();
        assert_eq!(repo.full_name(), "rust-lang/rust");
        assert!(RepoCoordinate::parse("rust-lang").is_none());
        assert!(RepoCoordinate::parse("/rust").is_none());
        assert!(RepoCoordinate::parse("a/b/c").is_none());
    }
}
