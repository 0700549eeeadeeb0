mod common;

use std::collections::HashSet;

use gv_core::error::AppError;
use gv_core::models::FALLBACK_DISPLAY_NAME;
use uuid::Uuid;

#[tokio::test]
async fn test_pagination_covers_25_posts_in_10_10_5() {
    let feed = common::feed_store().await;
    let mut written = Vec::new();
    for n in 0..25 {
        written.push(feed.create_post(&format!("post {n}"), "anon", None).await.unwrap());
    }

    let mut cursor = None;
    let mut sizes = Vec::new();
    let mut seen = HashSet::new();
    let mut previous_oldest = None;
    for _ in 0..3 {
        let page = feed.fetch_posts(cursor, 10).await;
        sizes.push(page.posts.len());

        for pair in page.posts.windows(2) {
            assert!((pair[0].created_at, pair[0].id) > (pair[1].created_at, pair[1].id));
        }
        if let (Some(oldest), Some(first)) = (previous_oldest, page.posts.first()) {
            assert!((first.created_at, first.id) < oldest);
        }
        for post in &page.posts {
            assert!(seen.insert(post.id), "duplicate post {}", post.id);
        }

        previous_oldest = page.posts.last().map(|p| (p.created_at, p.id));
        cursor = page.next_cursor;
    }

    assert_eq!(sizes, [10, 10, 5]);
    assert_eq!(seen, written.into_iter().collect::<HashSet<Uuid>>());

    let exhausted = feed.fetch_posts(cursor, 10).await;
    assert!(exhausted.posts.is_empty());
    assert!(exhausted.next_cursor.is_none());
}

#[tokio::test]
async fn test_pager_reports_end_of_feed() {
    let feed = common::feed_store().await;
    for n in 0..12 {
        feed.create_post(&format!("post {n}"), "anon", None).await.unwrap();
    }

    let mut pager = feed.pager(10);
    assert_eq!(pager.load_more().await.posts.len(), 10);
    assert!(pager.has_more());
    assert_eq!(pager.load_more().await.posts.len(), 2);
    assert!(!pager.has_more());

    pager.reset();
    let first = pager.load_more().await;
    assert_eq!(first.posts[0].text, "post 11");
}

#[tokio::test]
async fn test_invalid_post_leaves_feed_untouched() {
    let feed = common::feed_store().await;

    let oversize = "あ".repeat(501);
    for text in ["", "  \t", oversize.as_str()] {
        let err = feed.create_post(text, "anon", None).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert!(err.is_user_actionable());
    }
    assert!(feed.fetch_posts(None, 10).await.posts.is_empty());

    // Exactly 500 code points is accepted.
    feed.create_post(&"あ".repeat(500), "anon", None).await.unwrap();
    assert_eq!(feed.fetch_posts(None, 10).await.posts.len(), 1);
}

#[tokio::test]
async fn test_author_snapshot_only_for_signed_in_users() {
    let feed = common::feed_store().await;
    let nameless = common::profile("gh-1", None, None);
    let by_email = common::profile("gh-2", None, Some("grace@example.com"));

    feed.create_post("anonymous", "anon-token", None).await.unwrap();
    feed.create_post("nameless", "gh-1", Some(&nameless)).await.unwrap();
    feed.create_post("by email", "gh-2", Some(&by_email)).await.unwrap();

    let posts = feed.fetch_posts(None, 10).await.posts;
    assert_eq!(posts[0].author.as_ref().unwrap().name, "grace");
    assert_eq!(posts[1].author.as_ref().unwrap().name, FALLBACK_DISPLAY_NAME);
    assert!(!posts[2].is_authenticated());
}

#[tokio::test]
async fn test_bookmarks_are_local_and_toggle() {
    let feed = common::feed_store().await;
    let id = feed.create_post("keep me", "anon", None).await.unwrap();

    assert!(!feed.is_bookmarked(id).await);
    assert!(feed.toggle_bookmark(id).await.unwrap());
    assert!(feed.is_bookmarked(id).await);
    assert!(!feed.toggle_bookmark(id).await.unwrap());
    assert!(!feed.is_bookmarked(id).await);
}
