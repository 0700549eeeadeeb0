mod common;

use gv_core::error::AppError;
use gv_core::models::FALLBACK_DISPLAY_NAME;

#[tokio::test]
async fn test_chat_interleaves_both_directions() {
    let (messaging, _) = common::messaging_store().await;
    messaging.send_message("alice", "bob", "hi bob", None).await.unwrap();
    messaging.send_message("bob", "alice", "hi alice", None).await.unwrap();
    messaging.send_message("carol", "alice", "unrelated", None).await.unwrap();
    messaging.send_message("alice", "bob", "how are you?", None).await.unwrap();
    messaging.send_message("bob", "alice", "great", None).await.unwrap();

    let texts = |messages: Vec<gv_core::models::Message>| -> Vec<String> {
        messages.into_iter().map(|m| m.text).collect()
    };
    let expected = ["hi bob", "hi alice", "how are you?", "great"];

    assert_eq!(texts(messaging.fetch_chat_messages("alice", "bob").await), expected);
    assert_eq!(texts(messaging.fetch_chat_messages("bob", "alice").await), expected);
}

#[tokio::test]
async fn test_messages_are_stored_unread_and_trimmed() {
    let (messaging, _) = common::messaging_store().await;
    let sender = common::profile("alice", Some("Alice"), None);
    messaging.send_message("alice", "bob", "  hello  ", Some(&sender)).await.unwrap();

    let chat = messaging.fetch_chat_messages("alice", "bob").await;
    assert_eq!(chat.len(), 1);
    assert_eq!(chat[0].text, "hello");
    assert!(!chat[0].read);
    assert_eq!(chat[0].sender.as_ref().map(|s| s.name.as_str()), Some("Alice"));

    let err = messaging.send_message("alice", "bob", "", None).await.unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
}

#[tokio::test]
async fn test_inbox_keeps_latest_per_counterpart() {
    let (messaging, db) = common::messaging_store().await;
    db.upsert_profile(&common::profile("bob", Some("Bob"), None)).await.unwrap();

    let carol = common::profile("carol", Some("Carol"), None);
    messaging.send_message("me", "bob", "first to bob", None).await.unwrap();
    messaging.send_message("carol", "me", "from carol", Some(&carol)).await.unwrap();
    messaging.send_message("bob", "me", "reply from bob", None).await.unwrap();
    messaging.send_message("me", "dave", "to dave", None).await.unwrap();

    let inbox = messaging.fetch_user_chats("me").await;
    let rows: Vec<_> = inbox
        .iter()
        .map(|c| (c.counterpart_id.as_str(), c.display_name.as_str(), c.last_message.as_str()))
        .collect();

    assert_eq!(
        rows,
        [
            ("dave", FALLBACK_DISPLAY_NAME, "to dave"),
            ("bob", "Bob", "reply from bob"),
            ("carol", "Carol", "from carol"),
        ]
    );
}

#[tokio::test]
async fn test_user_info_lookup() {
    let (messaging, db) = common::messaging_store().await;
    db.upsert_profile(&common::profile("bob", None, Some("bob@example.com"))).await.unwrap();

    let bob = messaging.fetch_user_info("bob").await.unwrap();
    assert_eq!(bob.resolved_name(), "bob");
    assert!(messaging.fetch_user_info("nobody").await.is_none());
}

#[tokio::test]
async fn test_inbox_keeps_sender_name_over_nameless_profile() {
    let (messaging, db) = common::messaging_store().await;
    db.upsert_profile(&common::profile("bob", None, None)).await.unwrap();

    let bob = common::profile("bob", Some("Bob"), None);
    messaging.send_message("bob", "me", "hello", Some(&bob)).await.unwrap();

    let inbox = messaging.fetch_user_chats("me").await;
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].display_name, "Bob");
}
