//! Direct messages and the conversation list.
//!
//! Reads are point-in-time snapshots; callers poll to see new messages.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use gv_core::error::{AppError, Result};
use gv_core::models::{
    AuthorSnapshot, ConversationSummary, Message, NewMessage, UserId, UserProfile, FALLBACK_DISPLAY_NAME,
};
use gv_core::traits::{MessageRepo, UserDirectory};
use gv_core::validation::validate_text;
use uuid::Uuid;

use crate::write_error;

pub struct MessagingStore {
    messages: Arc<dyn MessageRepo>,
    users: Arc<dyn UserDirectory>,
}

impl MessagingStore {
    pub fn new(messages: Arc<dyn MessageRepo>, users: Arc<dyn UserDirectory>) -> Self {
        Self { messages, users }
    }

    pub async fn send_message(
        &self,
        sender_id: &str,
        receiver_id: &str,
        text: &str,
        sender: Option<&UserProfile>,
    ) -> Result<Uuid> {
        let text = validate_text(text, "message")?;
        if receiver_id.trim().is_empty() {
            return Err(AppError::ValidationError("message has no recipient".into()));
        }

        let message = self
            .messages
            .insert_message(NewMessage {
                sender_id: sender_id.to_string(),
                receiver_id: receiver_id.to_string(),
                text,
                sender: sender.map(AuthorSnapshot::from),
            })
            .await
            .map_err(write_error("send message"))?;

        tracing::info!(message_id = %message.id, sender_id, receiver_id, "message sent");
        Ok(message.id)
    }

    /// Both directions between two users, oldest first. Empty on failure.
    pub async fn fetch_chat_messages(&self, user_a: &str, user_b: &str) -> Vec<Message> {
        let result = tokio::try_join!(
            self.messages.list_directed(user_a, user_b),
            self.messages.list_directed(user_b, user_a),
        );

        match result {
            Ok((outgoing, incoming)) => merge_chat(outgoing, incoming),
            Err(e) => {
                tracing::warn!(user_a, user_b, error = %e, "failed to fetch chat messages");
                Vec::new()
            }
        }
    }

    /// One row per counterpart, most recent conversation first. Empty on failure.
    pub async fn fetch_user_chats(&self, user_id: &str) -> Vec<ConversationSummary> {
        let result = tokio::try_join!(
            self.messages.list_sent_by(user_id),
            self.messages.list_received_by(user_id),
        );
        let (sent, received) = match result {
            Ok(lists) => lists,
            Err(e) => {
                tracing::warn!(user_id, error = %e, "failed to fetch conversations");
                return Vec::new();
            }
        };

        let mut summaries = merge_conversations(user_id, sent, received);
        let profiles = join_all(summaries.iter().map(|s| self.fetch_user_info(&s.counterpart_id))).await;
        for (summary, profile) in summaries.iter_mut().zip(profiles) {
            if let Some(profile) = profile {
                // A nameless profile must not replace a name carried on a message.
                let named = profile.display_name.as_deref().is_some_and(|n| !n.is_empty());
                if named || summary.display_name == FALLBACK_DISPLAY_NAME {
                    summary.display_name = profile.resolved_name();
                }
                if profile.avatar_url.is_some() {
                    summary.avatar_url = profile.avatar_url;
                }
            }
        }
        summaries
    }

    /// Point lookup in the user directory. Absent on miss or failure.
    pub async fn fetch_user_info(&self, user_id: &str) -> Option<UserProfile> {
        self.users.get_profile(user_id).await.unwrap_or_else(|e| {
            tracing::warn!(user_id, error = %e, "user lookup failed");
            None
        })
    }
}

fn merge_chat(outgoing: Vec<Message>, incoming: Vec<Message>) -> Vec<Message> {
    let mut all = outgoing;
    all.extend(incoming);
    all.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
    // A chat with oneself returns every message from both queries.
    all.dedup_by_key(|m| m.id);
    all
}

struct Latest {
    text: String,
    at: DateTime<Utc>,
    /// Sender snapshot from any message the counterpart sent
    known: Option<AuthorSnapshot>,
}

/// Folds a user's sent and received messages into one summary per
/// counterpart, keeping the newest message of each.
///
/// Display fields come from the counterpart's own sender snapshots when
/// any exist, else [`FALLBACK_DISPLAY_NAME`].
pub fn merge_conversations(user_id: &str, sent: Vec<Message>, received: Vec<Message>) -> Vec<ConversationSummary> {
    let mut by_counterpart: HashMap<UserId, Latest> = HashMap::new();

    for message in sent.into_iter().chain(received) {
        let counterpart = if message.sender_id == user_id {
            message.receiver_id.clone()
        } else {
            message.sender_id.clone()
        };
        let snapshot = if message.sender_id == counterpart {
            message.sender.clone()
        } else {
            None
        };

        match by_counterpart.get_mut(&counterpart) {
            Some(latest) => {
                if message.created_at > latest.at {
                    latest.text = message.text;
                    latest.at = message.created_at;
                }
                if latest.known.is_none() {
                    latest.known = snapshot;
                }
            }
            None => {
                by_counterpart.insert(
                    counterpart,
                    Latest {
                        text: message.text,
                        at: message.created_at,
                        known: snapshot,
                    },
                );
            }
        }
    }

    let mut summaries: Vec<ConversationSummary> = by_counterpart
        .into_iter()
        .map(|(counterpart_id, latest)| {
            let (display_name, avatar_url) = match latest.known {
                Some(author) => (author.name, author.avatar_url),
                None => (FALLBACK_DISPLAY_NAME.to_string(), None),
            };
            ConversationSummary {
                counterpart_id,
                display_name,
                avatar_url,
                last_message: latest.text,
                last_message_at: latest.at,
            }
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.last_message_at
            .cmp(&a.last_message_at)
            .then_with(|| a.counterpart_id.cmp(&b.counterpart_id))
    });
    summaries
}
