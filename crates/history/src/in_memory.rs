//! In-memory history: useful for testing and ephemeral CLI sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use solace_core::error::HistoryError;
use solace_core::history::{HistoryMessage, MessageHistory};
use solace_core::message::{ConversationId, Speaker};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Messages kept per conversation in insertion order.
///
/// [`set_unavailable`](Self::set_unavailable) makes every fetch fail, so
/// callers can exercise their degraded paths.
pub struct InMemoryHistory {
    conversations: RwLock<HashMap<ConversationId, Vec<HistoryMessage>>>,
    unavailable: AtomicBool,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self {
            conversations: RwLock::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Append a message stamped with the current time. Returns its ID.
    pub async fn append(
        &self,
        conversation_id: &ConversationId,
        speaker: Speaker,
        text: impl Into<String>,
    ) -> String {
        self.append_at(conversation_id, speaker, text, Utc::now()).await
    }

    /// Append a message with an explicit creation time.
    pub async fn append_at(
        &self,
        conversation_id: &ConversationId,
        speaker: Speaker,
        text: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        self.conversations
            .write()
            .await
            .entry(conversation_id.clone())
            .or_default()
            .push(HistoryMessage {
                id: id.clone(),
                text: text.into(),
                speaker,
                created_at,
            });
        id
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn count(&self, conversation_id: &ConversationId) -> usize {
        self.conversations
            .read()
            .await
            .get(conversation_id)
            .map_or(0, Vec::len)
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageHistory for InMemoryHistory {
    fn name(&self) -> &str { "in_memory" }

    async fn fetch_recent_messages(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<HistoryMessage>, HistoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(HistoryError::Unavailable("in-memory history disabled".into()));
        }

        let conversations = self.conversations.read().await;
        let Some(messages) = conversations.get(conversation_id) else {
            return Ok(Vec::new());
        };

        let mut recent: Vec<HistoryMessage> = messages.clone();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        recent.truncate(limit);
        debug!(conversation_id = %conversation_id, fetched = recent.len(), "Fetched history");
        Ok(recent)
    }
}
