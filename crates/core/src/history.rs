//! Message history: the persisted conversation log, owned elsewhere.
//!
//! The context store reads from it on a cache miss. Nothing in this
//! workspace writes to it except the in-memory implementation used by
//! tests and the CLI.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HistoryError;
use crate::message::{ContextEntry, ConversationId, Speaker};

/// A message as stored by the history collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub id: String,
    pub text: String,
    pub speaker: Speaker,
    pub created_at: DateTime<Utc>,
}

impl From<HistoryMessage> for ContextEntry {
    fn from(msg: HistoryMessage) -> Self {
        ContextEntry {
            message_id: Some(msg.id),
            text: msg.text,
            speaker: msg.speaker,
            timestamp: msg.created_at,
            importance_weight: 0.0,
        }
    }
}

/// Read-only access to persisted conversation messages.
#[async_trait]
pub trait MessageHistory: Send + Sync {
    fn name(&self) -> &str;

    /// Up to `limit` of the most recent messages, newest first.
    async fn fetch_recent_messages(
        &self,
        conversation_id: &ConversationId,
        limit: usize,
    ) -> Result<Vec<HistoryMessage>, HistoryError>;
}
