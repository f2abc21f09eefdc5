//! No-op history: every conversation starts with an empty context.

use async_trait::async_trait;
use solace_core::error::HistoryError;
use solace_core::history::{HistoryMessage, MessageHistory};
use solace_core::message::ConversationId;

/// A history source that never returns anything.
pub struct NoopHistory;

#[async_trait]
impl MessageHistory for NoopHistory {
    fn name(&self) -> &str { "none" }

    async fn fetch_recent_messages(
        &self,
        _conversation_id: &ConversationId,
        _limit: usize,
    ) -> Result<Vec<HistoryMessage>, HistoryError> {
        Ok(Vec::new())
    }
}
