//! The per-conversation context cache.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use solace_config::{ContextConfig, MAX_CACHE_TTL_MINUTES};
use solace_core::history::MessageHistory;
use solace_core::message::{ContextEntry, ConversationId};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::summary::summarize_entries;
use crate::weight::{importance_weight, importance_weight_at};

struct CachedContext {
    /// Most important first
    entries: Vec<ContextEntry>,
    expires_at: Instant,
}

impl CachedContext {
    fn is_valid(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Importance-ordered context windows, keyed by conversation.
///
/// Reads fall through to [`MessageHistory`] when a conversation is absent
/// or expired. History failures degrade to an empty context.
pub struct ContextStore {
    cache: DashMap<ConversationId, CachedContext>,
    history: Arc<dyn MessageHistory>,
    window_size: usize,
    ttl: Duration,
    summary_enabled: bool,
}

impl ContextStore {
    pub fn new(history: Arc<dyn MessageHistory>, config: &ContextConfig) -> Self {
        Self {
            cache: DashMap::new(),
            history,
            window_size: config.window_size,
            ttl: Duration::from_secs(config.cache_ttl_minutes.min(MAX_CACHE_TTL_MINUTES) * 60),
            summary_enabled: config.summary_enabled,
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Up to `limit` entries, most important first.
    pub async fn get_context(&self, conversation_id: &ConversationId, limit: usize) -> Vec<ContextEntry> {
        let cached = self.cache.get(conversation_id).and_then(|slot| {
            slot.is_valid(Instant::now())
                .then(|| slot.entries.iter().take(limit).cloned().collect::<Vec<_>>())
        });
        if let Some(entries) = cached {
            debug!(conversation_id = %conversation_id, entries = entries.len(), "Context cache hit");
            return entries;
        }

        let messages = match self.history.fetch_recent_messages(conversation_id, limit).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!(
                    conversation_id = %conversation_id,
                    history = self.history.name(),
                    error = %e,
                    "Failed to load context from history"
                );
                return Vec::new();
            }
        };

        let now = chrono::Utc::now();
        let mut entries: Vec<ContextEntry> = messages
            .into_iter()
            .map(|msg| {
                let mut entry = ContextEntry::from(msg);
                entry.importance_weight = importance_weight_at(&entry, now);
                entry
            })
            .collect();
        entries.sort_by(|a, b| b.importance_weight.total_cmp(&a.importance_weight));
        entries.truncate(limit);

        debug!(conversation_id = %conversation_id, entries = entries.len(), "Context loaded from history");

        // `add_message` may have filled the slot while the fetch was pending.
        let now = Instant::now();
        match self.cache.entry(conversation_id.clone()) {
            Entry::Occupied(slot) if slot.get().is_valid(now) => {
                debug!(conversation_id = %conversation_id, "Keeping context written during history fetch");
                slot.get().entries.iter().take(limit).cloned().collect()
            }
            Entry::Occupied(mut slot) => {
                slot.insert(CachedContext {
                    entries: entries.clone(),
                    expires_at: now + self.ttl,
                });
                entries
            }
            Entry::Vacant(slot) => {
                slot.insert(CachedContext {
                    entries: entries.clone(),
                    expires_at: now + self.ttl,
                });
                entries
            }
        }
    }

    /// Weight `entry`, put it at the front of the window and refresh the
    /// expiry. Entries beyond the window size are dropped from the tail.
    pub fn add_message(&self, conversation_id: &ConversationId, mut entry: ContextEntry) {
        entry.importance_weight = importance_weight(&entry);
        let expires_at = Instant::now() + self.ttl;

        let mut slot = self
            .cache
            .entry(conversation_id.clone())
            .or_insert_with(|| CachedContext {
                entries: Vec::new(),
                expires_at,
            });
        slot.entries.insert(0, entry);
        slot.entries.truncate(self.window_size);
        slot.expires_at = expires_at;
    }

    /// Forget everything cached for the conversation. Idempotent.
    pub fn clear_context(&self, conversation_id: &ConversationId) {
        self.cache.remove(conversation_id);
        debug!(conversation_id = %conversation_id, "Cleared context");
    }

    /// Summary of the current window, or an empty string when disabled.
    pub async fn summarize(&self, conversation_id: &ConversationId) -> String {
        if !self.summary_enabled {
            return String::new();
        }
        let entries = self.get_context(conversation_id, self.window_size).await;
        summarize_entries(&entries)
    }

    /// Number of cached entries, expired or not.
    pub fn context_size(&self, conversation_id: &ConversationId) -> usize {
        self.cache.get(conversation_id).map_or(0, |slot| slot.entries.len())
    }

    /// Number of conversations currently cached.
    pub fn conversation_count(&self) -> usize {
        self.cache.len()
    }

    /// Drop every conversation whose cache entry has expired. Returns how
    /// many were dropped.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.cache.len();
        self.cache.retain(|_, slot| slot.is_valid(now));
        let evicted = before.saturating_sub(self.cache.len());
        if evicted > 0 {
            debug!(evicted, "Evicted expired conversation contexts");
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};
    use solace_core::error::HistoryError;
    use solace_core::history::HistoryMessage;
    use solace_core::message::Speaker;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    /// Serves a fixed message list and counts fetches.
    struct ScriptedHistory {
        messages: Vec<HistoryMessage>,
        fail: bool,
        fetches: Mutex<usize>,
    }

    impl ScriptedHistory {
        fn new(messages: Vec<HistoryMessage>) -> Self {
            Self { messages, fail: false, fetches: Mutex::new(0) }
        }

        fn failing() -> Self {
            Self { messages: Vec::new(), fail: true, fetches: Mutex::new(0) }
        }

        fn fetches(&self) -> usize {
            *self.fetches.lock().unwrap()
        }
    }

    #[async_trait]
    impl MessageHistory for ScriptedHistory {
        fn name(&self) -> &str { "scripted" }

        async fn fetch_recent_messages(
            &self,
            _conversation_id: &ConversationId,
            limit: usize,
        ) -> Result<Vec<HistoryMessage>, HistoryError> {
            *self.fetches.lock().unwrap() += 1;
            if self.fail {
                return Err(HistoryError::Unavailable("db down".into()));
            }
            Ok(self.messages.iter().take(limit).cloned().collect())
        }
    }

    /// Holds every fetch until released.
    struct GatedHistory {
        entered: Notify,
        release: Notify,
        messages: Vec<HistoryMessage>,
    }

    #[async_trait]
    impl MessageHistory for GatedHistory {
        fn name(&self) -> &str { "gated" }

        async fn fetch_recent_messages(
            &self,
            _conversation_id: &ConversationId,
            limit: usize,
        ) -> Result<Vec<HistoryMessage>, HistoryError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(self.messages.iter().take(limit).cloned().collect())
        }
    }

    fn msg(id: &str, speaker: Speaker, text: &str, minutes_ago: i64) -> HistoryMessage {
        HistoryMessage {
            id: id.into(),
            text: text.into(),
            speaker,
            created_at: Utc::now() - ChronoDuration::minutes(minutes_ago),
        }
    }

    fn sample_history() -> Vec<HistoryMessage> {
        vec![
            msg("m5", Speaker::Ai, "嗯", 1),
            msg("m4", Speaker::User, "最近工作压力很大，晚上总是睡不着，感觉很焦虑，也不知道该和谁说", 2),
            msg("m3", Speaker::Ai, "我在这里听你说。", 3),
            msg("m2", Speaker::User, "你好", 4),
            msg("m1", Speaker::Ai, "你好，有什么可以帮你的吗？", 5),
        ]
    }

    fn config(window_size: usize) -> ContextConfig {
        ContextConfig {
            window_size,
            cache_ttl_minutes: 30,
            summary_enabled: true,
        }
    }

    #[tokio::test]
    async fn context_respects_limit_and_weight_order() {
        let store = ContextStore::new(Arc::new(ScriptedHistory::new(sample_history())), &config(10));
        let id = ConversationId::from("c1");

        let entries = store.get_context(&id, 3).await;
        assert_eq!(entries.len(), 3);
        for pair in entries.windows(2) {
            assert!(pair[0].importance_weight >= pair[1].importance_weight);
        }
        // The long keyword-bearing user message dominates
        assert_eq!(entries[0].message_id.as_deref(), Some("m4"));
    }

    #[tokio::test]
    async fn cached_reads_are_idempotent() {
        let history = Arc::new(ScriptedHistory::new(sample_history()));
        let store = ContextStore::new(history.clone(), &config(10));
        let id = ConversationId::from("c1");

        let first = store.get_context(&id, 5).await;
        let second = store.get_context(&id, 5).await;

        let texts = |v: &[ContextEntry]| v.iter().map(|e| e.text.clone()).collect::<Vec<_>>();
        assert_eq!(texts(&first), texts(&second));
        assert_eq!(history.fetches(), 1);
    }

    #[tokio::test]
    async fn cached_read_truncates_to_smaller_limit() {
        let store = ContextStore::new(Arc::new(ScriptedHistory::new(sample_history())), &config(10));
        let id = ConversationId::from("c1");
        store.get_context(&id, 5).await;
        assert_eq!(store.get_context(&id, 2).await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_cache_reloads_from_history() {
        let history = Arc::new(ScriptedHistory::new(sample_history()));
        let store = ContextStore::new(history.clone(), &config(10));
        let id = ConversationId::from("c1");

        store.get_context(&id, 5).await;
        tokio::time::advance(Duration::from_secs(29 * 60)).await;
        store.get_context(&id, 5).await;
        assert_eq!(history.fetches(), 1);

        tokio::time::advance(Duration::from_secs(2 * 60)).await;
        store.get_context(&id, 5).await;
        assert_eq!(history.fetches(), 2);
    }

    #[tokio::test]
    async fn history_failure_yields_empty_context() {
        let store = ContextStore::new(Arc::new(ScriptedHistory::failing()), &config(10));
        let entries = store.get_context(&ConversationId::from("c1"), 5).await;
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn add_message_prepends_and_caps_window() {
        let store = ContextStore::new(Arc::new(ScriptedHistory::new(Vec::new())), &config(3));
        let id = ConversationId::from("c1");

        for i in 0..5 {
            store.add_message(&id, ContextEntry::user(format!("消息{i}")));
        }

        assert_eq!(store.context_size(&id), 3);
        let entries = store.get_context(&id, 10).await;
        assert_eq!(entries[0].text, "消息4");
        assert_eq!(entries[2].text, "消息2");
        assert!(entries.iter().all(|e| e.importance_weight >= 0.1));
    }

    #[tokio::test]
    async fn add_message_creates_valid_cache_entry() {
        let history = Arc::new(ScriptedHistory::new(sample_history()));
        let store = ContextStore::new(history.clone(), &config(10));
        let id = ConversationId::from("fresh");

        store.add_message(&id, ContextEntry::user("你好"));
        let entries = store.get_context(&id, 10).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(history.fetches(), 0);
    }

    #[tokio::test]
    async fn writes_during_history_fetch_survive_the_fill() {
        let history = Arc::new(GatedHistory {
            entered: Notify::new(),
            release: Notify::new(),
            messages: sample_history(),
        });
        let store = ContextStore::new(history.clone(), &config(10));
        let id = ConversationId::from("c1");

        let (loaded, ()) = tokio::join!(store.get_context(&id, 10), async {
            history.entered.notified().await;
            store.add_message(&id, ContextEntry::user("我最近很焦虑"));
            store.add_message(&id, ContextEntry::ai("我理解你的感受。"));
            assert_eq!(store.context_size(&id), 2);
            history.release.notify_one();
        });

        assert_eq!(store.context_size(&id), 2);
        let texts: Vec<&str> = loaded.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["我理解你的感受。", "我最近很焦虑"]);
    }

    #[tokio::test(start_paused = true)]
    async fn evict_expired_drops_only_stale_conversations() {
        let store = ContextStore::new(Arc::new(ScriptedHistory::new(Vec::new())), &config(10));
        store.add_message(&ConversationId::from("old"), ContextEntry::user("早先的消息"));
        tokio::time::advance(Duration::from_secs(20 * 60)).await;
        store.add_message(&ConversationId::from("new"), ContextEntry::user("刚刚的消息"));
        tokio::time::advance(Duration::from_secs(15 * 60)).await;

        assert_eq!(store.evict_expired(), 1);
        assert_eq!(store.conversation_count(), 1);
        assert_eq!(store.context_size(&ConversationId::from("new")), 1);
    }

    #[tokio::test]
    async fn oversized_ttl_is_capped() {
        let mut cfg = config(10);
        cfg.cache_ttl_minutes = u64::MAX;
        let store = ContextStore::new(Arc::new(ScriptedHistory::new(Vec::new())), &cfg);
        assert_eq!(store.ttl, Duration::from_secs(MAX_CACHE_TTL_MINUTES * 60));

        let id = ConversationId::from("c1");
        store.add_message(&id, ContextEntry::user("你好"));
        assert_eq!(store.get_context(&id, 10).await.len(), 1);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let store = ContextStore::new(Arc::new(ScriptedHistory::new(Vec::new())), &config(10));
        let id = ConversationId::from("c1");
        store.add_message(&id, ContextEntry::user("hi"));
        assert_eq!(store.conversation_count(), 1);

        store.clear_context(&id);
        store.clear_context(&id);
        assert_eq!(store.context_size(&id), 0);
        assert_eq!(store.conversation_count(), 0);
    }

    #[tokio::test]
    async fn summary_reflects_window() {
        let store = ContextStore::new(Arc::new(ScriptedHistory::new(Vec::new())), &config(10));
        let id = ConversationId::from("c1");
        assert_eq!(store.summarize(&id).await, crate::EMPTY_SUMMARY);

        store.add_message(&id, ContextEntry::user("我和父母关系紧张"));
        store.add_message(&id, ContextEntry::ai("听起来你很在意这段关系。"));
        let summary = store.summarize(&id).await;
        assert!(summary.contains("共 2 条消息（用户消息：1，AI回复：1）"));
        assert!(summary.contains("- 家庭关系"));
        assert!(summary.contains("- 焦虑情绪"));
    }

    #[tokio::test]
    async fn summary_disabled_is_empty() {
        let mut cfg = config(10);
        cfg.summary_enabled = false;
        let store = ContextStore::new(Arc::new(ScriptedHistory::new(sample_history())), &cfg);
        assert_eq!(store.summarize(&ConversationId::from("c1")).await, "");
    }
}
