//! Request, reply and context domain types.
//!
//! These are the value objects that flow through the pipeline:
//! caller submits a [`ReplyRequest`] → context is attached → a provider
//! produces a [`Reply`] → the reply is scored and recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::provider::ProviderKind;

/// Provider name carried by substituted fallback replies.
pub const FALLBACK_PROVIDER: &str = "FALLBACK";

/// Quality score assigned to every fallback reply.
pub const FALLBACK_QUALITY_SCORE: u8 = 60;

/// Text used for fallback replies when no message is configured.
pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "抱歉，我现在无法为您提供最佳回复。请稍后重试，或联系专业心理咨询师获得帮助。";

/// Unique identifier for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who authored a piece of conversation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Speaker {
    User,
    Ai,
}

impl Speaker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Ai => "AI",
        }
    }
}

/// A weighted item in a conversation's cached context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Source message ID, when the entry came from persisted history
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,

    pub text: String,

    pub speaker: Speaker,

    pub timestamp: DateTime<Utc>,

    /// Importance weight, recomputed when the entry enters the cache
    #[serde(default)]
    pub importance_weight: f64,
}

impl ContextEntry {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            message_id: None,
            text: text.into(),
            speaker,
            timestamp: Utc::now(),
            importance_weight: 0.0,
        }
    }

    /// Create an entry for something the user said.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Speaker::User, text)
    }

    /// Create an entry for something the assistant replied.
    pub fn ai(text: impl Into<String>) -> Self {
        Self::new(Speaker::Ai, text)
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// One request for an AI reply.
///
/// `requester_id`, `conversation_id` and a non-blank `user_text` are required
/// by the orchestrator; they are optional here so that incomplete requests
/// can be represented and rejected with a precise validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,

    #[serde(default)]
    pub user_text: String,

    /// Free-form affect hint supplied by the caller (e.g. "负面")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_hint: Option<String>,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra_params: serde_json::Map<String, serde_json::Value>,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Context attached by the orchestrator, most important first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<ContextEntry>,
}

impl ReplyRequest {
    pub fn new(
        requester_id: impl Into<String>,
        conversation_id: impl Into<ConversationId>,
        user_text: impl Into<String>,
    ) -> Self {
        Self {
            requester_id: Some(requester_id.into()),
            conversation_id: Some(conversation_id.into()),
            user_text: user_text.into(),
            emotional_hint: None,
            extra_params: serde_json::Map::new(),
            timestamp: Utc::now(),
            context: Vec::new(),
        }
    }

    pub fn with_emotional_hint(mut self, hint: impl Into<String>) -> Self {
        self.emotional_hint = Some(hint.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra_params.insert(key.into(), value);
        self
    }
}

/// The kind of help a reply offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplyCategory {
    EmotionalSupport,
    CognitiveGuidance,
    BehavioralAdvice,
    InformationGathering,
    Fallback,
}

impl ReplyCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmotionalSupport => "EMOTIONAL_SUPPORT",
            Self::CognitiveGuidance => "COGNITIVE_GUIDANCE",
            Self::BehavioralAdvice => "BEHAVIORAL_ADVICE",
            Self::InformationGathering => "INFORMATION_GATHERING",
            Self::Fallback => "FALLBACK",
        }
    }
}

impl std::fmt::Display for ReplyCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated (or substituted) reply.
///
/// Build with [`Reply::success`], [`Reply::failure`] or [`Reply::fallback`]:
/// a reply with `succeeded == false` always carries a `failure_reason`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,

    /// 0..=100, set by the quality assessor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ReplyCategory>,

    pub succeeded: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    pub provider_name: String,

    pub provider_kind: ProviderKind,

    pub latency_ms: u64,

    /// Provider-specific metadata (token counts, model)
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,

    pub timestamp: DateTime<Utc>,
}

impl Reply {
    /// A successful reply from a provider.
    pub fn success(
        text: impl Into<String>,
        category: ReplyCategory,
        provider_name: impl Into<String>,
        provider_kind: ProviderKind,
    ) -> Self {
        Self {
            text: text.into(),
            quality_score: None,
            category: Some(category),
            succeeded: true,
            failure_reason: None,
            provider_name: provider_name.into(),
            provider_kind,
            latency_ms: 0,
            metadata: serde_json::Map::new(),
            timestamp: Utc::now(),
        }
    }

    /// A failed reply. The reason is always recorded.
    pub fn failure(
        reason: impl Into<String>,
        provider_name: impl Into<String>,
        provider_kind: ProviderKind,
    ) -> Self {
        Self {
            text: String::new(),
            quality_score: None,
            category: None,
            succeeded: false,
            failure_reason: Some(reason.into()),
            provider_name: provider_name.into(),
            provider_kind,
            latency_ms: 0,
            metadata: serde_json::Map::new(),
            timestamp: Utc::now(),
        }
    }

    /// The safe substitute reply. A blank message falls back to
    /// [`DEFAULT_FALLBACK_MESSAGE`].
    pub fn fallback(message: &str) -> Self {
        let text = if message.trim().is_empty() {
            DEFAULT_FALLBACK_MESSAGE
        } else {
            message
        };
        let mut reply = Self::success(
            text,
            ReplyCategory::Fallback,
            FALLBACK_PROVIDER,
            ProviderKind::Fallback,
        );
        reply.quality_score = Some(FALLBACK_QUALITY_SCORE);
        reply
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// True for a succeeded reply with non-empty text.
    pub fn has_content(&self) -> bool {
        self.succeeded && !self.text.is_empty()
    }
}
