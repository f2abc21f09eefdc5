//! Provider trait: the abstraction over reply-generation backends.
//!
//! A Provider turns a [`ReplyRequest`] (with its attached context) into a
//! [`Reply`]. The orchestrator calls it without knowing which backend is
//! configured.
//!
//! Implementations: template (canned replies) and OpenAI-compatible HTTP.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::{Reply, ReplyRequest};

/// Which family of backend produced a reply.
///
/// Quality scoring branches on this instead of on provider names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Canned templates, no network
    Template,
    /// A remote model behind an HTTP API
    Live,
    /// The orchestrator's substitute reply
    Fallback,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Live => "live",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The core Provider trait.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "template", "deepseek").
    fn name(&self) -> &str;

    fn kind(&self) -> ProviderKind;

    /// Generate a reply for the request.
    ///
    /// Implementations fill in `latency_ms` for the generation itself; the
    /// orchestrator overwrites it with the end-to-end time.
    async fn generate(&self, request: &ReplyRequest) -> Result<Reply, ProviderError>;

    /// Local readiness check. Never performs network I/O.
    fn is_healthy(&self) -> bool;

    /// Non-secret configuration, for diagnostics.
    fn describe_config(&self) -> serde_json::Map<String, serde_json::Value>;
}
