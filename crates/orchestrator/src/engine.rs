//! The orchestrator: one reply request, end to end.

use std::sync::Arc;
use std::time::{Duration, Instant};

use solace_config::{AppConfig, ConfigError};
use solace_context::ContextStore;
use solace_core::error::{ProviderError, ValidationError};
use solace_core::history::MessageHistory;
use solace_core::message::{ContextEntry, ConversationId, Reply, ReplyRequest};
use solace_core::provider::{Provider, ProviderKind};
use solace_monitor::{HealthThresholds, ProviderStats, ServiceMonitor};
use solace_quality::{QualityAssessor, is_passing};
use tracing::{debug, error, info, warn};

use crate::health::{HealthCriteria, HealthReport, HealthStatus};

/// Coordinates context, generation, quality and monitoring for each request.
///
/// The context store and monitor are shared (`Arc`) so that background
/// maintenance can work on the same instances.
pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    context: Arc<ContextStore>,
    monitor: Arc<ServiceMonitor>,
    assessor: QualityAssessor,
    quality_enabled: bool,
    min_quality_score: u8,
    fallback_enabled: bool,
    fallback_message: String,
    request_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        context: Arc<ContextStore>,
        monitor: Arc<ServiceMonitor>,
        assessor: QualityAssessor,
        config: &AppConfig,
    ) -> Self {
        Self {
            provider,
            context,
            monitor,
            assessor,
            quality_enabled: config.quality.enabled,
            min_quality_score: config.quality.min_score,
            fallback_enabled: config.fallback.enabled,
            fallback_message: config.fallback.default_message.clone(),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        }
    }

    /// Wire up the configured provider, a fresh context store over `history`
    /// and a fresh monitor.
    pub fn from_config(
        config: &AppConfig,
        history: Arc<dyn MessageHistory>,
    ) -> Result<Self, ConfigError> {
        let provider = solace_providers::build_from_config(config)?;
        let context = Arc::new(ContextStore::new(history, &config.context));
        let monitor = Arc::new(ServiceMonitor::new(HealthThresholds::from(&config.monitor)));
        Ok(Self::new(provider, context, monitor, QualityAssessor::new(), config))
    }

    // ── Pipeline ──────────────────────────────────────────────────────

    /// Produce a reply for `request`.
    ///
    /// Only an invalid request is an error. Provider failures, timeouts and
    /// low-quality replies become the fallback reply when fallback is
    /// enabled, or a failed [`Reply`] otherwise. Every valid request is
    /// recorded with the monitor exactly once.
    pub async fn process_request(&self, mut request: ReplyRequest) -> Result<Reply, ValidationError> {
        let started = Instant::now();
        let conversation_id = validate(&request)?;

        request.context = self
            .context
            .get_context(&conversation_id, self.context.window_size())
            .await;

        debug!(
            conversation_id = %conversation_id,
            provider = %self.provider.name(),
            context = request.context.len(),
            "Processing reply request"
        );

        let mut reply = match self.generate(&request).await {
            Ok(reply) if reply.succeeded => reply,
            Ok(reply) => {
                let reason = reply
                    .failure_reason
                    .unwrap_or_else(|| "provider returned a failed reply".into());
                error!(
                    conversation_id = %conversation_id,
                    provider = %reply.provider_name,
                    reason = %reason,
                    "Provider reported failure"
                );
                self.recover(&reason, "PROVIDER_FAILURE")
            }
            Err(e) => {
                error!(
                    conversation_id = %conversation_id,
                    provider = %e.provider(),
                    code = e.code(),
                    error = %e,
                    "Provider call failed"
                );
                self.recover(&e.to_string(), e.code())
            }
        };

        if reply.succeeded && reply.provider_kind != ProviderKind::Fallback && self.quality_enabled {
            let score = self.assessor.assess(&request, &mut reply);
            if !is_passing(score, self.min_quality_score) && self.fallback_enabled {
                warn!(
                    conversation_id = %conversation_id,
                    provider = %reply.provider_name,
                    score,
                    min_score = self.min_quality_score,
                    "Reply below quality threshold, using fallback"
                );
                reply = self.fallback("LOW_QUALITY").with_metadata(
                    "rejected_quality_score",
                    serde_json::json!(score),
                );
            }
        }

        if reply.succeeded {
            self.context.add_message(
                &conversation_id,
                ContextEntry::user(request.user_text.as_str()).at(request.timestamp),
            );
            self.context
                .add_message(&conversation_id, ContextEntry::ai(reply.text.as_str()));
        }

        let latency_ms = started.elapsed().as_millis() as u64;
        reply.latency_ms = latency_ms;
        self.monitor.record_call(&request, &reply, latency_ms);

        debug!(
            conversation_id = %conversation_id,
            provider = %reply.provider_name,
            succeeded = reply.succeeded,
            quality = ?reply.quality_score,
            latency_ms,
            "Reply ready"
        );

        Ok(reply)
    }

    async fn generate(&self, request: &ReplyRequest) -> Result<Reply, ProviderError> {
        match tokio::time::timeout(self.request_timeout, self.provider.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                provider: self.provider.name().to_string(),
                timeout_ms: self.request_timeout.as_millis() as u64,
            }),
        }
    }

    /// The reply to return when the provider produced nothing usable.
    fn recover(&self, reason: &str, code: &str) -> Reply {
        if self.fallback_enabled {
            self.fallback(code)
        } else {
            Reply::failure(reason, self.provider.name(), self.provider.kind())
        }
    }

    fn fallback(&self, cause: &str) -> Reply {
        info!(provider = %self.provider.name(), cause, "Substituting fallback reply");
        Reply::fallback(&self.fallback_message)
            .with_metadata("fallback_cause", serde_json::json!(cause))
            .with_metadata("original_provider", serde_json::json!(self.provider.name()))
    }

    // ── Health & diagnostics ──────────────────────────────────────────

    /// The provider is ready and the global statistics are within limits.
    pub fn is_healthy(&self) -> bool {
        self.provider.is_healthy() && self.monitor.is_healthy(None)
    }

    pub fn health_report(&self) -> HealthReport {
        let provider_healthy = self.provider.is_healthy();
        let monitor_healthy = self.monitor.is_healthy(None);
        let status = if provider_healthy && monitor_healthy {
            HealthStatus::Up
        } else {
            HealthStatus::Down
        };

        HealthReport {
            status,
            provider: self.provider.name().to_string(),
            provider_healthy,
            monitor_healthy,
            criteria: HealthCriteria::from(self.monitor.thresholds()),
            global: self.monitor.stats(None),
            providers: self.monitor.all_stats(),
            cached_conversations: self.context.conversation_count(),
            checked_at: chrono::Utc::now(),
        }
    }

    /// Provider configuration plus the orchestration settings.
    pub fn config_info(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut info = self.provider.describe_config();
        info.insert("provider_kind".into(), self.provider.kind().as_str().into());
        info.insert("quality_enabled".into(), self.quality_enabled.into());
        info.insert("min_quality_score".into(), self.min_quality_score.into());
        info.insert("fallback_enabled".into(), self.fallback_enabled.into());
        info.insert("context_window_size".into(), self.context.window_size().into());
        info.insert(
            "request_timeout_ms".into(),
            (self.request_timeout.as_millis() as u64).into(),
        );
        info
    }

    // ── Context & statistics passthroughs ─────────────────────────────

    pub fn clear_context(&self, conversation_id: &ConversationId) {
        self.context.clear_context(conversation_id);
    }

    pub async fn context_summary(&self, conversation_id: &ConversationId) -> String {
        self.context.summarize(conversation_id).await
    }

    /// Statistics for `provider`, or the global aggregate for `None`.
    pub fn service_stats(&self, provider: Option<&str>) -> ProviderStats {
        self.monitor.stats(provider)
    }

    pub fn all_service_stats(&self) -> Vec<ProviderStats> {
        self.monitor.all_stats()
    }

    pub fn reset_service_stats(&self, provider: Option<&str>) {
        self.monitor.reset_stats(provider);
    }

    // ── Accessors ─────────────────────────────────────────────────────

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn monitor(&self) -> &Arc<ServiceMonitor> {
        &self.monitor
    }

    pub fn context_store(&self) -> &Arc<ContextStore> {
        &self.context
    }
}

/// Check the required fields and return the conversation to work on.
fn validate(request: &ReplyRequest) -> Result<ConversationId, ValidationError> {
    if request
        .requester_id
        .as_deref()
        .is_none_or(|id| id.trim().is_empty())
    {
        return Err(ValidationError::MissingRequesterId);
    }

    let conversation_id = request
        .conversation_id
        .as_ref()
        .filter(|id| !id.as_str().trim().is_empty())
        .ok_or(ValidationError::MissingConversationId)?;

    if request.user_text.trim().is_empty() {
        return Err(ValidationError::BlankUserText);
    }

    Ok(conversation_id.clone())
}
