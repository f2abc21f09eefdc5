//! Thread-safe service monitor: records calls per provider, serves
//! rates and health verdicts.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use solace_config::MonitorConfig;
use solace_core::message::{Reply, ReplyRequest};
use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::stats::ProviderStats;

/// Name of the aggregate across all providers.
pub const GLOBAL: &str = "GLOBAL";

/// Provider name used when a call cannot be attributed.
pub const UNKNOWN_PROVIDER: &str = "UNKNOWN";

/// Health limits. Rates are percentages.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthThresholds {
    pub min_success_rate: f64,
    pub max_avg_response_ms: f64,
    pub max_error_rate: f64,
    /// Nominal window passed to the rate queries
    pub window_minutes: u64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self::from(&MonitorConfig::default())
    }
}

impl From<&MonitorConfig> for HealthThresholds {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            min_success_rate: config.min_success_rate,
            max_avg_response_ms: config.max_avg_response_ms,
            max_error_rate: config.max_error_rate,
            window_minutes: config.window_minutes,
        }
    }
}

/// The service monitor.
///
/// Provider counters live in a sharded map so that concurrent calls for
/// different providers do not contend; the global aggregate sits behind its
/// own mutex. Statistics are cumulative since creation or the last reset.
pub struct ServiceMonitor {
    providers: DashMap<String, ProviderStats>,
    global: Mutex<ProviderStats>,
    thresholds: HealthThresholds,
}

impl ServiceMonitor {
    pub fn new(thresholds: HealthThresholds) -> Self {
        Self {
            providers: DashMap::new(),
            global: Mutex::new(ProviderStats::new(GLOBAL)),
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &HealthThresholds {
        &self.thresholds
    }

    fn global(&self) -> MutexGuard<'_, ProviderStats> {
        self.global.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ── Recording ─────────────────────────────────────────────────────

    /// Record a call that produced a reply, successful or not.
    pub fn record_call(&self, request: &ReplyRequest, reply: &Reply, latency_ms: u64) {
        let provider = if reply.provider_name.is_empty() {
            UNKNOWN_PROVIDER
        } else {
            reply.provider_name.as_str()
        };

        {
            let mut stats = self
                .providers
                .entry(provider.to_string())
                .or_insert_with(|| ProviderStats::new(provider));
            if reply.succeeded {
                stats.record_success(latency_ms, reply.quality_score);
            } else {
                stats.record_failure(latency_ms);
            }
        }

        {
            let mut global = self.global();
            if reply.succeeded {
                global.record_success(latency_ms, reply.quality_score);
            } else {
                global.record_failure(latency_ms);
            }
        }

        debug!(
            provider,
            conversation_id = ?request.conversation_id.as_ref().map(|c| c.as_str()),
            succeeded = reply.succeeded,
            quality = ?reply.quality_score,
            latency_ms,
            "Recorded call"
        );
    }

    /// Record a failure for which no reply exists, attributed to `UNKNOWN`.
    pub fn record_error(&self, request: &ReplyRequest, error: &str, latency_ms: u64) {
        debug!(
            conversation_id = ?request.conversation_id.as_ref().map(|c| c.as_str()),
            "Recording unattributed error"
        );
        self.record_provider_error(None, error, latency_ms);
    }

    /// Record a failure for which no reply exists.
    pub fn record_provider_error(&self, provider: Option<&str>, error: &str, latency_ms: u64) {
        let provider = provider.filter(|p| !p.is_empty()).unwrap_or(UNKNOWN_PROVIDER);

        self.providers
            .entry(provider.to_string())
            .or_insert_with(|| ProviderStats::new(provider))
            .record_failure(latency_ms);
        self.global().record_failure(latency_ms);

        warn!(provider, error, latency_ms, "Recorded provider error");
    }

    // ── Queries ───────────────────────────────────────────────────────

    /// Snapshot for `provider`, or the global aggregate for `None`.
    /// Unknown providers yield empty statistics.
    pub fn stats(&self, provider: Option<&str>) -> ProviderStats {
        match provider {
            None => self.global().clone(),
            Some(name) => self
                .providers
                .get(name)
                .map(|s| s.value().clone())
                .unwrap_or_else(|| ProviderStats::new(name)),
        }
    }

    /// Snapshots of every named provider, sorted by name.
    pub fn all_stats(&self) -> Vec<ProviderStats> {
        let mut all: Vec<ProviderStats> = self.providers.iter().map(|s| s.value().clone()).collect();
        all.sort_by(|a, b| a.provider.cmp(&b.provider));
        all
    }

    /// Success rate in percent.
    ///
    /// `_window_minutes` is accepted for interface stability; statistics are
    /// cumulative.
    pub fn success_rate(&self, provider: Option<&str>, _window_minutes: u64) -> f64 {
        self.stats(provider).success_rate()
    }

    /// Mean latency in milliseconds.
    pub fn average_response_time(&self, provider: Option<&str>, _window_minutes: u64) -> f64 {
        self.stats(provider).average_latency_ms()
    }

    /// Error rate in percent.
    pub fn error_rate(&self, provider: Option<&str>, _window_minutes: u64) -> f64 {
        self.stats(provider).error_rate()
    }

    /// All three thresholds hold for `provider` (or globally for `None`).
    pub fn is_healthy(&self, provider: Option<&str>) -> bool {
        let stats = self.stats(provider);
        self.verdict(&stats)
    }

    fn verdict(&self, stats: &ProviderStats) -> bool {
        let t = &self.thresholds;
        let healthy = stats.success_rate() >= t.min_success_rate
            && stats.average_latency_ms() <= t.max_avg_response_ms
            && stats.error_rate() <= t.max_error_rate;

        if !healthy {
            warn!(
                provider = %stats.provider,
                success_rate = stats.success_rate(),
                avg_latency_ms = stats.average_latency_ms(),
                error_rate = stats.error_rate(),
                "Provider unhealthy"
            );
        }
        healthy
    }

    /// One line per aggregate: verdict, success rate, mean latency, error rate.
    pub fn health_summary(&self) -> String {
        let mut summary = String::from("Service Health Summary:\n");

        let global = self.stats(None);
        let _ = writeln!(summary, "Global: {}", self.describe(&global));
        for stats in self.all_stats() {
            let _ = writeln!(summary, "{}: {}", stats.provider, self.describe(&stats));
        }

        summary
    }

    fn describe(&self, stats: &ProviderStats) -> String {
        format!(
            "{} (Success Rate: {:.2}%, Avg Response: {:.0}ms, Error Rate: {:.2}%)",
            if self.verdict(stats) { "HEALTHY" } else { "UNHEALTHY" },
            stats.success_rate(),
            stats.average_latency_ms(),
            stats.error_rate()
        )
    }

    // ── Maintenance ───────────────────────────────────────────────────

    /// Zero `provider`'s counters, or the global aggregate for `None`.
    pub fn reset_stats(&self, provider: Option<&str>) {
        match provider {
            None => {
                self.global().reset();
                info!("Reset global statistics");
            }
            Some(name) => match self.providers.get_mut(name) {
                Some(mut stats) => {
                    stats.reset();
                    info!(provider = name, "Reset provider statistics");
                }
                None => warn!(provider = name, "No statistics to reset"),
            },
        }
    }

    /// Drop providers with no calls that have been idle for `max_idle`.
    /// The global aggregate is never dropped. Returns how many were removed.
    pub fn cleanup_stale(&self, max_idle: Duration) -> usize {
        self.cleanup_stale_at(Utc::now(), max_idle)
    }

    pub fn cleanup_stale_at(&self, now: DateTime<Utc>, max_idle: Duration) -> usize {
        let before = self.providers.len();
        self.providers
            .retain(|_, stats| !(stats.total_calls == 0 && now - stats.last_updated > max_idle));
        let removed = before.saturating_sub(self.providers.len());
        if removed > 0 {
            info!(removed, "Cleaned up stale provider statistics");
        }
        removed
    }
}

impl Default for ServiceMonitor {
    fn default() -> Self {
        Self::new(HealthThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solace_core::message::ReplyCategory;
    use solace_core::provider::ProviderKind;

    fn request() -> ReplyRequest {
        ReplyRequest::new("u1", "c1", "你好")
    }

    fn ok(provider: &str, quality: u8) -> Reply {
        let mut reply = Reply::success("hi", ReplyCategory::EmotionalSupport, provider, ProviderKind::Template);
        reply.quality_score = Some(quality);
        reply
    }

    fn failed(provider: &str) -> Reply {
        Reply::failure("boom", provider, ProviderKind::Live)
    }

    #[test]
    fn records_provider_and_global() {
        let monitor = ServiceMonitor::default();
        monitor.record_call(&request(), &ok("template", 80), 100);
        monitor.record_call(&request(), &failed("deepseek"), 300);

        let template = monitor.stats(Some("template"));
        assert_eq!(template.total_calls, 1);
        assert_eq!(template.average_quality, 80.0);

        let global = monitor.stats(None);
        assert_eq!(global.total_calls, 2);
        assert_eq!(global.failed_calls, 1);
        assert_eq!(monitor.success_rate(None, 60), 50.0);
        assert_eq!(monitor.error_rate(Some("deepseek"), 60), 100.0);
        assert_eq!(monitor.average_response_time(None, 60), 200.0);
    }

    #[test]
    fn empty_provider_name_is_unknown() {
        let monitor = ServiceMonitor::default();
        monitor.record_call(&request(), &failed(""), 10);
        assert_eq!(monitor.stats(Some(UNKNOWN_PROVIDER)).failed_calls, 1);
    }

    #[test]
    fn record_error_without_reply() {
        let monitor = ServiceMonitor::default();
        monitor.record_error(&request(), "connection reset", 40);
        monitor.record_provider_error(Some("deepseek"), "timeout", 30_000);

        assert_eq!(monitor.stats(Some(UNKNOWN_PROVIDER)).failed_calls, 1);
        assert_eq!(monitor.stats(Some("deepseek")).failed_calls, 1);
        assert_eq!(monitor.stats(None).total_calls, 2);
    }

    #[test]
    fn unseen_provider_is_vacuously_healthy() {
        let monitor = ServiceMonitor::default();
        assert!(monitor.is_healthy(Some("X")));
        assert_eq!(monitor.success_rate(Some("X"), 60), 100.0);
        assert_eq!(monitor.error_rate(Some("X"), 60), 0.0);
        assert!(monitor.is_healthy(None));
    }

    #[test]
    fn health_thresholds_apply() {
        let monitor = ServiceMonitor::default();
        for _ in 0..8 {
            monitor.record_call(&request(), &ok("p", 70), 100);
        }
        for _ in 0..2 {
            monitor.record_call(&request(), &failed("p"), 100);
        }
        // 80% success, 20% errors: both on the boundary
        assert!(monitor.is_healthy(Some("p")));

        monitor.record_call(&request(), &failed("p"), 100);
        assert!(!monitor.is_healthy(Some("p")));
    }

    #[test]
    fn slow_provider_is_unhealthy() {
        let monitor = ServiceMonitor::default();
        monitor.record_call(&request(), &ok("slow", 90), 6_000);
        assert!(!monitor.is_healthy(Some("slow")));
    }

    #[test]
    fn reset_none_clears_only_global() {
        let monitor = ServiceMonitor::default();
        monitor.record_call(&request(), &ok("template", 90), 100);

        monitor.reset_stats(None);
        assert_eq!(monitor.stats(None).total_calls, 0);
        assert_eq!(monitor.stats(Some("template")).total_calls, 1);

        monitor.reset_stats(Some("template"));
        assert_eq!(monitor.stats(Some("template")).total_calls, 0);

        // unknown provider: no-op
        monitor.reset_stats(Some("nobody"));
        assert!(monitor.all_stats().iter().all(|s| s.provider != "nobody"));
    }

    #[test]
    fn cleanup_drops_only_idle_empty_providers() {
        let monitor = ServiceMonitor::default();
        monitor.record_call(&request(), &ok("busy", 90), 100);
        monitor.record_call(&request(), &ok("idle", 90), 100);
        monitor.reset_stats(Some("idle"));

        let later = Utc::now() + Duration::hours(25);
        assert_eq!(monitor.cleanup_stale_at(later, Duration::hours(24)), 1);

        let names: Vec<String> = monitor.all_stats().into_iter().map(|s| s.provider).collect();
        assert_eq!(names, vec!["busy".to_string()]);
        assert_eq!(monitor.cleanup_stale(Duration::hours(24)), 0);
    }

    #[test]
    fn summary_lists_global_then_providers() {
        let monitor = ServiceMonitor::default();
        monitor.record_call(&request(), &ok("template", 90), 120);
        monitor.record_call(&request(), &failed("deepseek"), 80);

        let summary = monitor.health_summary();
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], "Service Health Summary:");
        assert_eq!(
            lines[1],
            "Global: UNHEALTHY (Success Rate: 50.00%, Avg Response: 100ms, Error Rate: 50.00%)"
        );
        assert!(lines[2].starts_with("deepseek: UNHEALTHY"));
        assert_eq!(
            lines[3],
            "template: HEALTHY (Success Rate: 100.00%, Avg Response: 120ms, Error Rate: 0.00%)"
        );
    }

    #[test]
    fn snapshots_serialize() {
        let monitor = ServiceMonitor::default();
        monitor.record_call(&request(), &ok("template", 90), 120);
        let json = serde_json::to_value(monitor.stats(Some("template"))).unwrap();
        assert_eq!(json["successful_calls"], 1);
    }
}
