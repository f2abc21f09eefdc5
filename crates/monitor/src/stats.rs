//! Cumulative call statistics for one provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters for one provider (or the global aggregate).
///
/// Rates are percentages. With no calls recorded the success rate is 100
/// and the error rate and mean latency are 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderStats {
    pub provider: String,
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub total_latency_ms: u64,
    /// `None` until the first call
    pub min_latency_ms: Option<u64>,
    pub max_latency_ms: u64,
    /// Running mean over successful calls
    pub average_quality: f64,
    pub last_updated: DateTime<Utc>,
}

impl ProviderStats {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            total_calls: 0,
            successful_calls: 0,
            failed_calls: 0,
            total_latency_ms: 0,
            min_latency_ms: None,
            max_latency_ms: 0,
            average_quality: 0.0,
            last_updated: Utc::now(),
        }
    }

    /// A missing quality score counts as 0 in the running mean.
    pub fn record_success(&mut self, latency_ms: u64, quality: Option<u8>) {
        self.total_calls += 1;
        self.successful_calls += 1;
        self.track_latency(latency_ms);

        let n = self.successful_calls as f64;
        let q = f64::from(quality.unwrap_or(0));
        self.average_quality = (self.average_quality * (n - 1.0) + q) / n;
    }

    pub fn record_failure(&mut self, latency_ms: u64) {
        self.total_calls += 1;
        self.failed_calls += 1;
        self.track_latency(latency_ms);
    }

    fn track_latency(&mut self, latency_ms: u64) {
        self.total_latency_ms = self.total_latency_ms.saturating_add(latency_ms);
        self.max_latency_ms = self.max_latency_ms.max(latency_ms);
        self.min_latency_ms = Some(self.min_latency_ms.map_or(latency_ms, |m| m.min(latency_ms)));
        self.last_updated = Utc::now();
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_calls == 0 {
            return 100.0;
        }
        self.successful_calls as f64 * 100.0 / self.total_calls as f64
    }

    pub fn error_rate(&self) -> f64 {
        if self.total_calls == 0 {
            return 0.0;
        }
        self.failed_calls as f64 * 100.0 / self.total_calls as f64
    }

    pub fn average_latency_ms(&self) -> f64 {
        if self.total_calls == 0 {
            return 0.0;
        }
        self.total_latency_ms as f64 / self.total_calls as f64
    }

    /// Zero every counter, keeping the provider name.
    pub fn reset(&mut self) {
        *self = Self::new(std::mem::take(&mut self.provider));
    }
}
