//! Structured health status.

use chrono::{DateTime, Utc};
use serde::Serialize;
use solace_monitor::{HealthThresholds, ProviderStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Up,
    Down,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The thresholds a health verdict was reached against.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthCriteria {
    pub min_success_rate: f64,
    pub max_avg_response_ms: f64,
    pub max_error_rate: f64,
}

impl From<&HealthThresholds> for HealthCriteria {
    fn from(t: &HealthThresholds) -> Self {
        Self {
            min_success_rate: t.min_success_rate,
            max_avg_response_ms: t.max_avg_response_ms,
            max_error_rate: t.max_error_rate,
        }
    }
}

/// Point-in-time health of the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub provider: String,
    pub provider_healthy: bool,
    pub monitor_healthy: bool,
    pub criteria: HealthCriteria,
    pub global: ProviderStats,
    pub providers: Vec<ProviderStats>,
    pub cached_conversations: usize,
    pub checked_at: DateTime<Utc>,
}

impl HealthReport {
    pub fn is_up(&self) -> bool {
        self.status == HealthStatus::Up
    }
}
