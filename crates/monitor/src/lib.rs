//! Service health monitoring for Solace.
//!
//! Every provider call is recorded against the provider that served it and
//! against a global aggregate. Health verdicts compare success rate, error
//! rate and mean latency with configured thresholds.

pub mod engine;
pub mod stats;

pub use engine::{HealthThresholds, ServiceMonitor, GLOBAL, UNKNOWN_PROVIDER};
pub use stats::ProviderStats;
