//! Configuration loading, validation, and management for Solace.
//!
//! Loads configuration from `~/.solace/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Provider identifiers accepted in `provider`.
pub const KNOWN_PROVIDERS: &[&str] = &["template", "deepseek", "openai-compatible"];

/// One week.
pub const MAX_CACHE_TTL_MINUTES: u64 = 7 * 24 * 60;
/// One year.
pub const MAX_STALE_AFTER_HOURS: u64 = 365 * 24;
/// One week.
pub const MAX_MAINTENANCE_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

/// The root configuration structure.
///
/// Maps directly to `~/.solace/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Which reply provider to use (one of [`KNOWN_PROVIDERS`])
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Upper bound on a single provider call, enforced by the orchestrator
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub context: ContextConfig,

    #[serde(default)]
    pub quality: QualityConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub fallback: FallbackConfig,

    /// Template provider settings
    #[serde(default)]
    pub template: TemplateConfig,

    /// OpenAI-compatible provider settings
    #[serde(default)]
    pub live: LiveConfig,

    /// Periodic maintenance schedule
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
}

fn default_provider() -> String {
    "template".into()
}
fn default_request_timeout_ms() -> u64 {
    35_000
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Maximum cached entries per conversation
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Cache lifetime after the last write
    #[serde(default = "default_cache_ttl_minutes")]
    pub cache_ttl_minutes: u64,

    #[serde(default = "default_true")]
    pub summary_enabled: bool,
}

fn default_window_size() -> usize {
    10
}
fn default_cache_ttl_minutes() -> u64 {
    30
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            cache_ttl_minutes: default_cache_ttl_minutes(),
            summary_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Replies scoring below this are replaced when fallback is enabled
    #[serde(default = "default_min_score")]
    pub min_score: u8,
}

fn default_min_score() -> u8 {
    60
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_score: default_min_score(),
        }
    }
}

/// Health thresholds for the service monitor. Rates are percentages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_min_success_rate")]
    pub min_success_rate: f64,

    #[serde(default = "default_max_avg_response_ms")]
    pub max_avg_response_ms: f64,

    #[serde(default = "default_max_error_rate")]
    pub max_error_rate: f64,

    /// Nominal window for health checks; statistics are cumulative
    #[serde(default = "default_window_minutes")]
    pub window_minutes: u64,

    /// Idle providers with no calls are dropped after this long
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: u64,
}

fn default_min_success_rate() -> f64 {
    80.0
}
fn default_max_avg_response_ms() -> f64 {
    5000.0
}
fn default_max_error_rate() -> f64 {
    20.0
}
fn default_window_minutes() -> u64 {
    60
}
fn default_stale_after_hours() -> u64 {
    24
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            min_success_rate: default_min_success_rate(),
            max_avg_response_ms: default_max_avg_response_ms(),
            max_error_rate: default_max_error_rate(),
            window_minutes: default_window_minutes(),
            stale_after_hours: default_stale_after_hours(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Substitute reply text; blank means the built-in message
    #[serde(default = "default_fallback_message")]
    pub default_message: String,

    /// Reserved for a future circuit breaker; not consulted
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Reserved for a future circuit breaker; not consulted
    #[serde(default = "default_recovery_time_seconds")]
    pub recovery_time_seconds: u64,
}

fn default_fallback_message() -> String {
    "抱歉，我现在无法为您提供最佳回复。请稍后重试，或联系专业心理咨询师获得帮助。".into()
}
fn default_failure_threshold() -> u32 {
    5
}
fn default_recovery_time_seconds() -> u64 {
    60
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_message: default_fallback_message(),
            failure_threshold: default_failure_threshold(),
            recovery_time_seconds: default_recovery_time_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Reported as the template provider's health
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_min_latency_ms")]
    pub min_latency_ms: u64,

    #[serde(default = "default_max_latency_ms")]
    pub max_latency_ms: u64,
}

fn default_min_latency_ms() -> u64 {
    500
}
fn default_max_latency_ms() -> u64 {
    2000
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_latency_ms: default_min_latency_ms(),
            max_latency_ms: default_max_latency_ms(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Provider name reported in replies and statistics
    #[serde(default = "default_live_name")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// HTTP client timeout
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Overrides the built-in system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_live_name() -> String {
    "deepseek".into()
}
fn default_api_base() -> String {
    "https://api.deepseek.com".into()
}
fn default_model() -> String {
    "deepseek-chat".into()
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_temperature() -> f32 {
    0.7
}
fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            name: default_live_name(),
            api_key: None,
            api_base: default_api_base(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_ms: default_timeout_ms(),
            system_prompt: None,
        }
    }
}

impl std::fmt::Debug for LiveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveConfig")
            .field("name", &self.name)
            .field("api_key", &redact(&self.api_key))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_ms", &self.timeout_ms)
            .field("system_prompt", &self.system_prompt.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,

    #[serde(default = "default_summary_interval_secs")]
    pub summary_interval_secs: u64,

    #[serde(default = "default_health_check_interval_secs")]
    pub health_check_interval_secs: u64,
}

fn default_cleanup_interval_secs() -> u64 {
    3600
}
fn default_summary_interval_secs() -> u64 {
    1800
}
fn default_health_check_interval_secs() -> u64 {
    300
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cleanup_interval_secs: default_cleanup_interval_secs(),
            summary_interval_secs: default_summary_interval_secs(),
            health_check_interval_secs: default_health_check_interval_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.solace/config.toml).
    ///
    /// Environment overrides:
    /// - `SOLACE_API_KEY`, then `DEEPSEEK_API_KEY` (only when no key is configured)
    /// - `SOLACE_PROVIDER`
    /// - `SOLACE_MODEL`
    /// - `SOLACE_API_BASE`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.live.api_key.is_none() {
            config.live.api_key = std::env::var("SOLACE_API_KEY")
                .ok()
                .or_else(|| std::env::var("DEEPSEEK_API_KEY").ok());
        }

        if let Ok(provider) = std::env::var("SOLACE_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("SOLACE_MODEL") {
            config.live.model = model;
        }

        if let Ok(base) = std::env::var("SOLACE_API_BASE") {
            config.live.api_base = base;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".solace")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(ConfigError::UnknownProvider(self.provider.clone()));
        }

        if self.context.window_size == 0 {
            return Err(ConfigError::ValidationError(
                "context.window_size must be > 0".into(),
            ));
        }

        if self.quality.min_score > 100 {
            return Err(ConfigError::ValidationError(
                "quality.min_score must be between 0 and 100".into(),
            ));
        }

        for (name, rate) in [
            ("monitor.min_success_rate", self.monitor.min_success_rate),
            ("monitor.max_error_rate", self.monitor.max_error_rate),
        ] {
            if !(0.0..=100.0).contains(&rate) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be a percentage between 0 and 100"
                )));
            }
        }

        if self.template.min_latency_ms > self.template.max_latency_ms {
            return Err(ConfigError::ValidationError(
                "template.min_latency_ms must not exceed template.max_latency_ms".into(),
            ));
        }

        if self.live.temperature < 0.0 || self.live.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "live.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.request_timeout_ms == 0 || self.live.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be > 0".into(),
            ));
        }

        if !(1..=MAX_CACHE_TTL_MINUTES).contains(&self.context.cache_ttl_minutes) {
            return Err(ConfigError::ValidationError(format!(
                "context.cache_ttl_minutes must be between 1 and {MAX_CACHE_TTL_MINUTES}"
            )));
        }

        if !(1..=MAX_STALE_AFTER_HOURS).contains(&self.monitor.stale_after_hours) {
            return Err(ConfigError::ValidationError(format!(
                "monitor.stale_after_hours must be between 1 and {MAX_STALE_AFTER_HOURS}"
            )));
        }

        for (name, secs) in [
            ("maintenance.cleanup_interval_secs", self.maintenance.cleanup_interval_secs),
            ("maintenance.summary_interval_secs", self.maintenance.summary_interval_secs),
            ("maintenance.health_check_interval_secs", self.maintenance.health_check_interval_secs),
        ] {
            if !(1..=MAX_MAINTENANCE_INTERVAL_SECS).contains(&secs) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be between 1 and {MAX_MAINTENANCE_INTERVAL_SECS}"
                )));
            }
        }

        Ok(())
    }

    /// Check if an API key is available for the live provider.
    pub fn has_api_key(&self) -> bool {
        self.live
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            request_timeout_ms: default_request_timeout_ms(),
            context: ContextConfig::default(),
            quality: QualityConfig::default(),
            monitor: MonitorConfig::default(),
            fallback: FallbackConfig::default(),
            template: TemplateConfig::default(),
            live: LiveConfig::default(),
            maintenance: MaintenanceConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Unknown provider '{0}' (expected one of: template, deepseek, openai-compatible)")]
    UnknownProvider(String),
}
