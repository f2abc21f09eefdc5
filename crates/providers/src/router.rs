//! Provider selection: builds the configured reply provider at startup.

use std::str::FromStr;
use std::sync::Arc;

use solace_config::{AppConfig, ConfigError};
use solace_core::provider::Provider;
use tracing::info;

use crate::openai_compat::OpenAiCompatProvider;
use crate::template::TemplateProvider;

/// The provider identifiers accepted by the `provider` config key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderId {
    Template,
    DeepSeek,
    OpenAiCompatible,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::DeepSeek => "deepseek",
            Self::OpenAiCompatible => "openai-compatible",
        }
    }

    /// Whether this provider calls a remote API.
    pub fn is_live(&self) -> bool {
        !matches!(self, Self::Template)
    }
}

impl FromStr for ProviderId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "template" => Ok(Self::Template),
            "deepseek" => Ok(Self::DeepSeek),
            "openai-compatible" | "openai_compatible" | "openai" => Ok(Self::OpenAiCompatible),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the provider named by `config.provider`.
///
/// Live providers are built even without an API key; they then report
/// unhealthy and fail each call, which the orchestrator turns into a
/// fallback reply.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ConfigError> {
    let id: ProviderId = config.provider.parse()?;

    let provider: Arc<dyn Provider> = match id {
        ProviderId::Template => Arc::new(TemplateProvider::new(&config.template)),
        ProviderId::DeepSeek | ProviderId::OpenAiCompatible => Arc::new(
            OpenAiCompatProvider::new(&config.live)
                .map_err(|e| ConfigError::ValidationError(e.to_string()))?,
        ),
    };

    info!(
        provider = %provider.name(),
        kind = %provider.kind(),
        healthy = provider.is_healthy(),
        "Reply provider ready"
    );
    Ok(provider)
}
