//! OpenAI-compatible provider implementation.
//!
//! Talks to any endpoint exposing `/v1/chat/completions` (DeepSeek by
//! default). Conversation context is replayed as prior chat turns behind a
//! counseling system prompt.

use async_trait::async_trait;
use solace_config::LiveConfig;
use solace_core::error::ProviderError;
use solace_core::message::{ContextEntry, Reply, ReplyRequest, Speaker};
use solace_core::provider::{Provider, ProviderKind};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::classify::classify;

/// System prompt used when the config does not override it.
pub const DEFAULT_SYSTEM_PROMPT: &str = "你是一位专业、温暖的心理健康支持助手。\
请用共情、尊重和不评判的态度回应用户，先理解和确认对方的感受，再给出温和、具体、可行的建议。\
不要做医学诊断，不要开药，也不要使用绝对化的措辞。\
如果用户表达了伤害自己或他人的想法，请温和地鼓励其立即联系身边信任的人、专业心理咨询师或当地心理援助热线。\
回复使用简体中文，语气自然亲切，篇幅适中。";

/// An OpenAI-compatible chat provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout_ms: u64,
    system_prompt: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a provider from the `[live]` config section.
    ///
    /// A missing key is not an error here: the provider reports itself
    /// unhealthy and every `generate` fails with `MissingCredentials`.
    pub fn new(config: &LiveConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ProviderError::NotConfigured {
                provider: config.name.clone(),
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            name: config.name.clone(),
            base_url: config.api_base.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout_ms: config.timeout_ms,
            system_prompt: config
                .system_prompt
                .clone()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            client,
        })
    }

    /// System prompt, then prior turns in context order, then the user text.
    fn to_api_messages(&self, request: &ReplyRequest) -> Vec<ApiMessage> {
        let mut messages = Vec::with_capacity(request.context.len() + 2);
        messages.push(ApiMessage {
            role: "system".into(),
            content: self.system_prompt.clone(),
        });
        messages.extend(request.context.iter().map(Self::context_message));
        messages.push(ApiMessage {
            role: "user".into(),
            content: request.user_text.clone(),
        });
        messages
    }

    fn context_message(entry: &ContextEntry) -> ApiMessage {
        ApiMessage {
            role: match entry.speaker {
                Speaker::User => "user".into(),
                Speaker::Ai => "assistant".into(),
            },
            content: entry.text.clone(),
        }
    }

    fn invalid_response(&self, message: impl Into<String>) -> ProviderError {
        ProviderError::InvalidResponse {
            provider: self.name.clone(),
            message: message.into(),
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout {
                provider: self.name.clone(),
                timeout_ms: self.timeout_ms,
            }
        } else {
            ProviderError::Network {
                provider: self.name.clone(),
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Live
    }

    async fn generate(&self, request: &ReplyRequest) -> Result<Reply, ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::MissingCredentials {
                provider: self.name.clone(),
            });
        }

        let started = Instant::now();
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ApiRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
            messages: self.to_api_messages(request),
        };

        debug!(
            provider = %self.name,
            model = %self.model,
            context = request.context.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            warn!(provider = %self.name, status = status.as_u16(), body = %error_body, "Provider returned error");
            return Err(ProviderError::Api {
                provider: self.name.clone(),
                status_code: status.as_u16(),
                message: error_body,
            });
        }

        let raw = response.text().await.map_err(|e| self.transport_error(e))?;
        let api_response: ApiResponse = serde_json::from_str(&raw)
            .map_err(|e| self.invalid_response(format!("failed to parse response: {e}")))?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| self.invalid_response("response contained no reply text"))?;

        let mut reply = Reply::success(
            content,
            classify(&request.user_text),
            self.name.as_str(),
            ProviderKind::Live,
        )
        .with_latency(started.elapsed().as_millis() as u64)
        .with_metadata(
            "model",
            serde_json::json!(api_response.model.unwrap_or_else(|| self.model.clone())),
        );

        if let Some(usage) = api_response.usage {
            reply = reply
                .with_metadata("prompt_tokens", usage.prompt_tokens.into())
                .with_metadata("completion_tokens", usage.completion_tokens.into())
                .with_metadata("total_tokens", usage.total_tokens.into());
        }

        debug!(provider = %self.name, latency_ms = reply.latency_ms, "Completion received");
        Ok(reply)
    }

    fn is_healthy(&self) -> bool {
        !self.api_key.trim().is_empty() && !self.base_url.is_empty()
    }

    fn describe_config(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut info = serde_json::Map::new();
        info.insert("provider".into(), self.name.clone().into());
        info.insert("model".into(), self.model.clone().into());
        info.insert("api_base".into(), self.base_url.clone().into());
        info.insert("max_tokens".into(), self.max_tokens.into());
        info.insert("temperature".into(), serde_json::json!(self.temperature));
        info.insert("timeout_ms".into(), self.timeout_ms.into());
        info.insert(
            "api_key_configured".into(),
            (!self.api_key.trim().is_empty()).into(),
        );
        info
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
    messages: Vec<ApiMessage>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ApiReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
