//! Error types for the Solace domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

/// The top-level error type for Solace operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Request validation ---
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// A reply request that cannot be processed as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("requester id is required")]
    MissingRequesterId,

    #[error("conversation id is required")]
    MissingConversationId,

    #[error("user text must not be blank")]
    BlankUserText,
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("{provider}: API key is not configured")]
    MissingCredentials { provider: String },

    #[error("{provider}: API request failed: {message} (status: {status_code})")]
    Api {
        provider: String,
        status_code: u16,
        message: String,
    },

    #[error("{provider}: network error: {message}")]
    Network { provider: String, message: String },

    #[error("{provider}: invalid response: {message}")]
    InvalidResponse { provider: String, message: String },

    #[error("{provider}: request timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("{provider}: not configured: {message}")]
    NotConfigured { provider: String, message: String },
}

impl ProviderError {
    /// Stable machine-readable code, recorded as the failure reason category.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredentials { .. } => "MISSING_API_KEY",
            Self::Api { .. } => "API_ERROR",
            Self::Network { .. } => "API_CALL_FAILED",
            Self::InvalidResponse { .. } => "INVALID_RESPONSE",
            Self::Timeout { .. } => "TIMEOUT",
            Self::NotConfigured { .. } => "NOT_CONFIGURED",
        }
    }

    /// Name of the provider that produced the error.
    pub fn provider(&self) -> &str {
        match self {
            Self::MissingCredentials { provider }
            | Self::Api { provider, .. }
            | Self::Network { provider, .. }
            | Self::InvalidResponse { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::NotConfigured { provider, .. } => provider,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum HistoryError {
    #[error("History store unavailable: {0}")]
    Unavailable(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),
}
