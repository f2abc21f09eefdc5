//! # Solace Core
//!
//! Domain types, traits, and error definitions for the Solace reply
//! orchestration layer. This crate does no I/O: it defines
//! the domain model that every other crate implements against.
//!
//! ## Layout
//!
//! - [`message`]: requests, replies, context entries and reply categories
//! - [`provider`]: the reply-generation backend trait
//! - [`history`]: the persisted-message collaborator trait
//! - [`error`]: the error taxonomy shared across crates

pub mod error;
pub mod history;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use error::{Error, HistoryError, ProviderError, Result, ValidationError};
pub use history::{HistoryMessage, MessageHistory};
pub use message::{ContextEntry, ConversationId, Reply, ReplyCategory, ReplyRequest, Speaker};
pub use provider::{Provider, ProviderKind};
