//! Conversation context for Solace.
//!
//! Each conversation keeps a short, importance-ordered window of recent
//! exchanges. The window is loaded from message history on a cache miss,
//! grows as replies are accepted, and expires a fixed time after the last
//! write.

pub mod store;
pub mod summary;
pub mod weight;

pub use store::ContextStore;
pub use summary::{extract_topics, summarize_entries, EMPTY_SUMMARY};
pub use weight::{importance_weight, importance_weight_at};
