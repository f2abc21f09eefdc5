//! Reply provider implementations for Solace.
//!
//! All providers implement the `solace_core::Provider` trait.
//! [`build_from_config`] picks one at startup.

pub mod classify;
pub mod openai_compat;
pub mod router;
pub mod template;

pub use classify::classify;
pub use openai_compat::OpenAiCompatProvider;
pub use router::{build_from_config, ProviderId};
pub use template::TemplateProvider;
