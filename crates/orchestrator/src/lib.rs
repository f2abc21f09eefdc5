//! The Solace reply pipeline.
//!
//! [`Orchestrator::process_request`] runs one request end to end:
//!
//! 1. validate the request
//! 2. attach the conversation's context window
//! 3. call the configured provider under a timeout
//! 4. score the reply and substitute the fallback when it is too weak
//! 5. append the exchange to the context window
//! 6. record the call with the service monitor

pub mod engine;
pub mod health;

pub use engine::Orchestrator;
pub use health::{HealthCriteria, HealthReport, HealthStatus};
