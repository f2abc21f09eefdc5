//! CLI subcommands.

pub mod chat;
pub mod daemon;
pub mod doctor;
pub mod onboard;
pub mod stats;
pub mod status;

use std::sync::Arc;

use solace_config::AppConfig;
use solace_core::{Error, Result};
use solace_history::InMemoryHistory;
use solace_orchestrator::Orchestrator;

/// Load the config, with a readable error.
pub(crate) fn load_config() -> Result<AppConfig> {
    AppConfig::load().map_err(|e| Error::Config {
        message: format!("failed to load config: {e}"),
    })
}

/// Build the pipeline over an in-process history.
pub(crate) fn build_orchestrator(config: &AppConfig) -> Result<Arc<Orchestrator>> {
    let history = Arc::new(InMemoryHistory::new());
    let orchestrator = Orchestrator::from_config(config, history).map_err(|e| Error::Config {
        message: format!("failed to build reply pipeline: {e}"),
    })?;
    Ok(Arc::new(orchestrator))
}
