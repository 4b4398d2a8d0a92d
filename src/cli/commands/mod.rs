//! CLI command implementations.

mod ask;
mod config;
mod models;
mod repl;
mod search;
mod serve;

pub use ask::run_ask;
pub use config::run_config;
pub use models::run_models;
pub use repl::run_repl;
pub use search::run_search;
pub use serve::{router, run_serve, AppState};

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Check the setup, create the orchestrator and index `documents_dir`.
async fn open_index(settings: &Settings, documents_dir: &str) -> Result<Orchestrator> {
    if let Err(e) = preflight::check(Operation::Pipeline, settings) {
        Output::error(&e.to_string());
        Output::info("Run 'docfinder config init' to create a configuration file.");
        return Err(e.into());
    }
    let dir = preflight::documents_dir(documents_dir)?;

    let spinner = Output::spinner("Loading embedding model...");
    let orchestrator = Orchestrator::new(settings).await;
    spinner.finish_and_clear();
    let orchestrator = orchestrator?.with_progress(true);

    let count = orchestrator.build(&dir).await?;
    Output::success(&format!("Indexed {} documents from {}", count, dir.display()));

    Ok(orchestrator)
}
