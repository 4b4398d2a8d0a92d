//! Search command implementation.

use super::open_index;
use crate::cli::Output;
use crate::config::Settings;
use crate::rag::context::format_hits_for_display;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    documents_dir: &str,
    query: &str,
    limit: usize,
    settings: Settings,
) -> Result<()> {
    let orchestrator = open_index(&settings, documents_dir).await?;

    let spinner = Output::spinner("Searching...");
    let results = orchestrator.search(query, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(hits) => {
            Output::success(&format!("Found {} results", hits.len()));
            println!("{}", format_hits_for_display(&hits));
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
