//! Models command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::completion::list_models;
use crate::config::Settings;
use anyhow::Result;
use std::time::Duration;

/// List the models offered by the completion service.
pub async fn run_models(settings: Settings) -> Result<()> {
    preflight::check(Operation::Models, &settings)?;

    let spinner = Output::spinner("Fetching models...");
    let models = list_models(
        &settings.endpoint.models_url,
        &settings.endpoint.api_key,
        Duration::from_secs(settings.endpoint.timeout_seconds),
    )
    .await;
    spinner.finish_and_clear();

    let models = models?;
    if models.is_empty() {
        Output::warning(&format!(
            "No models available at {}",
            settings.endpoint.models_url
        ));
        return Ok(());
    }

    Output::header("Available Models");
    for model in &models {
        if *model == settings.generation.model {
            Output::list_item(&format!("{} (configured)", model));
        } else {
            Output::list_item(model);
        }
    }

    Ok(())
}
