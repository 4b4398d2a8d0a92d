//! DocFinder CLI entry point.

use anyhow::Result;
use clap::Parser;
use docfinder::cli::{commands, Cli, Commands};
use docfinder::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let settings = Settings::load_from(config_path.as_ref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("docfinder={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match cli.command {
        Commands::Ask {
            documents_dir,
            query,
        } => {
            commands::run_ask(&documents_dir, query, settings).await?;
        }

        Commands::Repl { documents_dir } => {
            commands::run_repl(&documents_dir, settings).await?;
        }

        Commands::Search {
            documents_dir,
            query,
            limit,
        } => {
            commands::run_search(&documents_dir, &query, limit, settings).await?;
        }

        Commands::Models => {
            commands::run_models(settings).await?;
        }

        Commands::Serve {
            host,
            port,
            documents_dir,
        } => {
            commands::run_serve(host, port, documents_dir, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, config_path, settings)?;
        }
    }

    Ok(())
}
