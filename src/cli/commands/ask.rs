//! Ask command implementation.

use super::open_index;
use crate::cli::Output;
use crate::config::Settings;
use crate::error::DocFinderError;
use crate::rag::RagAnswer;
use anyhow::Result;
use std::io::{self, Write};

/// Run the ask command.
pub async fn run_ask(documents_dir: &str, query: Option<String>, settings: Settings) -> Result<()> {
    let orchestrator = open_index(&settings, documents_dir).await?;

    let query = match query {
        Some(q) => q,
        None => prompt_for_query()?,
    };
    if query.trim().is_empty() {
        return Err(DocFinderError::InvalidInput("Query must not be empty".to_string()).into());
    }

    let spinner = Output::spinner("Searching documents...");
    let answer = orchestrator.answer(&query).await;
    spinner.finish_and_clear();

    match answer {
        Ok(answer) => {
            print_answer(&answer);
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Failed to answer: {}", e));
            Err(e.into())
        }
    }
}

/// Print the generated response followed by the retrieved titles.
pub(crate) fn print_answer(answer: &RagAnswer) {
    if !answer.has_response() {
        Output::warning("The completion endpoint did not produce a response.");
    }
    println!("\n{}\n", answer.format_for_display());
}

fn prompt_for_query() -> io::Result<String> {
    print!("Enter your query: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
