//! Interactive query loop over one index.

use super::ask::print_answer;
use super::open_index;
use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::orchestrator::Status;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

/// A parsed line of REPL input.
#[derive(Debug, PartialEq)]
enum Input<'a> {
    Empty,
    Quit,
    Reload(Option<&'a str>),
    Query(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return Input::Quit;
    }
    if let Some(rest) = line.strip_prefix(":reload") {
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            let dir = rest.trim();
            return Input::Reload((!dir.is_empty()).then_some(dir));
        }
    }
    Input::Query(line)
}

/// Run the interactive query loop.
pub async fn run_repl(documents_dir: &str, settings: Settings) -> Result<()> {
    let orchestrator = open_index(&settings, documents_dir).await?;

    println!("\n{}", style("DocFinder").bold().cyan());
    println!(
        "{}\n",
        style("Type a question, ':reload [DIR]' to re-index, or 'exit' to quit.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("Query:").green().bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => {
                Output::info("Goodbye!");
                break;
            }
            Input::Reload(dir) => {
                let dir = match dir {
                    Some(d) => preflight::documents_dir(d),
                    None => Ok(current_directory(&orchestrator.status().await)),
                };
                let result = match dir {
                    Ok(dir) => orchestrator.rebuild(&dir).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(count) => Output::success(&format!("Re-indexed {} documents", count)),
                    Err(e) => Output::error(&format!("Reload failed, keeping previous index: {}", e)),
                }
            }
            Input::Query(query) => match orchestrator.answer(query).await {
                Ok(answer) => print_answer(&answer),
                Err(e) => Output::error(&format!("Error: {}", e)),
            },
        }
    }

    Ok(())
}

fn current_directory(status: &Status) -> PathBuf {
    match status {
        Status::Ready { directory, .. } => directory.clone(),
        Status::Unbuilt => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("  \n"), Input::Empty);
        assert_eq!(parse_input("exit\n"), Input::Quit);
        assert_eq!(parse_input("QUIT"), Input::Quit);
        assert_eq!(parse_input(":reload"), Input::Reload(None));
        assert_eq!(parse_input(":reload  ~/docs \n"), Input::Reload(Some("~/docs")));
        assert_eq!(parse_input(":reloaded"), Input::Query(":reloaded"));
        assert_eq!(parse_input("what do cats eat?"), Input::Query("what do cats eat?"));
    }
}
