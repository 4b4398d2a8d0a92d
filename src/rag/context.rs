//! Context building from retrieved documents.

use crate::error::{DocFinderError, Result};
use crate::index::SearchHit;
use crate::processor::DocumentSet;
use tracing::debug;

/// Concatenate the text of the given documents in order, newline-separated.
pub async fn read_documents(documents: &DocumentSet, titles: &[String]) -> Result<String> {
    let mut content = String::new();
    for title in titles {
        let path = documents.document_path(title);
        debug!("Retrieving content from document: {}", title);
        let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
            DocFinderError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read {}: {}", path.display(), e),
            ))
        })?;
        content.push_str(&text);
        content.push('\n');
    }
    Ok(content)
}

/// Format scored hits for display to the user.
pub fn format_hits_for_display(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| format!("{}. {} (score: {:.2})", i + 1, hit.title, hit.score))
        .collect::<Vec<_>>()
        .join("\n")
}
