//! Retrieval and answer assembly for question answering over documents.

pub mod context;
mod response;

pub use context::read_documents;
pub use response::RagAnswer;

/// Documents retrieved for a query.
#[derive(Debug, Clone)]
pub struct Retrieval {
    /// Full text of the matched documents in ranked order, each followed by a newline.
    pub content: String,
    /// Titles of the matched documents, most similar first.
    pub titles: Vec<String>,
}
