//! DocFinder - Retrieval-augmented question answering over local documents
//!
//! Embeds every text file in a directory, indexes the vectors, and answers
//! questions by retrieving the closest documents and passing them to a chat
//! completion endpoint.
//!
//! # Architecture
//!
//! - `config` - Configuration and prompt templates
//! - `embedding` - Text embedding models
//! - `index` - Vector index with cosine similarity search
//! - `processor` - Directory scanning and document embedding
//! - `completion` - Chat completion client
//! - `rag` - Retrieval context and answer types
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use docfinder::config::Settings;
//! use docfinder::orchestrator::Orchestrator;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(&settings).await?;
//!
//!     orchestrator.build(Path::new("./documents")).await?;
//!     let answer = orchestrator.answer("What do cats eat?").await?;
//!     println!("{}", answer.format_for_display());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod completion;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod openai;
pub mod orchestrator;
pub mod processor;
pub mod rag;

#[cfg(test)]
mod test_support;

pub use error::{DocFinderError, EndpointFailure, Result};
