//! Configuration module for DocFinder.
//!
//! Handles loading and validating application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    EmbeddingProvider, EmbeddingSettings, EndpointSettings, GeneralSettings, GenerationSettings,
    PromptSettings, RetrievalSettings, ServerSettings, Settings,
};
