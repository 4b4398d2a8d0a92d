//! Pipeline orchestrator for DocFinder.
//!
//! Builds the document index from a directory and answers queries against it.
//! The orchestrator starts out unbuilt; a successful [`Orchestrator::build`]
//! makes it ready, and later builds replace the whole corpus at once.

use crate::completion::{CompletionClient, SamplingParams};
use crate::config::{Prompts, Settings};
use crate::embedding::{create_embedder, Embedder};
use crate::error::{DocFinderError, Result};
use crate::index::{MemoryVectorIndex, SearchHit, VectorIndex};
use crate::processor::{DocumentProcessor, DocumentSet};
use crate::rag::{read_documents, RagAnswer, Retrieval};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, instrument};

/// A processed document set together with the index built from it.
#[derive(Debug)]
pub struct Corpus {
    documents: DocumentSet,
    index: MemoryVectorIndex,
    /// Temporary directory the documents live in, removed when the corpus is dropped.
    _storage: Option<TempDir>,
}

impl Corpus {
    /// The processed documents.
    pub fn documents(&self) -> &DocumentSet {
        &self.documents
    }

    /// The index over the documents' embeddings.
    pub fn index(&self) -> &MemoryVectorIndex {
        &self.index
    }
}

/// Whether the orchestrator can serve queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum Status {
    /// No document set has been built yet.
    Unbuilt,
    /// An index is built and queries are servable.
    Ready {
        directory: PathBuf,
        documents: usize,
        dimension: usize,
    },
}

/// The main orchestrator for the DocFinder pipeline.
pub struct Orchestrator {
    embedder: Arc<dyn Embedder>,
    processor: DocumentProcessor,
    completion: CompletionClient,
    prompts: Prompts,
    top_n: usize,
    generation: RwLock<SamplingParams>,
    corpus: RwLock<Option<Arc<Corpus>>>,
    build_lock: Mutex<()>,
}

impl Orchestrator {
    /// Create an orchestrator from validated settings.
    ///
    /// Fails fast on incomplete configuration or an unusable embedding model.
    pub async fn new(settings: &Settings) -> Result<Self> {
        settings.validate()?;

        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;
        let embedder = create_embedder(&settings.embedding).await?;
        let completion = CompletionClient::new(
            &settings.endpoint.api_key,
            &settings.endpoint.api_url,
            Duration::from_secs(settings.endpoint.timeout_seconds),
        )?;

        Self::with_components(settings, embedder, completion, prompts)
    }

    /// Create an orchestrator with custom components.
    ///
    /// Credentials are not checked here; the components are assumed to be usable.
    pub fn with_components(
        settings: &Settings,
        embedder: Arc<dyn Embedder>,
        completion: CompletionClient,
        prompts: Prompts,
    ) -> Result<Self> {
        let generation = settings.generation.sampling_params();
        generation.validate()?;
        if settings.retrieval.top_n == 0 {
            return Err(DocFinderError::Config(
                "retrieval.top_n must be at least 1".to_string(),
            ));
        }

        let processor = DocumentProcessor::new(embedder.clone())
            .with_extension(&settings.retrieval.extension)
            .with_concurrency(settings.retrieval.embed_concurrency);

        info!(
            "Initialized orchestrator (embedder: {}, endpoint: {})",
            embedder.model_name(),
            completion.endpoint()
        );

        Ok(Self {
            embedder,
            processor,
            completion,
            prompts,
            top_n: settings.retrieval.top_n,
            generation: RwLock::new(generation),
            corpus: RwLock::new(None),
            build_lock: Mutex::new(()),
        })
    }

    /// Show a progress bar while documents are embedded.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.processor = self.processor.with_progress(show_progress);
        self
    }

    /// Extension of the files that get indexed.
    pub fn extension(&self) -> &str {
        self.processor.extension()
    }

    /// Whether a file name would be picked up by a build.
    pub fn accepts(&self, file_name: &str) -> bool {
        self.processor.accepts(file_name)
    }

    /// Number of documents retrieved per query.
    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Current sampling parameters.
    pub async fn generation(&self) -> SamplingParams {
        self.generation.read().await.clone()
    }

    /// Replace the sampling parameters used for generation.
    pub async fn set_generation(&self, params: SamplingParams) -> Result<()> {
        params.validate()?;
        info!("Updated generation parameters (model: {})", params.model);
        *self.generation.write().await = params;
        Ok(())
    }

    /// Current state.
    pub async fn status(&self) -> Status {
        match self.corpus.read().await.as_ref() {
            None => Status::Unbuilt,
            Some(corpus) => Status::Ready {
                directory: corpus.documents.root().to_path_buf(),
                documents: corpus.documents.len(),
                dimension: corpus.index.dimension(),
            },
        }
    }

    /// The corpus queries currently run against, if built.
    pub async fn corpus(&self) -> Option<Arc<Corpus>> {
        self.corpus.read().await.clone()
    }

    /// Build the index from a directory of documents.
    ///
    /// On failure the previous state (unbuilt or ready) is kept.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub async fn build(&self, dir: &Path) -> Result<usize> {
        let _guard = self.build_lock.lock().await;
        self.build_locked(dir, None).await
    }

    /// Build from a temporary directory and take ownership of it.
    ///
    /// The directory is deleted once the resulting corpus is replaced and no
    /// query still holds it, or right away if the build fails.
    #[instrument(skip(self, dir), fields(dir = %dir.path().display()))]
    pub async fn build_temporary(&self, dir: TempDir) -> Result<usize> {
        let _guard = self.build_lock.lock().await;
        let path = dir.path().to_path_buf();
        self.build_locked(&path, Some(dir)).await
    }

    /// Rebuild a ready orchestrator from a (possibly different) directory.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub async fn rebuild(&self, dir: &Path) -> Result<usize> {
        let _guard = self.build_lock.lock().await;
        if self.corpus.read().await.is_none() {
            return Err(DocFinderError::State(
                "Cannot rebuild before an initial build".to_string(),
            ));
        }
        info!("Updating documents from directory: {}", dir.display());
        self.build_locked(dir, None).await
    }

    async fn build_locked(&self, dir: &Path, storage: Option<TempDir>) -> Result<usize> {
        let documents = self.processor.process_all(dir).await?;

        let mut index = MemoryVectorIndex::create(documents.dimension())?;
        index.add_all(documents.index_entries())?;

        let count = documents.len();
        let corpus = Arc::new(Corpus {
            documents,
            index,
            _storage: storage,
        });

        // The new corpus is complete before it becomes visible to queries.
        *self.corpus.write().await = Some(corpus);

        info!("Indexed {} documents from {}", count, dir.display());
        Ok(count)
    }

    async fn ready_corpus(&self) -> Result<Arc<Corpus>> {
        self.corpus.read().await.clone().ok_or_else(|| {
            DocFinderError::State("No documents have been built yet".to_string())
        })
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        if query.trim().is_empty() {
            return Err(DocFinderError::InvalidInput(
                "Query must not be empty".to_string(),
            ));
        }
        info!("Embedding query: {}", query);
        self.embedder.embed(query).await
    }

    /// Find the documents most relevant to a query and read their text.
    #[instrument(skip(self))]
    pub async fn retrieve(&self, query: &str) -> Result<Retrieval> {
        let corpus = self.ready_corpus().await?;
        let vector = self.embed_query(query).await?;

        let titles = corpus.index.search(&vector, self.top_n)?;
        let content = read_documents(&corpus.documents, &titles).await?;

        Ok(Retrieval { content, titles })
    }

    /// Scored nearest documents for a query, without generation.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        if limit == 0 {
            return Err(DocFinderError::InvalidInput(
                "Search limit must be at least 1".to_string(),
            ));
        }
        let corpus = self.ready_corpus().await?;
        let vector = self.embed_query(query).await?;
        corpus.index.search_scored(&vector, limit)
    }

    /// Generate a response from retrieved content.
    ///
    /// Endpoint failures are logged and reported as `None`.
    #[instrument(skip(self, content))]
    pub async fn generate(&self, query: &str, content: &str) -> Option<String> {
        info!("Generating response...");
        let prompt = self.prompts.rag_user_prompt(query, content);
        let params = self.generation().await;

        match self
            .completion
            .complete(&self.prompts.rag.system, &prompt, &params)
            .await
        {
            Ok(text) => Some(text),
            Err(e) => {
                error!("Failed to generate response: {}", e);
                None
            }
        }
    }

    /// Answer a query: retrieve the top documents, then generate a response.
    #[instrument(skip(self))]
    pub async fn answer(&self, query: &str) -> Result<RagAnswer> {
        let retrieval = self.retrieve(query).await?;
        let response = self.generate(query, &retrieval.content).await;

        Ok(RagAnswer {
            response,
            titles: retrieval.titles,
        })
    }
}
