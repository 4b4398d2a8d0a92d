//! Document processing: turn a directory of text files into embeddings.

use crate::embedding::{preview, Embedder};
use crate::error::{DocFinderError, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Embeddings and titles produced by one processing pass over a directory.
///
/// `titles[i]` names the file whose text produced `embeddings[i]`.
#[derive(Debug, Clone)]
pub struct DocumentSet {
    root: PathBuf,
    titles: Vec<String>,
    embeddings: Vec<Vec<f32>>,
}

impl DocumentSet {
    /// Directory the documents were read from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Document titles in processing order.
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    /// Embeddings, parallel to [`titles`](Self::titles).
    pub fn embeddings(&self) -> &[Vec<f32>] {
        &self.embeddings
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.titles.len()
    }

    /// Whether the set is empty. A processed set never is.
    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Embedding dimension, taken from the first document.
    pub fn dimension(&self) -> usize {
        self.embeddings.first().map_or(0, Vec::len)
    }

    /// Path of the document with the given title.
    pub fn document_path(&self, title: &str) -> PathBuf {
        self.root.join(title)
    }

    /// `(vector, title)` pairs ready for bulk insertion into an index.
    pub fn index_entries(&self) -> Vec<(Vec<f32>, String)> {
        self.embeddings
            .iter()
            .cloned()
            .zip(self.titles.iter().cloned())
            .collect()
    }
}

/// Reads and embeds every supported file in a directory.
pub struct DocumentProcessor {
    embedder: Arc<dyn Embedder>,
    extension: String,
    concurrency: usize,
    show_progress: bool,
}

impl DocumentProcessor {
    /// Create a processor for `.txt` files that embeds one file at a time.
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            extension: "txt".to_string(),
            concurrency: 1,
            show_progress: false,
        }
    }

    /// Set the file extension to process (without the dot).
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Set how many files are embedded concurrently.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Show a progress bar while embedding.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Extension of the files this processor accepts.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Whether a file name is one this processor would pick up.
    pub fn accepts(&self, file_name: &str) -> bool {
        !file_name.starts_with('.')
            && Path::new(file_name)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == self.extension)
    }

    /// Embed every supported file in `dir`.
    ///
    /// Any unreadable file or failed embedding aborts the whole pass, as does
    /// finding no supported files at all.
    #[instrument(skip(self), fields(dir = %dir.display()))]
    pub async fn process_all(&self, dir: &Path) -> Result<DocumentSet> {
        info!("Processing documents...");
        let result = self.process_inner(dir).await;
        if let Err(e) = &result {
            error!("Failed to process documents: {}", e);
        }
        result
    }

    async fn process_inner(&self, dir: &Path) -> Result<DocumentSet> {
        let titles = self.list_documents(dir).await?;
        if titles.is_empty() {
            return Err(DocFinderError::Processing(format!(
                "No .{} documents found in {}. Please check your documents directory.",
                self.extension,
                dir.display()
            )));
        }

        let progress = if self.show_progress {
            let pb = ProgressBar::new(titles.len() as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} Files processed [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                pb.set_style(style.progress_chars("#>-"));
            }
            pb
        } else {
            ProgressBar::hidden()
        };

        // `buffered` yields results in input order, keeping titles and embeddings aligned.
        let embeddings: Vec<Vec<f32>> = stream::iter(titles.clone())
            .map(|title| {
                let progress = progress.clone();
                async move {
                    let embedding = self.embed_file(dir, &title).await?;
                    progress.inc(1);
                    Ok::<_, DocFinderError>(embedding)
                }
            })
            .buffered(self.concurrency)
            .try_collect()
            .await
            .inspect_err(|_| progress.abandon())?;
        progress.finish_and_clear();

        let dimension = embeddings.first().map_or(0, Vec::len);
        if let Some(position) = embeddings.iter().position(|e| e.len() != dimension) {
            return Err(DocFinderError::Processing(format!(
                "Embedding of {} has dimension {}, expected {}",
                titles[position],
                embeddings[position].len(),
                dimension
            )));
        }

        info!("Embedded {} documents", titles.len());
        Ok(DocumentSet {
            root: dir.to_path_buf(),
            titles,
            embeddings,
        })
    }

    /// Supported file names in `dir`, sorted.
    async fn list_documents(&self, dir: &Path) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
            DocFinderError::Processing(format!(
                "Cannot read documents directory {}: {}",
                dir.display(),
                e
            ))
        })?;

        let mut titles = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            DocFinderError::Processing(format!(
                "Cannot list documents directory {}: {}",
                dir.display(),
                e
            ))
        })? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                debug!("Skipping non UTF-8 file name {:?}", entry.file_name());
                continue;
            };
            if !self.accepts(&name) {
                continue;
            }
            // Follows symlinks, unlike DirEntry::file_type.
            let path = entry.path();
            let metadata = tokio::fs::metadata(&path).await.map_err(|e| {
                DocFinderError::Processing(format!("Cannot inspect {}: {}", path.display(), e))
            })?;
            if metadata.is_file() {
                titles.push(name);
            }
        }

        titles.sort();
        Ok(titles)
    }

    async fn embed_file(&self, dir: &Path, title: &str) -> Result<Vec<f32>> {
        let path = dir.join(title);
        debug!("Reading file: {}", path.display());

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            DocFinderError::Processing(format!("Failed to read {}: {}", path.display(), e))
        })?;

        debug!("Embedding content from {}: {}...", title, preview(&content));
        self.embedder.embed(&content).await.map_err(|e| {
            DocFinderError::Processing(format!("Failed to embed {}: {}", title, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::testing::StubEmbedder;
    use std::sync::atomic::Ordering;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    fn stub() -> Arc<StubEmbedder> {
        Arc::new(
            StubEmbedder::new(2)
                .with("cats are mammals", vec![1.0, 0.0])
                .with("rockets use fuel", vec![0.0, 1.0]),
        )
    }

    #[tokio::test]
    async fn test_process_all_pairs_titles_with_embeddings() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.txt", "rockets use fuel");
        write(dir.path(), "a.txt", "cats are mammals");
        write(dir.path(), "notes.md", "ignored");
        std::fs::create_dir(dir.path().join("nested.txt")).unwrap();

        let processor = DocumentProcessor::new(stub()).with_concurrency(4);
        let set = processor.process_all(dir.path()).await.unwrap();

        assert_eq!(set.titles(), &["a.txt".to_string(), "b.txt".to_string()]);
        assert_eq!(set.embeddings(), &[vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert_eq!(set.dimension(), 2);
        assert_eq!(set.document_path("a.txt"), dir.path().join("a.txt"));
    }

    #[tokio::test]
    async fn test_embeds_each_file_once() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            write(dir.path(), &format!("doc{}.txt", i), &format!("document {}", i));
        }

        let embedder = stub();
        let processor = DocumentProcessor::new(embedder.clone()).with_concurrency(3);
        let set = processor.process_all(dir.path()).await.unwrap();

        assert_eq!(set.len(), 5);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_empty_directory_is_processing_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "readme.md", "not a txt");

        let processor = DocumentProcessor::new(stub());
        let result = processor.process_all(dir.path()).await;
        assert!(matches!(result, Err(DocFinderError::Processing(_))));
    }

    #[tokio::test]
    async fn test_missing_directory_is_processing_error() {
        let dir = tempfile::tempdir().unwrap();
        let processor = DocumentProcessor::new(stub());
        let result = processor.process_all(&dir.path().join("missing")).await;
        assert!(matches!(result, Err(DocFinderError::Processing(_))));
    }

    #[tokio::test]
    async fn test_unreadable_file_aborts_build() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "cats are mammals");
        std::fs::write(dir.path().join("bad.txt"), [0xff, 0xfe, 0xfd]).unwrap();

        let processor = DocumentProcessor::new(stub());
        let err = processor.process_all(dir.path()).await.unwrap_err();
        assert!(matches!(err, DocFinderError::Processing(_)));
        assert!(err.to_string().contains("bad.txt"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_dangling_symlink_is_processing_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "cats are mammals");
        std::os::unix::fs::symlink(dir.path().join("gone.txt"), dir.path().join("b.txt")).unwrap();

        let processor = DocumentProcessor::new(stub());
        let err = processor.process_all(dir.path()).await.unwrap_err();
        assert!(matches!(err, DocFinderError::Processing(_)));
        assert!(err.to_string().contains("b.txt"));
    }

    #[tokio::test]
    async fn test_process_all_runs_on_spawned_task() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "cats are mammals");
        write(dir.path(), "b.txt", "rockets use fuel");
        let processor = Arc::new(DocumentProcessor::new(stub()).with_concurrency(2));
        let path = dir.path().to_path_buf();

        let set = tokio::spawn(async move { processor.process_all(&path).await })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(set.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_file_aborts_build() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.txt", "cats are mammals");
        write(dir.path(), "empty.txt", "");

        let processor = DocumentProcessor::new(stub());
        let err = processor.process_all(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("empty.txt"));
    }

    #[test]
    fn test_accepts() {
        let processor = DocumentProcessor::new(stub()).with_extension(".md");
        assert_eq!(processor.extension(), "md");
        assert!(processor.accepts("notes.md"));
        assert!(!processor.accepts("notes.txt"));
        assert!(!processor.accepts(".hidden.md"));
        assert!(!processor.accepts("md"));
    }
}
