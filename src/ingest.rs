//! Offline index build: PDFs -> pages -> chunks -> embeddings -> artifact.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::embedding::Embedder;
use crate::rag::{self, LoaderError, VectorIndex, VectorIndexError};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Loading failed: {0}")]
    Loader(#[from] LoaderError),

    #[error("Index build failed: {0}")]
    Index(#[from] VectorIndexError),

    #[error("No text to index in {0:?}")]
    NothingToIndex(PathBuf),
}

/// Summary of an index build.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub files_loaded: usize,
    /// (path, reason) for every PDF that was skipped
    pub files_skipped: Vec<(PathBuf, String)>,
    pub pages: usize,
    pub chunks: usize,
    pub index_path: PathBuf,
    pub elapsed: Duration,
}

/// Build and persist the index described by `config`.
pub fn build_index(config: &Config, embedder: &dyn Embedder) -> Result<IngestReport, IngestError> {
    config.validate()?;
    let started = Instant::now();
    let source_dir = &config.paths.source_dir;

    let loaded = rag::load_directory_with_report(source_dir)?;
    log::info!(
        "Loaded {} page(s) from {} file(s) in {:?} ({} skipped)",
        loaded.pages.len(),
        loaded.files_loaded,
        source_dir,
        loaded.skipped.len()
    );

    let chunks = rag::chunk_pages(&loaded.pages, &config.chunking);
    if chunks.is_empty() {
        return Err(IngestError::NothingToIndex(source_dir.clone()));
    }
    let chunk_count = chunks.len();
    log::info!(
        "Split into {} chunk(s) (size {}, overlap {})",
        chunk_count,
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    VectorIndex::build(
        chunks,
        embedder,
        config.embedding.batch_size,
        &config.paths.index_path,
    )?;

    Ok(IngestReport {
        files_loaded: loaded.files_loaded,
        files_skipped: loaded.skipped,
        pages: loaded.pages.len(),
        chunks: chunk_count,
        index_path: config.paths.index_path.clone(),
        elapsed: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingError;
    use crate::test_support::write_pdf;
    use tempfile::TempDir;

    struct Length;

    impl Embedder for Length {
        fn model_id(&self) -> &str {
            "length"
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    fn config_in(temp: &TempDir) -> Config {
        let mut config = Config::default();
        config.paths.source_dir = temp.path().join("Knowledge_Source");
        config.paths.index_path = temp.path().join("vectorstore").join("index.sqlite");
        config.embedding.dimensions = 2;
        config
    }

    #[test]
    fn test_build_index_end_to_end() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        std::fs::create_dir_all(&config.paths.source_dir).unwrap();
        write_pdf(
            &config.paths.source_dir.join("act.pdf"),
            &["Part I", "Part II"],
        )
        .unwrap();
        std::fs::write(config.paths.source_dir.join("bad.pdf"), b"garbage").unwrap();

        let report = build_index(&config, &Length).unwrap();
        assert_eq!(report.files_loaded, 1);
        assert_eq!(report.files_skipped.len(), 1);
        assert_eq!(report.pages, 2);
        assert_eq!(report.chunks, 2);

        let index = VectorIndex::load(&config.paths.index_path).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.model_id(), "length");
    }

    #[test]
    fn test_empty_corpus_is_an_error() {
        let temp = TempDir::new().unwrap();
        let config = config_in(&temp);
        std::fs::create_dir_all(&config.paths.source_dir).unwrap();

        let result = build_index(&config, &Length);
        assert!(matches!(result, Err(IngestError::NothingToIndex(_))));
        assert!(!config.paths.index_path.exists());
    }
}
