#![allow(dead_code)]

use std::path::Path;

use tempfile::TempDir;

use lexqa_lib::config::Config;
use lexqa_lib::embedding::{Embedder, EmbeddingError};
use lexqa_lib::generation::{GenerationError, Generator};

/// [`lexqa_lib::test_support::write_pdf`], panicking on failure.
pub fn write_pdf(path: &Path, pages: &[&str]) {
    lexqa_lib::test_support::write_pdf(path, pages).unwrap();
}

/// Terms the keyword embedder counts, one dimension each.
pub const VOCABULARY: &[&str] = &[
    "theft",
    "murder",
    "contract",
    "consent",
    "imprisonment",
    "bail",
    "land",
    "tax",
];

/// Bag-of-keywords embedder with a constant bias dimension so no vector is zero.
pub struct KeywordEmbedder;

impl Embedder for KeywordEmbedder {
    fn model_id(&self) -> &str {
        "keyword-test"
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len() + 1
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = VOCABULARY
            .iter()
            .map(|term| lower.matches(term).count() as f32)
            .collect();
        vector.push(0.1);
        Ok(vector)
    }
}

/// Embedder whose model is never reachable.
pub struct OfflineEmbedder;

impl Embedder for OfflineEmbedder {
    fn model_id(&self) -> &str {
        "keyword-test"
    }

    fn dimensions(&self) -> usize {
        VOCABULARY.len() + 1
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Inference("model offline".to_string()))
    }
}

/// Generator driven by a closure over the rendered prompt.
pub struct FnGenerator<F>(pub F);

impl<F> Generator for FnGenerator<F>
where
    F: Fn(&str) -> Result<String, GenerationError>,
{
    fn model_id(&self) -> &str {
        "fn-test"
    }

    fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        (self.0)(prompt)
    }
}

/// Configuration rooted in `temp`, sized for [`KeywordEmbedder`].
pub fn config_in(temp: &TempDir) -> Config {
    let mut config = Config::default();
    config.paths.source_dir = temp.path().join("Knowledge_Source");
    config.paths.index_path = temp.path().join("vectorstore").join("index.sqlite");
    config.embedding.model = "keyword-test".to_string();
    config.embedding.dimensions = VOCABULARY.len() + 1;
    std::fs::create_dir_all(&config.paths.source_dir).unwrap();
    config
}
