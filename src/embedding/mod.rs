//! Embedding providers.
//!
//! The rest of the crate only sees the [`Embedder`] trait. Providers must be
//! deterministic: the same text through the same model always yields the
//! same vector, otherwise a rebuilt index would not reproduce its results.

mod http;
#[cfg(feature = "onnx")]
mod onnx;

pub use http::HttpEmbedder;
#[cfg(feature = "onnx")]
pub use onnx::OnnxEmbedder;

use thiserror::Error;

use crate::config::{EmbeddingConfig, EmbeddingProvider};

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Model load failed: {0}")]
    ModelLoad(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding service returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Provider {0:?} is not available in this build")]
    Unavailable(EmbeddingProvider),
}

/// Maps text to a fixed-length vector.
pub trait Embedder {
    /// Identifier of the model, recorded in the index manifest
    fn model_id(&self) -> &str;

    /// Length of every vector this embedder produces
    fn dimensions(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed several texts, preserving order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Construct the embedder selected by the configuration.
pub fn from_config(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>, EmbeddingError> {
    match config.provider {
        #[cfg(feature = "onnx")]
        EmbeddingProvider::Onnx => Ok(Box::new(OnnxEmbedder::from_config(config)?)),
        #[cfg(not(feature = "onnx"))]
        EmbeddingProvider::Onnx => Err(EmbeddingError::Unavailable(EmbeddingProvider::Onnx)),
        EmbeddingProvider::Http => Ok(Box::new(HttpEmbedder::from_config(config)?)),
    }
}

/// Fail unless `vector` has the expected length.
pub(crate) fn check_dimensions(vector: &[f32], expected: usize) -> Result<(), EmbeddingError> {
    if vector.len() != expected {
        return Err(EmbeddingError::DimensionMismatch {
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}

/// L2 normalize in place; zero vectors are left untouched.
#[cfg(feature = "onnx")]
pub(crate) fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant;

    impl Embedder for Constant {
        fn model_id(&self) -> &str {
            "constant"
        }

        fn dimensions(&self) -> usize {
            2
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    #[test]
    fn test_default_batch_preserves_order() {
        let vectors = Constant.embed_batch(&["a", "abc", "ab"]).unwrap();
        assert_eq!(vectors, vec![vec![1.0, 1.0], vec![3.0, 1.0], vec![2.0, 1.0]]);
    }

    #[cfg(feature = "onnx")]
    #[test]
    fn test_normalize() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 0.001);
        assert!((v[1] - 0.8).abs() < 0.001);

        let mut zero = vec![0.0, 0.0];
        normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[test]
    fn test_check_dimensions() {
        assert!(check_dimensions(&[1.0, 2.0], 2).is_ok());
        assert!(matches!(
            check_dimensions(&[1.0], 2),
            Err(EmbeddingError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }
}
