//! In-process sentence embeddings via tract.
//!
//! Expects a sentence-transformers export in the model directory:
//! `model.onnx` (BERT-style, outputs token embeddings) and `tokenizer.json`.
//! Token embeddings are mean-pooled over the attention mask and L2
//! normalized, matching the sentence-transformers pipeline for MiniLM.

use std::path::Path;

use tokenizers::{Tokenizer, TruncationParams};
use tract_onnx::prelude::*;

use crate::config::EmbeddingConfig;

use super::{check_dimensions, normalize, Embedder, EmbeddingError};

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

const MODEL_FILE: &str = "model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Loaded sentence-transformer ready for inference.
pub struct OnnxEmbedder {
    plan: OnnxPlan,
    tokenizer: Tokenizer,
    model_id: String,
    dimensions: usize,
}

impl OnnxEmbedder {
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        Self::load(&config.model_dir, &config.model, config.dimensions, config.max_tokens)
    }

    /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
    pub fn load(
        model_dir: &Path,
        model_id: &str,
        dimensions: usize,
        max_tokens: usize,
    ) -> Result<Self, EmbeddingError> {
        let model_path = model_dir.join(MODEL_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);

        let plan = tract_onnx::onnx()
            .model_for_path(&model_path)
            .map_err(|e| EmbeddingError::ModelLoad(format!("{:?}: {}", model_path, e)))?
            .into_optimized()
            .map_err(|e| EmbeddingError::ModelLoad(e.to_string()))?
            .into_runnable()
            .map_err(|e| EmbeddingError::ModelLoad(e.to_string()))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| EmbeddingError::Tokenizer(format!("{:?}: {}", tokenizer_path, e)))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_tokens,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;
        tokenizer.with_padding(None);

        log::info!("Loaded embedding model {} from {:?}", model_id, model_dir);

        Ok(Self {
            plan,
            tokenizer,
            model_id: model_id.to_string(),
            dimensions,
        })
    }

    /// Build a `[1, seq_len]` i64 tensor.
    fn input_tensor(values: &[u32]) -> Result<Tensor, EmbeddingError> {
        let data: Vec<i64> = values.iter().map(|&v| v as i64).collect();
        Tensor::from_shape(&[1, data.len()], &data)
            .map_err(|e| EmbeddingError::Inference(e.to_string()))
    }
}

impl Embedder for OnnxEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;
        let mask = encoding.get_attention_mask();

        // Exports differ in whether token_type_ids is an input
        let input_count = self.plan.model().inputs.len();
        let inputs: TVec<TValue> = [
            encoding.get_ids(),
            mask,
            encoding.get_type_ids(),
        ]
        .iter()
        .take(input_count)
        .map(|values| Self::input_tensor(values).map(TValue::from))
        .collect::<Result<_, _>>()?;

        let outputs = self
            .plan
            .run(inputs)
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?;

        // (1, seq_len, hidden_size)
        let token_embeddings = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| EmbeddingError::Inference(e.to_string()))?;
        let shape = token_embeddings.shape().to_vec();
        if shape.len() != 3 || shape[1] != mask.len() {
            return Err(EmbeddingError::Inference(format!(
                "unexpected output shape {:?}",
                shape
            )));
        }
        let hidden_size = shape[2];
        let flat: Vec<f32> = token_embeddings.iter().copied().collect();

        let mut pooled = vec![0.0f32; hidden_size];
        let mut count = 0.0f32;
        for (token, &m) in mask.iter().enumerate() {
            if m > 0 {
                let row = &flat[token * hidden_size..(token + 1) * hidden_size];
                for (sum, value) in pooled.iter_mut().zip(row) {
                    *sum += value;
                }
                count += 1.0;
            }
        }
        if count > 0.0 {
            pooled.iter_mut().for_each(|v| *v /= count);
        }
        normalize(&mut pooled);

        check_dimensions(&pooled, self.dimensions)?;
        Ok(pooled)
    }
}
