//! Embeddings from an OpenAI-compatible `/embeddings` endpoint.
//!
//! Works with OpenAI, Ollama (`/v1`) and LM Studio.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::EmbeddingConfig;

use super::{check_dimensions, Embedder, EmbeddingError};

pub struct HttpEmbedder {
    client: Client,
    base_url: String,
    model: String,
    dimensions: usize,
    api_key: Option<String>,
}

impl HttpEmbedder {
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|key| !key.trim().is_empty());

        Self::new(&config.base_url, &config.model, config.dimensions, api_key)
    }

    pub fn new(
        base_url: &str,
        model: &str,
        dimensions: usize,
        api_key: Option<String>,
    ) -> Result<Self, EmbeddingError> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimensions,
            api_key,
        })
    }

    fn request(&self, input: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!("{}/embeddings", self.base_url);
        let mut request = self.client.post(&url).json(&EmbeddingRequest {
            model: &self.model,
            input,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.trim());
        }

        let response = request.send()?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(EmbeddingError::Service { status, message });
        }

        let parsed: EmbeddingResponse = response.json()?;
        parsed.into_vectors(input.len(), self.dimensions)
    }
}

impl EmbeddingResponse {
    /// Vectors in request order, checked for count and length.
    fn into_vectors(
        mut self,
        expected_count: usize,
        dimensions: usize,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if self.data.len() != expected_count {
            return Err(EmbeddingError::Inference(format!(
                "requested {} embeddings, received {}",
                expected_count,
                self.data.len()
            )));
        }
        self.data.sort_by_key(|item| item.index);

        let vectors: Vec<Vec<f32>> = self.data.into_iter().map(|item| item.embedding).collect();
        for vector in &vectors {
            check_dimensions(vector, dimensions)?;
        }
        Ok(vectors)
    }
}

impl Embedder for HttpEmbedder {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.request(&[text])?
            .pop()
            .ok_or_else(|| EmbeddingError::Inference("Empty result".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}
