//! Shared configuration for ingestion and serving.
//!
//! Both the `ingest` path and the question-answering path read the same
//! [`Config`], so chunking parameters, retrieval depth and prompt template
//! are defined exactly once.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder replaced by the retrieved context in the prompt template.
pub const CONTEXT_PLACEHOLDER: &str = "{context}";

/// Placeholder replaced by the user's question in the prompt template.
pub const QUESTION_PLACEHOLDER: &str = "{question}";

/// Sentinel the model is instructed to answer with when the context does
/// not contain the answer.
pub const DONT_KNOW_SENTINEL: &str = "I don't know.";

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "lexqa.toml";

const DEFAULT_PROMPT_TEMPLATE: &str = r#"Use only the given context to answer the user's question.
If the answer is not in the context, say "I don't know."
Do not include any additional explanations.

Context: {context}
Question: {question}

Provide only the answer."#;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid chunking parameters: chunk_size={chunk_size}, chunk_overlap={chunk_overlap}")]
    InvalidChunking {
        chunk_size: usize,
        chunk_overlap: usize,
    },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationConfig,
    pub prompt: PromptConfig,
}

/// Filesystem locations for the corpus and the index artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory scanned for `*.pdf` files
    pub source_dir: PathBuf,
    /// SQLite file holding the built vector index
    pub index_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("Knowledge_Source"),
            index_path: PathBuf::from("vectorstore/index.sqlite"),
        }
    }
}

/// Sliding-window parameters, in characters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum characters per chunk
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks of a page
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

impl ChunkingConfig {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ConfigError> {
        let config = Self {
            chunk_size,
            chunk_overlap,
        };
        config.validate()?;
        Ok(config)
    }

    /// Distance the window start moves between two chunks.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 || self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::InvalidChunking {
                chunk_size: self.chunk_size,
                chunk_overlap: self.chunk_overlap,
            });
        }
        Ok(())
    }
}

/// Which embedding backend to construct.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// In-process ONNX sentence-transformer
    #[default]
    Onnx,
    /// OpenAI-compatible `/embeddings` endpoint (OpenAI, Ollama, LM Studio)
    Http,
}

/// Configuration for embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    /// Model identifier recorded in the index manifest
    pub model: String,
    /// Dimensions of the embedding vectors
    pub dimensions: usize,
    /// Directory with `model.onnx` and `tokenizer.json` (onnx provider)
    pub model_dir: PathBuf,
    /// Maximum tokens fed to the model per text (onnx provider)
    pub max_tokens: usize,
    /// Base URL of the embeddings API (http provider)
    pub base_url: String,
    /// Environment variable holding the embeddings API key, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Number of chunks embedded per call while building the index
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Onnx,
            model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            dimensions: 384,
            model_dir: PathBuf::from("models/all-MiniLM-L6-v2"),
            max_tokens: 256,
            base_url: "http://localhost:11434/v1".to_string(),
            api_key_env: None,
            batch_size: 32,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per question
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

/// Configuration for the hosted completion API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of an OpenAI-compatible chat completions API
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Environment variable the API credential is read from
    pub api_key_env: String,
    /// Request timeout in seconds; `None` waits indefinitely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    /// Remove a leading `<think>...</think>` block from completions
    pub strip_reasoning: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "deepseek-r1-distill-llama-70b".to_string(),
            temperature: 0.5,
            api_key_env: "GROQ_API_KEY".to_string(),
            timeout_secs: None,
            strip_reasoning: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PromptConfig {
    /// Template containing `{context}` and `{question}`
    pub template: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, else `lexqa.toml` if present, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking.validate()?;

        if self.retrieval.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retrieval.top_k",
                message: "must be a positive integer".to_string(),
            });
        }

        if self.embedding.dimensions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "embedding.dimensions",
                message: "must be a positive integer".to_string(),
            });
        }

        if self.embedding.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "embedding.batch_size",
                message: "must be a positive integer".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "generation.temperature",
                message: format!("{} is outside [0, 2]", self.generation.temperature),
            });
        }

        for placeholder in [CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER] {
            if !self.prompt.template.contains(placeholder) {
                return Err(ConfigError::InvalidValue {
                    field: "prompt.template",
                    message: format!("missing {} placeholder", placeholder),
                });
            }
        }

        Ok(())
    }
}
