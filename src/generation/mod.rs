//! Text generation through a hosted completion API.

mod chat;

pub use chat::ChatCompletionsClient;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("API credential not set (expected environment variable {0})")]
    MissingCredential(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Rate limit or quota exceeded: {0}")]
    RateLimited(String),

    #[error("Completion service returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Completion service returned no text")]
    EmptyCompletion,
}

/// An opaque text-completion service.
pub trait Generator {
    /// Model identifier, for logs and JSON output
    fn model_id(&self) -> &str;

    fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}
