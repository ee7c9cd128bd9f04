use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;

use super::{GenerationError, Generator};

/// Client for an OpenAI-compatible `/chat/completions` endpoint (Groq by default).
pub struct ChatCompletionsClient {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    api_key: Option<String>,
    api_key_env: String,
    strip_reasoning: bool,
}

impl ChatCompletionsClient {
    /// Build a client, reading the credential from the configured
    /// environment variable once.
    ///
    /// A missing credential does not fail here; every call to
    /// [`Generator::complete`] fails instead.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            log::info!(
                "{} is not set; answer generation will fail",
                config.api_key_env
            );
        }
        Self::new(config, api_key)
    }

    pub fn new(config: &GenerationConfig, api_key: Option<String>) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(config.timeout_secs.map(Duration::from_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key,
            api_key_env: config.api_key_env.clone(),
            strip_reasoning: config.strip_reasoning,
        })
    }
}

impl Generator for ChatCompletionsClient {
    fn model_id(&self) -> &str {
        &self.model
    }

    fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| GenerationError::MissingCredential(self.api_key_env.clone()))?;

        let body = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let url = format!("{}/chat/completions", self.base_url);
        log::debug!("Requesting completion from {} ({})", url, self.model);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key.trim())
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    GenerationError::Unauthorized(message)
                }
                StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited(message),
                _ => GenerationError::Service {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let parsed: ChatResponse = response.json()?;
        let content = parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .ok_or(GenerationError::EmptyCompletion)?;

        let answer = if self.strip_reasoning {
            strip_reasoning_block(&content)
        } else {
            content.trim().to_string()
        };

        if answer.is_empty() {
            return Err(GenerationError::EmptyCompletion);
        }
        Ok(answer)
    }
}

/// Drop a leading `<think>...</think>` block emitted by reasoning models.
fn strip_reasoning_block(text: &str) -> String {
    let trimmed = text.trim_start();
    if let Some(rest) = trimmed.strip_prefix("<think>") {
        if let Some(end) = rest.find("</think>") {
            return rest[end + "</think>".len()..].trim().to_string();
        }
    }
    text.trim().to_string()
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}
