//! Prompt assembly: "stuff" every retrieved chunk into one context block.

use crate::config::{ConfigError, PromptConfig, CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER};
use crate::rag::SearchHit;

/// Separator between chunk texts in the context block.
const CONTEXT_SEPARATOR: &str = "\n\n";

/// Instruction template with `{context}` and `{question}` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self, ConfigError> {
        let template = template.into();
        for placeholder in [CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(ConfigError::InvalidValue {
                    field: "prompt.template",
                    message: format!("missing {} placeholder", placeholder),
                });
            }
        }
        Ok(Self { template })
    }

    pub fn from_config(config: &PromptConfig) -> Result<Self, ConfigError> {
        Self::new(config.template.clone())
    }

    /// Fill the template with the hits (in retrieval order) and the question.
    ///
    /// Placeholders are substituted in one pass over the template, so text
    /// inside the context or the question is never re-expanded.
    pub fn render(&self, question: &str, hits: &[SearchHit]) -> String {
        let context = render_context(hits);
        self.template
            .split(CONTEXT_PLACEHOLDER)
            .map(|part| part.replace(QUESTION_PLACEHOLDER, question))
            .collect::<Vec<_>>()
            .join(&context)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: PromptConfig::default().template,
        }
    }
}

/// Concatenate chunk texts, preserving order.
pub fn render_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| hit.chunk.content.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}
