//! Question answering over the built index.
//!
//! [`AssistantContext`] holds everything loaded once per process (embedding
//! model, index, completion client) and is only borrowed by each turn.

mod citations;
mod pipeline;
mod prompt;
mod session;

pub use citations::{collect_citations, render_sources, Citation};
pub use pipeline::{Answer, PipelineError, Turn, TurnState};
pub use prompt::{render_context, PromptTemplate};
pub use session::{Role, Session, TranscriptEntry};

use thiserror::Error;

use crate::config::{Config, ConfigError};
use crate::embedding::{self, check_dimensions, Embedder, EmbeddingError};
use crate::generation::{ChatCompletionsClient, GenerationError, Generator};
use crate::rag::{SearchHit, VectorIndex, VectorIndexError};

/// Errors that prevent the assistant from starting.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Embedding model unavailable: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("{0}")]
    Index(#[from] VectorIndexError),

    #[error("Completion client unavailable: {0}")]
    Generation(#[from] GenerationError),
}

/// Immutable per-process state shared by every turn.
pub struct AssistantContext {
    embedder: Box<dyn Embedder>,
    index: VectorIndex,
    generator: Box<dyn Generator>,
    prompt: PromptTemplate,
    top_k: usize,
}

impl AssistantContext {
    pub fn new(
        embedder: Box<dyn Embedder>,
        index: VectorIndex,
        generator: Box<dyn Generator>,
        prompt: PromptTemplate,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
            prompt,
            top_k,
        }
    }

    /// Load the embedding model, the persisted index and the completion
    /// client described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, StartupError> {
        config.validate()?;
        let prompt = PromptTemplate::from_config(&config.prompt)?;
        let embedder = embedding::from_config(&config.embedding)?;
        let index = VectorIndex::load_for_model(&config.paths.index_path, embedder.as_ref())?;
        let generator = ChatCompletionsClient::from_config(&config.generation)?;

        Ok(Self::new(
            embedder,
            index,
            Box::new(generator),
            prompt,
            config.retrieval.top_k,
        ))
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Embed `question` and return the `k` nearest chunks.
    pub fn retrieve(&self, question: &str, k: usize) -> Result<Vec<SearchHit>, PipelineError> {
        let mut turn = Turn::new();
        let result = self.retrieve_in_turn(&mut turn, question, k);
        if result.is_err() {
            turn.fail();
        }
        result
    }

    /// Answer `question` with the configured retrieval depth.
    pub fn answer(&self, question: &str) -> Result<Answer, PipelineError> {
        self.answer_with_k(question, self.top_k)
    }

    /// Run one full turn. Any failure aborts the turn; no partial answer
    /// is produced.
    pub fn answer_with_k(&self, question: &str, k: usize) -> Result<Answer, PipelineError> {
        self.answer_traced(question, k).0
    }

    /// Like [`answer_with_k`](Self::answer_with_k), also returning the
    /// states the turn went through. A failed turn's trace ends in
    /// [`TurnState::Failed`].
    pub fn answer_traced(
        &self,
        question: &str,
        k: usize,
    ) -> (Result<Answer, PipelineError>, Vec<TurnState>) {
        let mut turn = Turn::new();
        let result = self.run_turn(&mut turn, question, k);
        if let Err(e) = &result {
            turn.fail();
            log::warn!("Turn failed while {:?}: {}", e.stage(), e);
        }
        (result, turn.trace().to_vec())
    }

    fn run_turn(&self, turn: &mut Turn, question: &str, k: usize) -> Result<Answer, PipelineError> {
        let hits = self.retrieve_in_turn(turn, question, k)?;

        turn.advance(TurnState::Prompting);
        let prompt = self.prompt.render(question.trim(), &hits);

        turn.advance(TurnState::Generating);
        let text = self.generator.complete(&prompt)?;

        let citations = collect_citations(&hits);
        turn.advance(TurnState::Responded);

        Ok(Answer {
            question: question.to_string(),
            text,
            hits,
            citations,
            trace: turn.trace().to_vec(),
        })
    }

    fn retrieve_in_turn(
        &self,
        turn: &mut Turn,
        question: &str,
        k: usize,
    ) -> Result<Vec<SearchHit>, PipelineError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PipelineError::EmptyQuestion);
        }

        turn.advance(TurnState::EmbeddingQuery);
        let query = self.embedder.embed(question)?;
        check_dimensions(&query, self.index.dimensions())?;

        turn.advance(TurnState::Searching);
        let hits = self.index.search(&query, k);
        log::debug!("Retrieved {} chunk(s) for question", hits.len());
        Ok(hits)
    }
}
