//! Per-turn state machine for retrieval + generation.

use serde::Serialize;
use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::generation::GenerationError;
use crate::rag::SearchHit;

use super::citations::{render_sources, Citation};

/// Where a turn is in the retrieve-then-generate sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TurnState {
    Idle,
    EmbeddingQuery,
    Searching,
    Prompting,
    Generating,
    Responded,
    Failed,
}

impl TurnState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Responded | Self::Failed)
    }

    /// Successor on the success path.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::EmbeddingQuery),
            Self::EmbeddingQuery => Some(Self::Searching),
            Self::Searching => Some(Self::Prompting),
            Self::Prompting => Some(Self::Generating),
            Self::Generating => Some(Self::Responded),
            Self::Responded | Self::Failed => None,
        }
    }

    /// `Failed` is reachable from every non-terminal state.
    pub fn can_advance_to(self, target: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        target == Self::Failed || self.next() == Some(target)
    }
}

/// Tracks the states one turn passes through.
#[derive(Debug, Clone)]
pub struct Turn {
    trace: Vec<TurnState>,
}

impl Turn {
    pub fn new() -> Self {
        Self {
            trace: vec![TurnState::Idle],
        }
    }

    pub fn state(&self) -> TurnState {
        self.trace.last().copied().unwrap_or(TurnState::Idle)
    }

    pub fn trace(&self) -> &[TurnState] {
        &self.trace
    }

    pub(crate) fn advance(&mut self, target: TurnState) {
        let current = self.state();
        debug_assert!(
            current.can_advance_to(target),
            "illegal turn transition {:?} -> {:?}",
            current,
            target
        );
        log::debug!("turn: {:?} -> {:?}", current, target);
        self.trace.push(target);
    }

    pub(crate) fn fail(&mut self) {
        if !self.state().is_terminal() {
            self.advance(TurnState::Failed);
        }
    }
}

impl Default for Turn {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Question is empty")]
    EmptyQuestion,

    #[error("Embedding the question failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Answer generation failed: {0}")]
    Generation(#[from] GenerationError),
}

impl PipelineError {
    /// The state the turn was in when it failed.
    pub fn stage(&self) -> TurnState {
        match self {
            Self::EmptyQuestion => TurnState::Idle,
            Self::Embedding(_) => TurnState::EmbeddingQuery,
            Self::Generation(_) => TurnState::Generating,
        }
    }
}

/// A grounded answer with the evidence it was generated from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question: String,
    /// Completion text as returned by the model
    pub text: String,
    /// Retrieved chunks, best first
    pub hits: Vec<SearchHit>,
    pub citations: Vec<Citation>,
    pub trace: Vec<TurnState>,
}

impl Answer {
    /// Answer text followed by the source list.
    pub fn render(&self) -> String {
        format!("{}{}", self.text, render_sources(&self.citations))
    }
}
