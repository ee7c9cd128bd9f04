use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{AssistantContext, TurnState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single message in the transcript.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
    /// Set when the turn failed and `content` is the error message
    pub failed: bool,
    /// States the turn went through; empty for user entries
    pub trace: Vec<TurnState>,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    fn new(role: Role, content: String, failed: bool, trace: Vec<TurnState>) -> Self {
        Self {
            role,
            content,
            failed,
            trace,
            timestamp: Utc::now(),
        }
    }
}

/// A conversation against a shared context, kept in memory only.
///
/// The transcript is append-only; a failed turn appends an error message
/// instead of an answer so the conversation can continue.
pub struct Session<'a> {
    context: &'a AssistantContext,
    transcript: Vec<TranscriptEntry>,
}

impl<'a> Session<'a> {
    pub fn new(context: &'a AssistantContext) -> Self {
        Self {
            context,
            transcript: Vec::new(),
        }
    }

    /// Run one turn and return the assistant's reply.
    pub fn ask(&mut self, question: &str) -> &TranscriptEntry {
        self.transcript.push(TranscriptEntry::new(
            Role::User,
            question.to_string(),
            false,
            Vec::new(),
        ));

        let (result, trace) = self.context.answer_traced(question, self.context.top_k());
        let reply = match result {
            Ok(answer) => TranscriptEntry::new(Role::Assistant, answer.render(), false, trace),
            Err(e) => TranscriptEntry::new(Role::Assistant, format!("Error: {}", e), true, trace),
        };
        self.transcript.push(reply);

        // Just pushed
        &self.transcript[self.transcript.len() - 1]
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }
}
