//! lexqa: grounded question answering over a corpus of legal PDFs.
//!
//! Build time: [`ingest::build_index`] loads every PDF page, splits pages into
//! overlapping character windows, embeds them and writes a
//! [`rag::VectorIndex`] artifact.
//!
//! Query time: [`assistant::AssistantContext`] embeds a question, retrieves
//! the nearest chunks, stuffs them into one prompt and asks the completion
//! model, then appends deduplicated source citations.

pub mod assistant;
pub mod config;
pub mod embedding;
pub mod generation;
pub mod ingest;
pub mod rag;
#[doc(hidden)]
pub mod test_support;

pub use assistant::{Answer, AssistantContext, PipelineError, Session, StartupError, TurnState};
pub use config::Config;
pub use embedding::{Embedder, EmbeddingError};
pub use generation::{GenerationError, Generator};
pub use rag::{Chunk, DocumentPage, PageMetadata, SearchHit, VectorIndex, VectorIndexError};
