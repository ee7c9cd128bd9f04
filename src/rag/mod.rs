//! RAG (Retrieval-Augmented Generation) ingestion and retrieval core.

mod chunker;
mod index;
mod loader;
mod models;

pub use chunker::{chunk_page, chunk_pages, expected_chunk_count};
pub use index::{IndexStats, VectorIndex, VectorIndexError};
pub use loader::{load_directory, load_directory_with_report, load_pdf, LoaderError, LoaderReport};
pub use models::{Chunk, DocumentPage, PageMetadata, SearchHit};

