//! Data models for RAG operations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where a piece of text came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    /// Path of the originating PDF file
    pub source: PathBuf,
    /// Zero-based page index within the file
    pub page: u32,
}

impl PageMetadata {
    pub fn new(source: impl Into<PathBuf>, page: u32) -> Self {
        Self {
            source: source.into(),
            page,
        }
    }

    /// File name of the source, falling back to the full path.
    pub fn source_name(&self) -> String {
        file_display_name(&self.source)
    }
}

/// Raw text of one PDF page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPage {
    pub text: String,
    pub metadata: PageMetadata,
}

impl DocumentPage {
    pub fn new(text: impl Into<String>, metadata: PageMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

/// A bounded window of page text, the atomic retrieval unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// The text content of the chunk
    pub content: String,
    /// Metadata inherited unchanged from the page
    pub metadata: PageMetadata,
    /// Index of this chunk within its page (for ordering)
    pub chunk_index: u32,
    /// Character offset of the chunk start within the page text
    pub start_char: usize,
}

impl Chunk {
    pub fn new(content: String, metadata: PageMetadata, chunk_index: u32, start_char: usize) -> Self {
        Self {
            content,
            metadata,
            chunk_index,
            start_char,
        }
    }
}

/// One element of a query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub chunk: Chunk,
    /// Cosine similarity (higher is more similar)
    pub score: f32,
}

pub(crate) fn file_display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
