//! Vector index for semantic search, persisted as a single SQLite file.
//!
//! The index is built once in a batch and is read-only afterwards. Search is
//! an exact brute-force cosine scan over entries held in memory, which is
//! plenty for a corpus of a few thousand chunks.
//!
//! Loading reads plain rows and raw little-endian `f32` blobs; nothing in the
//! artifact is executed or deserialized into arbitrary objects. Structural
//! fields are still validated, and only artifacts written by
//! [`VectorIndex::save`] are supported.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags};
use serde::Serialize;
use thiserror::Error;

use crate::embedding::{check_dimensions, Embedder, EmbeddingError};

use super::models::{Chunk, PageMetadata, SearchHit};

/// Bumped whenever the on-disk layout changes.
const FORMAT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum VectorIndexError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector index not found at {path:?}: {reason}")]
    IndexNotFound { path: PathBuf, reason: String },

    #[error(
        "Index was built with {found_model} ({found_dimensions} dims) but the embedder is {expected_model} ({expected_dimensions} dims)"
    )]
    ModelMismatch {
        expected_model: String,
        expected_dimensions: usize,
        found_model: String,
        found_dimensions: usize,
    },

    #[error("Chunk count ({chunks}) doesn't match embedding count ({embeddings})")]
    CountMismatch { chunks: usize, embeddings: usize },
}

pub type Result<T> = std::result::Result<T, VectorIndexError>;

struct IndexEntry {
    embedding: Vec<f32>,
    chunk: Chunk,
}

/// Read-only collection of embedded chunks in insertion order.
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    model_id: String,
    dimensions: usize,
    built_at: DateTime<Utc>,
}

impl VectorIndex {
    /// Embed every chunk and hold the result in memory.
    pub fn from_chunks(
        chunks: Vec<Chunk>,
        embedder: &dyn Embedder,
        batch_size: usize,
    ) -> Result<Self> {
        let dimensions = embedder.dimensions();
        let mut entries = Vec::with_capacity(chunks.len());
        let total = chunks.len();

        let mut remaining = chunks.into_iter().peekable();
        while remaining.peek().is_some() {
            let batch: Vec<Chunk> = remaining.by_ref().take(batch_size.max(1)).collect();
            let texts: Vec<&str> = batch.iter().map(|c| c.content.as_str()).collect();
            let embeddings = embedder.embed_batch(&texts)?;

            if embeddings.len() != batch.len() {
                return Err(VectorIndexError::CountMismatch {
                    chunks: batch.len(),
                    embeddings: embeddings.len(),
                });
            }

            for (chunk, embedding) in batch.into_iter().zip(embeddings) {
                check_dimensions(&embedding, dimensions)?;
                entries.push(IndexEntry { embedding, chunk });
            }
            log::debug!("Embedded {}/{} chunks", entries.len(), total);
        }

        Ok(Self {
            entries,
            model_id: embedder.model_id().to_string(),
            dimensions,
            built_at: Utc::now(),
        })
    }

    /// Embed every chunk and persist the index to `path`.
    pub fn build(
        chunks: Vec<Chunk>,
        embedder: &dyn Embedder,
        batch_size: usize,
        path: &Path,
    ) -> Result<Self> {
        let index = Self::from_chunks(chunks, embedder, batch_size)?;
        index.save(path)?;
        Ok(index)
    }

    /// Write the index to `path`, replacing any previous artifact.
    ///
    /// The bundle is written to a sibling temporary file and renamed into
    /// place, so readers see either the old index or the complete new one.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let staging = staging_path(path);
        if staging.exists() {
            fs::remove_file(&staging)?;
        }

        if let Err(e) = self.write_bundle(&staging) {
            let _ = fs::remove_file(&staging);
            return Err(e);
        }

        fs::rename(&staging, path)?;
        log::info!(
            "Saved vector index with {} entries to {:?}",
            self.entries.len(),
            path
        );
        Ok(())
    }

    fn write_bundle(&self, path: &Path) -> Result<()> {
        let mut conn = Connection::open(path)?;

        conn.execute_batch(
            r#"
            -- Build parameters
            CREATE TABLE manifest (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            -- Chunks with their embeddings, in insertion order
            CREATE TABLE entries (
                position INTEGER PRIMARY KEY,
                source TEXT NOT NULL,
                page INTEGER NOT NULL,
                chunk_index INTEGER NOT NULL,
                start_char INTEGER NOT NULL,
                content TEXT NOT NULL,
                embedding BLOB NOT NULL
            );
            "#,
        )?;

        let tx = conn.transaction()?;

        let manifest = [
            ("format_version", FORMAT_VERSION.to_string()),
            ("model_id", self.model_id.clone()),
            ("dimensions", self.dimensions.to_string()),
            ("entry_count", self.entries.len().to_string()),
            ("built_at", self.built_at.to_rfc3339()),
        ];
        for (key, value) in &manifest {
            tx.execute(
                "INSERT INTO manifest (key, value) VALUES (?1, ?2)",
                params![key, value],
            )?;
        }

        for (position, entry) in self.entries.iter().enumerate() {
            // Store embedding as binary blob (f32 little-endian)
            let embedding_bytes: Vec<u8> = entry
                .embedding
                .iter()
                .flat_map(|f| f.to_le_bytes())
                .collect();

            tx.execute(
                "INSERT INTO entries (position, source, page, chunk_index, start_char, content, embedding) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    position as i64,
                    entry.chunk.metadata.source.to_string_lossy().into_owned(),
                    entry.chunk.metadata.page,
                    entry.chunk.chunk_index,
                    entry.chunk.start_char as i64,
                    entry.chunk.content,
                    embedding_bytes,
                ],
            )?;
        }

        tx.commit()?;
        conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }

    /// Open a persisted index.
    ///
    /// Fails with [`VectorIndexError::IndexNotFound`] when the artifact is
    /// absent or cannot be read back as a complete index.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(VectorIndexError::IndexNotFound {
                path: path.to_path_buf(),
                reason: "no index artifact; run `lexqa ingest` first".to_string(),
            });
        }

        let index = read_bundle(path).map_err(|e| VectorIndexError::IndexNotFound {
            path: path.to_path_buf(),
            reason: format!("corrupt index artifact ({})", e),
        })?;

        log::info!(
            "Loaded vector index with {} entries ({}, {} dims) from {:?}",
            index.entries.len(),
            index.model_id,
            index.dimensions,
            path
        );
        Ok(index)
    }

    /// Open a persisted index and check it was built by `embedder`'s model.
    pub fn load_for_model(path: &Path, embedder: &dyn Embedder) -> Result<Self> {
        let index = Self::load(path)?;
        if index.model_id != embedder.model_id() || index.dimensions != embedder.dimensions() {
            return Err(VectorIndexError::ModelMismatch {
                expected_model: embedder.model_id().to_string(),
                expected_dimensions: embedder.dimensions(),
                found_model: index.model_id,
                found_dimensions: index.dimensions,
            });
        }
        Ok(index)
    }

    /// Up to `k` entries most similar to `query`, best first.
    ///
    /// Ties keep insertion order. `k == 0` yields nothing and `k` beyond the
    /// index size yields every entry.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        if k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(f32, &IndexEntry)> = self
            .entries
            .iter()
            .map(|entry| (cosine_similarity(query, &entry.embedding), entry))
            .collect();

        // Stable sort: equal scores stay in insertion order
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(k)
            .map(|(score, entry)| SearchHit {
                chunk: entry.chunk.clone(),
                score,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Chunks in insertion order.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|entry| &entry.chunk)
    }

    /// Get statistics about the index.
    pub fn stats(&self) -> IndexStats {
        let sources: HashSet<&Path> = self
            .entries
            .iter()
            .map(|e| e.chunk.metadata.source.as_path())
            .collect();
        let pages: HashSet<&PageMetadata> =
            self.entries.iter().map(|e| &e.chunk.metadata).collect();

        IndexStats {
            entry_count: self.entries.len() as u64,
            source_count: sources.len() as u64,
            page_count: pages.len() as u64,
            dimensions: self.dimensions,
            model_id: self.model_id.clone(),
            built_at: self.built_at,
        }
    }
}

/// Statistics about the vector index.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexStats {
    pub entry_count: u64,
    pub source_count: u64,
    pub page_count: u64,
    pub dimensions: usize,
    pub model_id: String,
    pub built_at: DateTime<Utc>,
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".building");
    PathBuf::from(name)
}

fn read_bundle(path: &Path) -> std::result::Result<VectorIndex, String> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| e.to_string())?;

    let manifest = |key: &str| -> std::result::Result<String, String> {
        conn.query_row(
            "SELECT value FROM manifest WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .map_err(|e| format!("manifest {}: {}", key, e))
    };

    let version: u32 = manifest("format_version")?
        .parse()
        .map_err(|_| "unparseable format version".to_string())?;
    if version != FORMAT_VERSION {
        return Err(format!("unsupported format version {}", version));
    }

    let model_id = manifest("model_id")?;
    let dimensions: usize = manifest("dimensions")?
        .parse()
        .map_err(|_| "unparseable dimensions".to_string())?;
    let entry_count: usize = manifest("entry_count")?
        .parse()
        .map_err(|_| "unparseable entry count".to_string())?;
    let built_at = DateTime::parse_from_rfc3339(&manifest("built_at")?)
        .map_err(|e| format!("unparseable build time: {}", e))?
        .with_timezone(&Utc);

    let mut stmt = conn
        .prepare(
            "SELECT source, page, chunk_index, start_char, content, embedding FROM entries ORDER BY position",
        )
        .map_err(|e| e.to_string())?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,  // source
                row.get::<_, u32>(1)?,     // page
                row.get::<_, u32>(2)?,     // chunk_index
                row.get::<_, i64>(3)?,     // start_char
                row.get::<_, String>(4)?,  // content
                row.get::<_, Vec<u8>>(5)?, // embedding
            ))
        })
        .map_err(|e| e.to_string())?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| e.to_string())?;

    if rows.len() != entry_count {
        return Err(format!(
            "manifest lists {} entries, found {}",
            entry_count,
            rows.len()
        ));
    }

    let mut entries = Vec::with_capacity(rows.len());
    for (source, page, chunk_index, start_char, content, embedding_bytes) in rows {
        if embedding_bytes.len() != dimensions * 4 {
            return Err(format!(
                "embedding blob of {} bytes for {} dimensions",
                embedding_bytes.len(),
                dimensions
            ));
        }
        let start_char =
            usize::try_from(start_char).map_err(|_| "negative chunk offset".to_string())?;

        entries.push(IndexEntry {
            embedding: deserialize_embedding(&embedding_bytes),
            chunk: Chunk::new(
                content,
                PageMetadata::new(source, page),
                chunk_index,
                start_char,
            ),
        });
    }

    Ok(VectorIndex {
        entries,
        model_id,
        dimensions,
        built_at,
    })
}

/// Deserialize embedding from binary blob.
fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Calculate cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot_product = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (x, y) in a.iter().zip(b.iter()) {
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = (norm_a * norm_b).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    dot_product / denominator
}
