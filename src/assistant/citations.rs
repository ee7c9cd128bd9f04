//! Source citations appended to answers.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::rag::{PageMetadata, SearchHit};

/// One (source file, page) pair backing an answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub source: String,
    pub page: u32,
}

impl From<&PageMetadata> for Citation {
    fn from(metadata: &PageMetadata) -> Self {
        Self {
            source: metadata.source_name(),
            page: metadata.page,
        }
    }
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (page {})", self.source, self.page)
    }
}

/// Unique citations across `hits`, in order of first appearance.
pub fn collect_citations(hits: &[SearchHit]) -> Vec<Citation> {
    let mut seen = HashSet::new();
    hits.iter()
        .filter(|hit| seen.insert(&hit.chunk.metadata))
        .map(|hit| Citation::from(&hit.chunk.metadata))
        .collect()
}

/// Markdown source list, empty when there is nothing to cite.
pub fn render_sources(citations: &[Citation]) -> String {
    if citations.is_empty() {
        return String::new();
    }
    let lines: Vec<String> = citations.iter().map(|c| format!("- {}", c)).collect();
    format!("\n\n**Sources:**\n{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::Chunk;

    fn hit(source: &str, page: u32, index: u32) -> SearchHit {
        SearchHit {
            chunk: Chunk::new(format!("chunk {}", index), PageMetadata::new(source, page), index, 0),
            score: 1.0,
        }
    }

    #[test]
    fn test_same_page_cited_once() {
        let hits = vec![
            hit("docs/Cybercrimes Act.pdf", 3, 0),
            hit("docs/Cybercrimes Act.pdf", 3, 1),
            hit("docs/NDPA.pdf", 3, 0),
        ];
        let citations = collect_citations(&hits);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].to_string(), "Cybercrimes Act.pdf (page 3)");
        assert_eq!(citations[1].to_string(), "NDPA.pdf (page 3)");
    }

    #[test]
    fn test_render_sources() {
        let citations = collect_citations(&[hit("a.pdf", 0, 0), hit("a.pdf", 1, 0)]);
        assert_eq!(
            render_sources(&citations),
            "\n\n**Sources:**\n- a.pdf (page 0)\n- a.pdf (page 1)"
        );
        assert_eq!(render_sources(&[]), "");
    }
}
