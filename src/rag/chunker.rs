//! Content chunking for RAG indexing.
//!
//! Pages are split with a fixed-size sliding window measured in characters:
//! each window holds up to `chunk_size` characters and the next one starts
//! `chunk_size - chunk_overlap` characters later. Unlike a boundary-seeking
//! splitter, window positions depend only on the text length, so identical
//! input always produces identical chunk boundaries.

use crate::config::ChunkingConfig;

use super::models::{Chunk, DocumentPage};

/// Chunk a sequence of pages, preserving page order.
pub fn chunk_pages(pages: &[DocumentPage], config: &ChunkingConfig) -> Vec<Chunk> {
    pages
        .iter()
        .flat_map(|page| chunk_page(page, config))
        .collect()
}

/// Chunk a single page into embedding-ready windows.
pub fn chunk_page(page: &DocumentPage, config: &ChunkingConfig) -> Vec<Chunk> {
    sliding_window(&page.text, config.chunk_size, config.chunk_overlap)
        .into_iter()
        .enumerate()
        .map(|(index, (content, start))| {
            Chunk::new(content, page.metadata.clone(), index as u32, start)
        })
        .collect()
}

/// Number of chunks [`chunk_page`] produces for a page holding `text`.
pub fn expected_chunk_count(text: &str, config: &ChunkingConfig) -> usize {
    if text.trim().is_empty() {
        return 0;
    }

    let char_count = text.chars().count();
    if char_count <= config.chunk_size {
        1
    } else {
        (char_count - config.chunk_overlap).div_ceil(config.stride())
    }
}

/// Split text into overlapping windows.
/// Returns tuples of (chunk_text, start_char).
fn sliding_window(text: &str, max_chars: usize, overlap: usize) -> Vec<(String, usize)> {
    if text.trim().is_empty() || max_chars == 0 {
        return Vec::new();
    }

    // Byte offset of every char, plus the end of the text
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_count = boundaries.len() - 1;

    let step = max_chars.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + max_chars).min(char_count);
        chunks.push((text[boundaries[start]..boundaries[end]].to_string(), start));
        if end == char_count {
            break;
        }
        start += step;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::models::PageMetadata;

    fn page(text: &str, index: u32) -> DocumentPage {
        DocumentPage::new(text, PageMetadata::new("act.pdf", index))
    }

    #[test]
    fn test_sliding_window_small_text() {
        let chunks = sliding_window("Hello world", 1000, 100);
        assert_eq!(chunks, vec![("Hello world".to_string(), 0)]);
    }

    #[test]
    fn test_sliding_window_exact_size() {
        let text = "a".repeat(500);
        let chunks = sliding_window(&text, 500, 50);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].0.len(), 500);
    }

    #[test]
    fn test_windows_advance_by_stride() {
        let text: String = (0..1234).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = sliding_window(&text, 200, 30);

        for (i, (content, start)) in chunks.iter().enumerate() {
            assert_eq!(*start, i * 170);
            assert_eq!(content, &text[*start..(*start + 200).min(text.len())]);
            if i + 1 < chunks.len() {
                assert_eq!(content.len(), 200);
            }
        }

        let (last, last_start) = chunks.last().unwrap();
        assert!(last.len() <= 200);
        assert_eq!(last_start + last.len(), text.len());
        assert_eq!(chunks.len(), expected_chunk_count(&text, &ChunkingConfig::new(200, 30).unwrap()));
    }

    #[test]
    fn test_overlap_is_shared_text() {
        let text = "The Nigeria Data Protection Act establishes the Commission. ".repeat(40);
        let chunks = sliding_window(&text, 120, 20);
        for pair in chunks.windows(2) {
            let prev = &pair[0].0;
            let next = &pair[1].0;
            assert_eq!(&prev[prev.len() - 20..], &next[..20]);
        }
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let text = "é".repeat(25);
        let chunks = sliding_window(&text, 10, 2);
        assert_eq!(chunks[0].0.chars().count(), 10);
        assert_eq!(chunks[1].1, 8);
        assert_eq!(chunks.len(), expected_chunk_count(&text, &ChunkingConfig::new(10, 2).unwrap()));
    }

    #[test]
    fn test_blank_page_yields_nothing() {
        let config = ChunkingConfig::default();
        assert!(chunk_page(&page("", 0), &config).is_empty());
        assert!(chunk_page(&page(" \n\t ", 0), &config).is_empty());
    }

    #[test]
    fn test_chunks_inherit_metadata() {
        let config = ChunkingConfig::new(10, 2).unwrap();
        let pages = vec![page("abcdefghijklmnop", 0), page("short", 1)];
        let chunks = chunk_pages(&pages, &config);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].metadata, pages[0].metadata);
        assert_eq!(chunks[1].metadata, pages[0].metadata);
        assert_eq!(chunks[1].chunk_index, 1);
        assert_eq!(chunks[2].metadata, pages[1].metadata);
        assert_eq!(chunks[2].content, "short");
        assert_eq!(chunks[2].chunk_index, 0);
    }

    #[test]
    fn test_deterministic() {
        let config = ChunkingConfig::default();
        let pages = vec![page(&"Section 12. Unlawful access. ".repeat(90), 3)];
        assert_eq!(chunk_pages(&pages, &config), chunk_pages(&pages, &config));
    }

    #[test]
    fn test_expected_chunk_count() {
        let config = ChunkingConfig::default();
        assert_eq!(expected_chunk_count("", &config), 0);
        assert_eq!(expected_chunk_count(&"a".repeat(499), &config), 1);
        assert_eq!(expected_chunk_count(&"a".repeat(500), &config), 1);
        assert_eq!(expected_chunk_count(&"a".repeat(950), &config), 2);
        assert_eq!(expected_chunk_count(&"a".repeat(951), &config), 3);
    }

    #[test]
    fn test_expected_count_agrees_with_chunk_page() {
        let config = ChunkingConfig::new(10, 2).unwrap();
        for text in ["", " \n\t ", "short", "abcdefghijklmnop", "  padded text that runs on  "] {
            assert_eq!(
                expected_chunk_count(text, &config),
                chunk_page(&page(text, 0), &config).len(),
                "text {:?}",
                text
            );
        }
    }
}
