use lexqa_lib::assistant::{Citation, TranscriptEntry};
use lexqa_lib::rag::SearchHit;

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const CYAN: &str = "\x1b[36m";
}

/// Wrap `text` in `color` when colors are enabled.
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// Answer text followed by the source list, matching [`Answer::render`] when
/// colors are off.
///
/// [`Answer::render`]: lexqa_lib::assistant::Answer::render
pub fn render_answer(text: &str, citations: &[Citation], use_color: bool) -> String {
    if !use_color || citations.is_empty() {
        return format!("{}{}", text, lexqa_lib::assistant::render_sources(citations));
    }

    let mut out = String::from(text);
    out.push_str("\n\n");
    out.push_str(&paint("Sources:", Color::BOLD, true));
    for citation in citations {
        out.push('\n');
        out.push_str(&paint(&format!("- {}", citation), Color::DIM, true));
    }
    out
}

/// One block per hit: rank, score, location and a preview of the chunk.
pub fn render_hit(rank: usize, hit: &SearchHit, use_color: bool) -> String {
    let location = format!(
        "{} (page {})",
        hit.chunk.metadata.source_name(),
        hit.chunk.metadata.page
    );
    let header = format!(
        "{}. {}  {}",
        rank,
        paint(&location, Color::CYAN, use_color),
        paint(&format!("score {:.4}", hit.score), Color::DIM, use_color)
    );
    format!("{}\n{}", header, indent(&preview(&hit.chunk.content, 240), "   "))
}

pub fn render_entry(entry: &TranscriptEntry, use_color: bool) -> String {
    let color = if entry.failed { Color::RED } else { Color::GREEN };
    let label = match entry.role {
        lexqa_lib::assistant::Role::User => paint("you", Color::BOLD, use_color),
        lexqa_lib::assistant::Role::Assistant => paint("assistant", color, use_color),
    };
    format!(
        "[{}] {}:\n{}",
        entry.timestamp.format("%H:%M:%S"),
        label,
        indent(&entry.content, "  ")
    )
}

/// First `max_chars` characters of `text` on a single line.
fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}

fn indent(text: &str, prefix: &str) -> String {
    text.lines()
        .map(|line| format!("{}{}", prefix, line))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("a  b\nc", 10), "a b c");
        assert_eq!(preview("§§§§§", 3), "§§§...");
    }

    #[test]
    fn test_plain_answer_matches_library_rendering() {
        let citations = vec![Citation {
            source: "act.pdf".to_string(),
            page: 4,
        }];
        assert_eq!(
            render_answer("Section 6.", &citations, false),
            "Section 6.\n\n**Sources:**\n- act.pdf (page 4)"
        );
        assert_eq!(render_answer("I don't know.", &[], true), "I don't know.");
    }
}
