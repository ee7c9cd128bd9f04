use anyhow::Result;

use crate::app::App;
use crate::render::terminal::{paint, render_hit, Color};
use crate::OutputFormat;

/// Show the chunks a question would retrieve, without calling the
/// completion model.
pub fn run(app: &App, query: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let context = app.assistant()?;
    let hits = context.retrieve(query, context.top_k())?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&hits)?);
        }
        OutputFormat::Plain => {
            if hits.is_empty() {
                println!("{}", paint("No results.", Color::DIM, use_color));
                return Ok(());
            }
            for (i, hit) in hits.iter().enumerate() {
                println!("{}", render_hit(i + 1, hit, use_color));
                println!();
            }
        }
    }

    Ok(())
}
