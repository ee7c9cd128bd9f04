use anyhow::Result;

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let index = app.index()?;
    let stats = index.stats();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        OutputFormat::Plain => {
            println!(
                "{}",
                paint(
                    &app.config.paths.index_path.display().to_string(),
                    Color::BOLD,
                    use_color
                )
            );
            println!("  chunks:     {}", stats.entry_count);
            println!("  sources:    {}", stats.source_count);
            println!("  pages:      {}", stats.page_count);
            println!("  model:      {} ({} dims)", stats.model_id, stats.dimensions);
            println!("  built:      {}", stats.built_at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
    }

    Ok(())
}
