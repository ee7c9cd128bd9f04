use anyhow::{Context, Result};

use lexqa_lib::ingest;

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let embedder = app.embedder()?;
    let report = ingest::build_index(&app.config, embedder.as_ref()).with_context(|| {
        format!(
            "Failed to build index from {:?}",
            app.config.paths.source_dir
        )
    })?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Plain => {
            println!(
                "{} {} chunk(s) from {} page(s) in {} file(s) ({:.1}s)",
                paint("Indexed", Color::GREEN, use_color),
                report.chunks,
                report.pages,
                report.files_loaded,
                report.elapsed.as_secs_f64()
            );
            println!("Index written to {}", report.index_path.display());
            if !report.files_skipped.is_empty() {
                println!(
                    "{}",
                    paint(
                        &format!("Skipped {} file(s):", report.files_skipped.len()),
                        Color::RED,
                        use_color
                    )
                );
                for (path, reason) in &report.files_skipped {
                    println!("  {}: {}", path.display(), reason);
                }
            }
        }
    }

    Ok(())
}
