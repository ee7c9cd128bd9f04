use anyhow::Result;

use crate::app::App;
use crate::render::terminal::render_answer;
use crate::OutputFormat;

/// Answer a single question and exit. A failed turn is an error.
pub fn run(app: &App, question: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let context = app.assistant()?;
    let answer = context.answer(question)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&answer)?);
        }
        OutputFormat::Plain => {
            println!("{}", render_answer(&answer.text, &answer.citations, use_color));
        }
    }

    Ok(())
}
