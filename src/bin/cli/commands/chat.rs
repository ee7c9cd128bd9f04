use std::io::{self, BufRead, Write};

use anyhow::Result;

use lexqa_lib::assistant::Session;

use crate::app::App;
use crate::render::terminal::{paint, render_entry, Color};
use crate::OutputFormat;

/// Interactive loop: one turn per input line until `/quit`, `/exit` or EOF.
///
/// A failed turn is shown in the transcript and the loop carries on.
pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let context = app.assistant()?;
    let mut session = Session::new(&context);

    let stdin = io::stdin();
    let mut line = String::new();

    eprintln!(
        "{}",
        paint(
            &format!(
                "Ask about {} indexed chunk(s). /history shows the conversation, /quit leaves.",
                context.index().len()
            ),
            Color::DIM,
            use_color
        )
    );

    loop {
        eprint!("{} ", paint(">", Color::CYAN, use_color));
        io::stderr().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let input = line.trim();
        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/history" => {
                print_history(&session, format, use_color)?;
                continue;
            }
            _ => {}
        }

        let reply = session.ask(input);
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string(reply)?),
            OutputFormat::Plain => {
                if reply.failed {
                    println!("{}", paint(&reply.content, Color::RED, use_color));
                } else {
                    println!("{}", reply.content);
                }
                println!();
            }
        }
    }

    Ok(())
}

fn print_history(session: &Session<'_>, format: &OutputFormat, use_color: bool) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(session.transcript())?);
        }
        OutputFormat::Plain => {
            for entry in session.transcript() {
                println!("{}", render_entry(entry, use_color));
            }
        }
    }
    Ok(())
}
