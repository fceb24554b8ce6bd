//! Question commands (interactive chat, one-shot ask)

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use bizcast_core::{Assistant, AssistantConfig, Error, RecordSource, Regressor};

use super::{format_answer, open_assistant};

/// Inputs that end the interactive loop
const EXIT_WORDS: &[&str] = &["exit", "quit", "keluar"];

pub fn cmd_chat(config: &AssistantConfig) -> Result<()> {
    let assistant = open_assistant(config)?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    run_chat(&assistant, config, stdin.lock(), &mut stdout)
}

/// Read questions line by line until EOF or an exit word
pub fn run_chat<S, M, R, W>(
    assistant: &Assistant<S, M>,
    config: &AssistantConfig,
    mut input: R,
    output: &mut W,
) -> Result<()>
where
    S: RecordSource,
    M: Regressor,
    R: BufRead,
    W: Write,
{
    writeln!(output, "💼 bizcast is ready, ask me something...")?;
    writeln!(
        output,
        "💡 Examples: 'What is my profit today?', 'Am I at a loss this week?'"
    )?;
    writeln!(output, "Type 'exit' to quit.")?;
    writeln!(output)?;

    let mut buf = Vec::new();
    loop {
        write!(output, "You: ")?;
        output.flush()?;

        buf.clear();
        if input
            .read_until(b'\n', &mut buf)
            .context("Failed to read input")?
            == 0
        {
            writeln!(output)?;
            break;
        }
        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                writeln!(output, "⚠️  Could not read that line: {}\n", e)?;
                continue;
            }
        };
        let question = line.trim();

        if question.is_empty() {
            continue;
        }
        if EXIT_WORDS.iter().any(|w| question.eq_ignore_ascii_case(w)) {
            writeln!(output, "👋 Goodbye!")?;
            break;
        }

        match assistant.answer(question) {
            Ok(answer) => writeln!(output, "{}\n", format_answer(&answer, config))?,
            Err(e) => writeln!(output, "⚠️  {}\n", e)?,
        }
    }

    Ok(())
}

pub fn cmd_ask(config: &AssistantConfig, question: &str, json: bool) -> Result<()> {
    let assistant = open_assistant(config)?;

    match assistant.answer(question) {
        Ok(answer) if json => {
            println!("{}", serde_json::to_string_pretty(&answer)?);
        }
        Ok(answer) => {
            println!("{}", format_answer(&answer, config));
        }
        Err(e @ Error::NoMatchingData { .. }) => {
            println!("⚠️  {}", e);
        }
        Err(e) => return Err(e).context("Failed to answer question"),
    }

    Ok(())
}
