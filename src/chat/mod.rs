//! Interactive query REPL.
//!
//! Reads queries with [`rustyline`] (history, line editing) and answers each
//! one with a fresh conversation: no context is carried between queries.
//! Input comes through the [`LineSource`] seam so the loop can be driven
//! from tests without a terminal.

mod commands;

use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write;
use std::path::PathBuf;

use crate::agent::ConversationLoop;
use crate::config::Config;
use crate::constants::{HISTORY_FILENAME, QUIT_COMMAND};
use crate::format;

/// Result of asking a [`LineSource`] for the next line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Ctrl+C: the current line was abandoned.
    Interrupted,
    /// Ctrl+D or closed input.
    Eof,
}

/// Where the REPL gets its input from.
pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome>;

    fn add_history(&mut self, _line: &str) {}
}

/// Terminal input with history persisted to `~/.cache/mcp-client/chat_history.txt`.
pub struct Readline {
    editor: DefaultEditor,
    history_path: PathBuf,
}

impl Readline {
    pub fn open() -> Result<Self> {
        let mut editor = DefaultEditor::new()?;
        let history_path = Config::cache_dir()?.join(HISTORY_FILENAME);
        if history_path.exists() {
            let _ = editor.load_history(&history_path);
        }
        Ok(Self {
            editor,
            history_path,
        })
    }

    pub fn save(&mut self) -> Result<()> {
        if let Some(parent) = self.history_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if let Err(e) = self.editor.save_history(&self.history_path) {
            tracing::debug!("failed to save history: {e}");
        }
        Ok(())
    }
}

impl LineSource for Readline {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadOutcome::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(e) => Err(e.into()),
        }
    }

    fn add_history(&mut self, line: &str) {
        let _ = self.editor.add_history_entry(line);
    }
}

/// How a trimmed input line is handled.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Empty,
    Command(&'a str),
    Query(&'a str),
}

fn classify(line: &str) -> Input<'_> {
    let line = line.trim();
    if line.is_empty() {
        Input::Empty
    } else if line.eq_ignore_ascii_case(QUIT_COMMAND) {
        Input::Quit
    } else if line.starts_with('/') {
        Input::Command(line)
    } else {
        Input::Query(line)
    }
}

/// Runs the interactive loop on the terminal until `quit` or Ctrl+D.
pub async fn run_chat(chat: &ConversationLoop<'_>, model: &str) -> Result<()> {
    let mut input = Readline::open()?;

    println!(
        "{} [model: {}]",
        "MCP Client Started!".bold().cyan(),
        model.yellow(),
    );
    println!(
        "{}",
        format!("Type your queries or '{QUIT_COMMAND}' to exit.").dimmed()
    );

    let mut stdout = std::io::stdout();
    let outcome = run_repl(chat, &mut input, &mut stdout).await;
    input.save()?;
    outcome
}

/// The REPL proper. Query failures are reported as one line and the loop
/// keeps going; only input errors end it early.
pub async fn run_repl<W: Write>(
    chat: &ConversationLoop<'_>,
    input: &mut dyn LineSource,
    out: &mut W,
) -> Result<()> {
    let prompt = format!("{} ", "Query:".green().bold());

    loop {
        let line = match input.read_line(&prompt)? {
            ReadOutcome::Line(line) => line,
            ReadOutcome::Interrupted => {
                writeln!(out, "{}", "^C".dimmed())?;
                continue;
            }
            ReadOutcome::Eof => {
                writeln!(out, "{}", "goodbye.".dimmed())?;
                break;
            }
        };

        match classify(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::Command(command) => {
                match commands::handle_slash_command(command, chat.tools(), out)? {
                    commands::CommandAction::Continue => {}
                    commands::CommandAction::Unknown(cmd) => {
                        writeln!(out, "{} Unknown command: {}", "?".yellow(), cmd)?;
                    }
                }
            }
            Input::Query(query) => {
                input.add_history(query);
                answer(chat, query, out).await?;
            }
        }
    }

    Ok(())
}

/// Answers a single query. Used by the REPL and by one-shot `--query` mode.
///
/// Returns `Ok(false)` when the query failed; the failure has already been
/// written to `out`.
pub async fn answer<W: Write>(
    chat: &ConversationLoop<'_>,
    query: &str,
    out: &mut W,
) -> Result<bool> {
    match chat.process_query(query).await {
        Ok(response) => {
            writeln!(out, "\n{}", format::render_answer(&response))?;
            Ok(true)
        }
        Err(e) => {
            tracing::debug!("query failed: {e:?}");
            let message = one_line(&e.to_string());
            writeln!(out, "\n{} {}", "error:".red().bold(), message)?;
            Ok(false)
        }
    }
}

/// Collapses line breaks and runs of whitespace, e.g. from an HTML error body.
fn one_line(message: &str) -> String {
    message.split_whitespace().collect::<Vec<_>>().join(" ")
}
