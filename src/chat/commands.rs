//! Slash command handlers for the REPL.
//!
//! Dispatches `/tools` and `/help`. Returns a [`CommandAction`] so the REPL
//! loop can decide how to proceed.

use colored::Colorize;
use std::io::{self, Write};

use crate::constants::QUIT_COMMAND;
use crate::format;
use crate::tools::ToolDescriptor;

/// Action returned by slash command handling.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CommandAction {
    /// Command was handled; continue the REPL loop.
    Continue,
    /// Unrecognized command.
    Unknown(String),
}

pub(crate) fn handle_slash_command<W: Write>(
    command: &str,
    tools: &[ToolDescriptor],
    out: &mut W,
) -> io::Result<CommandAction> {
    match command {
        "/tools" => {
            writeln!(out, "{}", "Tools:".bold())?;
            writeln!(out, "{}", format::format_tool_list(tools))?;
            Ok(CommandAction::Continue)
        }
        "/help" => {
            writeln!(out, "{}", "Commands:".bold())?;
            writeln!(out, "  {} - list the server's tools", "/tools".cyan())?;
            writeln!(out, "  {} - show this help", "/help".cyan())?;
            writeln!(out, "  {} - exit", QUIT_COMMAND.cyan())?;
            writeln!(out, "  {} - exit", "Ctrl+D".cyan())?;
            Ok(CommandAction::Continue)
        }
        _ => Ok(CommandAction::Unknown(command.to_string())),
    }
}
