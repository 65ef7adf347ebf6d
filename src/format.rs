//! Terminal styling for query answers.
//!
//! Tool-call marker lines are dimmed, fenced code blocks are indented and
//! dimmed, and `**bold**` / `` `code` `` spans are styled. Everything else
//! passes through untouched.

use colored::Colorize;

use crate::tools::ToolDescriptor;

/// Styles a full answer for display.
pub fn render_answer(text: &str) -> String {
    let mut lines = Vec::new();
    let mut in_code_block = false;

    for line in text.lines() {
        if line.trim_start().starts_with("```") {
            in_code_block = !in_code_block;
            let lang = line.trim_start().trim_start_matches('`');
            if in_code_block && !lang.is_empty() {
                lines.push(format!("  {}", lang.dimmed()));
            }
            continue;
        }

        if in_code_block {
            lines.push(format!("  {}", line.dimmed()));
        } else if is_marker(line) {
            lines.push(line.dimmed().italic().to_string());
        } else {
            lines.push(render_inline(line));
        }
    }

    lines.join("\n")
}

/// One line per tool: name and the first line of its description.
pub fn format_tool_list(tools: &[ToolDescriptor]) -> String {
    if tools.is_empty() {
        return "(server advertises no tools)".dimmed().to_string();
    }
    tools
        .iter()
        .map(|t| {
            let summary = t
                .description
                .as_deref()
                .and_then(|d| d.lines().map(str::trim).find(|l| !l.is_empty()))
                .unwrap_or("");
            format!("  {} {}", t.name.cyan(), summary.dimmed())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_marker(line: &str) -> bool {
    line.starts_with("[Calling tool ") && line.ends_with(']')
}

/// Styles `**bold**` then `` `code` `` spans. Unbalanced delimiters are left as-is.
fn render_inline(line: &str) -> String {
    let bolded = style_spans(line, "**", |s| s.bold().to_string());
    style_spans(&bolded, "`", |s| s.dimmed().to_string())
}

fn style_spans(line: &str, delim: &str, style: impl Fn(&str) -> String) -> String {
    let parts: Vec<&str> = line.split(delim).collect();
    // An even number of parts means one delimiter is unmatched.
    if parts.len() < 3 {
        return line.to_string();
    }
    let paired = if parts.len() % 2 == 1 {
        parts.len()
    } else {
        parts.len() - 1
    };

    let mut out = String::with_capacity(line.len());
    for (i, part) in parts[..paired].iter().enumerate() {
        if i % 2 == 1 {
            out.push_str(&style(part));
        } else {
            out.push_str(part);
        }
    }
    for part in &parts[paired..] {
        out.push_str(delim);
        out.push_str(part);
    }
    out
}
