//! Text (terminal) reporter
//!
//! Plain output is the stable line format; with color on, only the
//! severity tag is highlighted.

use crate::models::{RunResult, Severity};
use crate::sink::render_lines;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";

/// Severity colors
fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "\x1b[31m",   // Red
        Severity::Warning => "\x1b[33m", // Yellow
        Severity::Info => "\x1b[90m",    // Gray
    }
}

/// Render the displayed messages followed by the summary line
pub fn render(result: &RunResult, color: bool) -> String {
    let mut out = render_lines(&result.displayed, &result.explanations);
    if color {
        out = colorize(&out, result);
    }
    let summary = result.summary_line();
    if color {
        out.push_str(&format!("{BOLD}{}{RESET}\n", summary));
    } else {
        out.push_str(&summary);
        out.push('\n');
    }
    out
}

fn colorize(rendered: &str, result: &RunResult) -> String {
    let mut out = String::with_capacity(rendered.len());
    let mut messages = result.displayed.iter().peekable();
    for line in rendered.lines() {
        match messages.peek() {
            Some(message) if message.text == line => {
                let tag = format!(": {}: ", message.severity.tag());
                let colored = format!(
                    ": {}{}{}: ",
                    severity_color(message.severity),
                    message.severity.tag(),
                    RESET
                );
                out.push_str(&line.replacen(&tag, &colored, 1));
                messages.next();
            }
            _ => out.push_str(line),
        }
        out.push('\n');
    }
    out
}
