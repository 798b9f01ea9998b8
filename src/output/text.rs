//! `<path>:<line>:<col>: <severity>[<code>] <message>` — the stable,
//! editor-parseable default format. Colors applied only when the caller
//! tells us stdout is a TTY; this module never inspects the terminal
//! itself.

use crate::diagnostics::{Diagnostic, Severity};

pub fn render(diagnostics: &[Diagnostic], color: bool) -> String {
    diagnostics.iter().map(|d| render_one(d, color)).collect::<Vec<_>>().join("\n")
}

fn render_one(d: &Diagnostic, color: bool) -> String {
    let severity = if color { colorize(d.severity) } else { d.severity.to_string() };
    format!(
        "{}:{}:{}: {}[{}] {}",
        d.path.display(),
        d.line,
        d.column,
        severity,
        d.code.as_str(),
        d.message
    )
}

fn colorize(severity: Severity) -> String {
    match severity {
        Severity::Error => format!("\x1b[31m{severity}\x1b[0m"),
        Severity::Warning => format!("\x1b[33m{severity}\x1b[0m"),
    }
}
