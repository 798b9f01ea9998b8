//! `::<severity> file=<path>,line=<N>,col=<N>,title=<code>::<message>` —
//! the GitHub Actions workflow-command annotation format.

use crate::diagnostics::{Diagnostic, Severity};

pub fn render(diagnostics: &[Diagnostic]) -> String {
    diagnostics.iter().map(render_one).collect::<Vec<_>>().join("\n")
}

fn render_one(d: &Diagnostic) -> String {
    let severity = match d.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };
    format!(
        "::{} file={},line={},col={},title={}::{}",
        severity,
        d.path.display(),
        d.line,
        d.column,
        d.code.as_str(),
        escape(&d.message)
    )
}

/// GitHub workflow commands use `%`/newline/CR escaping in the message
/// body; commas and colons are fine unescaped there (only property values
/// need `%2C`/`%3A`).
fn escape(message: &str) -> String {
    message.replace('%', "%25").replace('\n', "%0A").replace('\r', "%0D")
}
