//! Output renderers: pure formatting functions over a finished diagnostic
//! list, one per wire format. No trait object needed here — the CLI picks
//! one function by `OutputFormat`.

pub mod github;
pub mod json;
pub mod text;

use crate::config::OutputFormat;
use crate::diagnostics::Diagnostic;

pub fn render(format: OutputFormat, diagnostics: &[Diagnostic], color: bool) -> String {
    match format {
        OutputFormat::Text => text::render(diagnostics, color),
        OutputFormat::Json => json::render(diagnostics),
        OutputFormat::Github => github::render(diagnostics),
    }
}
