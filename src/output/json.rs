//! JSON array of `{path, line, column, severity, code, message}` objects.

use crate::diagnostics::Diagnostic;
use serde::Serialize;

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    path: String,
    line: usize,
    column: usize,
    severity: &'static str,
    code: &'static str,
    message: &'a str,
}

pub fn render(diagnostics: &[Diagnostic]) -> String {
    let rows: Vec<JsonDiagnostic> = diagnostics
        .iter()
        .map(|d| JsonDiagnostic {
            path: d.path.display().to_string(),
            line: d.line,
            column: d.column,
            severity: match d.severity {
                crate::diagnostics::Severity::Error => "error",
                crate::diagnostics::Severity::Warning => "warning",
            },
            code: d.code.as_str(),
            message: &d.message,
        })
        .collect();
    serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticCode;

    #[test]
    fn renders_valid_json_array() {
        let d = Diagnostic::new("u.py", 2, 4, DiagnosticCode::E001, "msg");
        let out = render(&[d]);
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["code"], "E001");
        assert_eq!(parsed[0]["line"], 2);
    }
}
