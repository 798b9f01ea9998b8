//! Diagnostic engine: the fixed error taxonomy, edit-distance typo
//! suggestions, deduplication, and stable ordering.

use std::path::{Path, PathBuf};

use serde::Serialize;
use strum_macros::{EnumString, IntoStaticStr};

/// Two severities only — this taxonomy has no "info"/"hint" tier, unlike
/// the five-level `Severity`; every code here is either a hard
/// failure or a suppressible warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr, Serialize)]
pub enum DiagnosticCode {
    E001,
    E002,
    W001,
    W002,
    #[strum(serialize = "SCHEMA-CONFLICT")]
    #[serde(rename = "SCHEMA-CONFLICT")]
    SchemaConflict,
    #[strum(serialize = "PARSE-ERROR")]
    #[serde(rename = "PARSE-ERROR")]
    ParseError,
}

impl DiagnosticCode {
    pub fn default_severity(self) -> Severity {
        match self {
            DiagnosticCode::W001 | DiagnosticCode::W002 => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Whether this code is gated by `strict-ingest` (off by default).
    pub fn requires_strict_ingest(self) -> bool {
        matches!(self, DiagnosticCode::W001 | DiagnosticCode::W002)
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub line: usize,
    pub column: usize,
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        path: impl Into<PathBuf>,
        line: usize,
        column: usize,
        code: DiagnosticCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            line,
            column,
            severity: code.default_severity(),
            code,
            message: message.into(),
        }
    }

    fn dedup_key(&self) -> (PathBuf, usize, usize, &'static str, String) {
        (
            self.path.clone(),
            self.line,
            self.column,
            self.code.as_str(),
            self.message.clone(),
        )
    }
}

/// Deduplicate by `(path, line, column, code, message)` and sort by
/// `(path, line, column, code)`.
pub fn finalize(mut diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    let mut seen = std::collections::HashSet::new();
    diagnostics.retain(|d| seen.insert(d.dedup_key()));
    diagnostics.sort_by(|a, b| {
        a.path
            .cmp(&b.path)
            .then(a.line.cmp(&b.line))
            .then(a.column.cmp(&b.column))
            .then(a.code.as_str().cmp(b.code.as_str()))
    });
    diagnostics
}

/// Damerau-Levenshtein edit distance (restricted, transposition counted
/// as one operation), used by the E001 suggestion policy.
pub fn damerau_levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (la, lb) = (a.len(), b.len());
    if la == 0 {
        return lb;
    }
    if lb == 0 {
        return la;
    }

    let mut d = vec![vec![0usize; lb + 1]; la + 1];
    for (i, row) in d.iter_mut().enumerate().take(la + 1) {
        row[0] = i;
    }
    for j in 0..=lb {
        d[0][j] = j;
    }

    for i in 1..=la {
        for j in 1..=lb {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            d[i][j] = (d[i - 1][j] + 1)
                .min(d[i][j - 1] + 1)
                .min(d[i - 1][j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                d[i][j] = d[i][j].min(d[i - 2][j - 2] + 1);
            }
        }
    }
    d[la][lb]
}

/// Closest candidate to `name` among `candidates`, honoring the E001
/// suggestion policy: distance must be `<= max(1, len(name)/4)` and `<= 2`,
/// lexicographically-smallest among ties. `None` when nothing qualifies.
pub fn suggest(name: &str, candidates: &[String]) -> Option<String> {
    let threshold = (name.chars().count() / 4).max(1).min(2);
    candidates
        .iter()
        .map(|c| (damerau_levenshtein(name, c), c))
        .filter(|(dist, _)| *dist <= threshold)
        .min_by(|(d1, c1), (d2, c2)| d1.cmp(d2).then(c1.cmp(c2)))
        .map(|(_, c)| c.clone())
}

/// Render the "known columns" clause used in E001 messages, e.g.
/// `user_id,email`. Sorted for determinism.
pub fn known_columns_clause(names: &[String]) -> String {
    let mut sorted = names.to_vec();
    sorted.sort();
    sorted.join(",")
}

pub fn parse_error_diagnostic(path: &Path, line: usize, column: usize, message: &str) -> Diagnostic {
    Diagnostic::new(path, line, column, DiagnosticCode::ParseError, message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_counts_transposition_as_one() {
        assert_eq!(damerau_levenshtein("revnue", "revenue"), 1);
    }

    #[test]
    fn suggest_picks_closest_within_threshold() {
        let candidates = vec!["revenue".to_string(), "region".to_string()];
        assert_eq!(suggest("revnue", &candidates), Some("revenue".to_string()));
    }

    #[test]
    fn suggest_returns_none_past_threshold() {
        let candidates = vec!["user_id".to_string(), "email".to_string()];
        assert_eq!(suggest("age", &candidates), None);
    }

    #[test]
    fn suggest_breaks_ties_lexicographically() {
        let candidates = vec!["abd".to_string(), "abc".to_string()];
        assert_eq!(suggest("ab", &candidates), Some("abc".to_string()));
    }

    #[test]
    fn finalize_dedupes_and_sorts() {
        let a = Diagnostic::new("b.py", 2, 1, DiagnosticCode::E001, "m");
        let b = Diagnostic::new("a.py", 1, 1, DiagnosticCode::E001, "m");
        let dup = a.clone();
        let out = finalize(vec![a, dup, b]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].path, PathBuf::from("a.py"));
    }
}
