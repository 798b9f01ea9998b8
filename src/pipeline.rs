//! Ties the project index, per-file parsing, and the inference engine
//! into the single entry point the CLI drives: build context once,
//! replay per input, collect findings.

use std::path::{Path, PathBuf};

use crate::config::ProjectConfig;
use crate::diagnostics::{self, Diagnostic, DiagnosticCode};
use crate::index::ProjectIndex;
use crate::syntax;

pub struct CheckOutcome {
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckOutcome {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == crate::diagnostics::Severity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == crate::diagnostics::Severity::Warning)
    }
}

/// Run the full check over `roots` (files or directories) with `config`.
/// Builds the project index once (unless `no-index` is set), then
/// analyzes every source file found under `roots`.
pub fn run(roots: &[PathBuf], config: &ProjectConfig) -> CheckOutcome {
    let mut diagnostics = Vec::new();

    if !config.engine.enabled {
        return CheckOutcome { diagnostics };
    }

    let index = if config.engine.no_index {
        None
    } else {
        roots.first().map(|root| index_root_for(root)).and_then(|root| ProjectIndex::build(&root).ok())
    };

    if let Some(idx) = &index {
        for (path, err) in &idx.skipped {
            diagnostics.push(parse_error_for(path, err));
        }
    }

    let mut files = Vec::new();
    for root in roots {
        collect_files(root, &mut files);
    }
    files.sort();
    files.dedup();

    for path in &files {
        match syntax::parse_file(path) {
            Ok(module) => {
                let module_name = module_qualified_name(path);
                let file_diags =
                    crate::engine::analyze_file(path, &module, &module_name, &config.engine, index.as_ref());
                diagnostics.extend(file_diags);
            }
            Err(err) => diagnostics.push(parse_error_for(path, &err)),
        }
    }

    let mut diagnostics = diagnostics;
    if !config.engine.warnings {
        diagnostics.retain(|d| d.severity != crate::diagnostics::Severity::Warning);
    }

    CheckOutcome {
        diagnostics: diagnostics::finalize(diagnostics),
    }
}

fn parse_error_for(path: &Path, err: &syntax::IngestError) -> Diagnostic {
    let (line, col) = err.location();
    Diagnostic::new(path, line, col, DiagnosticCode::ParseError, err.to_string())
}

fn index_root_for(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.to_path_buf()
    } else {
        path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
    }
}

fn module_qualified_name(path: &Path) -> String {
    path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| path.display().to_string())
}

fn collect_files(root: &Path, out: &mut Vec<PathBuf>) {
    if root.is_file() {
        out.push(root.to_path_buf());
        return;
    }
    let Ok(entries) = std::fs::read_dir(root) else {
        return;
    };
    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok()).map(|e| e.path()).collect();
    paths.sort();
    for path in paths {
        if path.is_dir() {
            collect_files(&path, out);
        } else if path.extension().and_then(|e| e.to_str()) == Some("py") {
            out.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn runs_end_to_end_over_a_directory() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("a.py"),
            "df = read_csv(\"u.csv\", usecols=[\"a\"])\ndf[\"missing\"]\n",
        )
        .unwrap();

        let config = ProjectConfig::default();
        let outcome = run(&[dir.path().to_path_buf()], &config);
        assert!(outcome.has_errors());
    }

    #[test]
    fn no_warnings_flag_suppresses_warning_severity() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "df = read_csv(\"u.csv\")\n").unwrap();

        let mut config = ProjectConfig::default();
        config.engine.strict_ingest = true;
        config.engine.warnings = false;
        let outcome = run(&[dir.path().to_path_buf()], &config);
        assert!(!outcome.has_warnings());
    }
}
