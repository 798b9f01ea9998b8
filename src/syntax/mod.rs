//! Syntax ingester
//!
//! Parses a source file to a navigable syntax tree. Exposes identifiers,
//! attribute chains, call arguments (positional and keyword), subscripts,
//! assignments, literals, and source spans, through [`ast::Module`].
//!
//! A thin, isolated wrapper with its own error type, consumed only
//! through this module's public surface.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod span;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use ast::Module;
pub use span::{Located, SourceSpan};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("{path}: I/O error: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}:{col}: {message}")]
    Lex {
        path: PathBuf,
        message: String,
        line: usize,
        col: usize,
    },

    #[error("{path}:{line}:{col}: {message}")]
    Parse {
        path: PathBuf,
        message: String,
        line: usize,
        col: usize,
    },
}

impl IngestError {
    pub fn location(&self) -> (usize, usize) {
        match self {
            IngestError::Io { .. } => (1, 1),
            IngestError::Lex { line, col, .. } => (*line, *col),
            IngestError::Parse { line, col, .. } => (*line, *col),
        }
    }
}

/// Parse a file on disk into a [`Module`]. On any failure the caller
/// receives a single, file-scoped [`IngestError`] — no partial tree is
/// ever exposed.
pub fn parse_file(path: &Path) -> Result<Module, IngestError> {
    let source = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(path, &source)
}

/// Parse already-loaded source text, attributing errors to `path`.
pub fn parse_source(path: &Path, source: &str) -> Result<Module, IngestError> {
    let tokens = lexer::lex(source).map_err(|e| IngestError::Lex {
        path: path.to_path_buf(),
        message: e.message,
        line: e.line,
        col: e.col,
    })?;
    parser::parse(tokens).map_err(|e| IngestError::Parse {
        path: path.to_path_buf(),
        message: e.message,
        line: e.line,
        col: e.col,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn p(source: &str) -> Module {
        parse_source(&PathBuf::from("t.py"), source).expect("should parse")
    }

    #[test]
    fn parses_plain_assignment() {
        let m = p("df = read_csv(\"u.csv\")\n");
        assert_eq!(m.body.len(), 1);
    }

    #[test]
    fn parses_typed_assignment() {
        let m = p("df: DF[S] = read_csv(\"u.csv\")\n");
        match &m.body[0].node {
            ast::Stmt::Assign {
                target,
                annotation,
                ..
            } => {
                assert_eq!(target, "df");
                assert!(annotation.is_some());
            }
            other => panic!("expected Assign, got {other:?}"),
        }
    }

    #[test]
    fn parses_subscript_reference() {
        let m = p("df[\"age\"]\n");
        match &m.body[0].node {
            ast::Stmt::Expr(ast::Expr::Subscript { index, .. }) => {
                assert_eq!(index.as_str_literal(), Some("age"));
            }
            other => panic!("expected subscript expr stmt, got {other:?}"),
        }
    }

    #[test]
    fn parses_function_def_with_annotations() {
        let src = "def load() -> DF[S]:\n    return read_csv(\"u.csv\")\n";
        let m = p(src);
        match &m.body[0].node {
            ast::Stmt::FunctionDef(f) => {
                assert_eq!(f.name, "load");
                assert!(f.return_annotation.is_some());
            }
            other => panic!("expected FunctionDef, got {other:?}"),
        }
    }

    #[test]
    fn parses_method_chain_with_kwargs() {
        let m = p("renamed = df.rename(columns={\"email\": \"email_address\"})\n");
        match &m.body[0].node {
            ast::Stmt::Assign { value, .. } => {
                let call = value.as_method_call().expect("method call");
                assert_eq!(call.method, "rename");
                assert_eq!(call.keywords[0].0, "columns");
            }
            other => panic!("expected Assign, got {other:?}"),
        }
    }

    #[test]
    fn imports_are_collected() {
        let m = p("import pandas as pd\nfrom pkg.schemas import Orders\n");
        assert_eq!(m.imports.len(), 2);
    }

    #[test]
    fn if_else_bodies_are_both_parsed() {
        let src = "if cond:\n    x = 1\nelse:\n    x = 2\n";
        let m = p(src);
        match &m.body[0].node {
            ast::Stmt::If {
                then_body,
                else_body,
            } => {
                assert_eq!(then_body.len(), 1);
                assert_eq!(else_body.len(), 1);
            }
            other => panic!("expected If, got {other:?}"),
        }
    }

    #[test]
    fn malformed_string_is_a_parse_error() {
        let err = parse_source(&PathBuf::from("t.py"), "x = \"unterminated\n").unwrap_err();
        assert!(matches!(err, IngestError::Lex { .. }));
    }
}
