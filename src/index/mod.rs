//! Project index: a read-only, cross-file map of declared schemas and
//! annotated function signatures, built in a dedicated phase ahead of
//! analysis. Constructed once per run, then frozen.

pub mod declare;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::schema::Schema;
use crate::syntax::ast::{Expr, Import, Stmt};
use crate::syntax::{self, IngestError};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("{0}: {1}")]
    Walk(PathBuf, std::io::Error),
}

/// A function's parameter and return annotations, unresolved — the
/// annotation resolver is the only thing that turns these into `Schema`
/// references.
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    pub params: Vec<(String, Option<Expr>)>,
    pub return_annotation: Option<Expr>,
}

#[derive(Debug, Clone, Default)]
pub struct ModuleRecord {
    pub schemas: BTreeMap<String, Schema>,
    pub functions: BTreeMap<String, FunctionSignature>,
    pub imports: Vec<Import>,
}

/// A frozen, path-keyed map built from a directory scan. Scanning is
/// single-pass, file-order-independent (paths are visited in sorted
/// order), and deterministic.
#[derive(Debug, Clone, Default)]
pub struct ProjectIndex {
    modules: BTreeMap<String, ModuleRecord>,
    /// Files that failed to parse during the scan, each producing one
    /// file-level diagnostic at analysis time rather than aborting the
    /// whole index.
    pub skipped: Vec<(PathBuf, IngestError)>,
}

impl ProjectIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn build(root: &Path) -> Result<Self, IndexError> {
        let mut files = Vec::new();
        collect_source_files(root, &mut files)?;
        files.sort();

        let mut index = ProjectIndex::default();
        for path in files {
            let qualified = qualified_module_name(root, &path);
            match syntax::parse_file(&path) {
                Ok(module) => {
                    let record = index_module(&module);
                    index.modules.insert(qualified, record);
                }
                Err(e) => index.skipped.push((path, e)),
            }
        }
        Ok(index)
    }

    pub fn module(&self, qualified_name: &str) -> Option<&ModuleRecord> {
        self.modules.get(qualified_name)
    }

    /// Look up a schema by fully qualified name (`module.path.SchemaName`).
    pub fn schema(&self, qualified_name: &str) -> Option<&Schema> {
        let (module, name) = qualified_name.rsplit_once('.')?;
        self.modules.get(module)?.schemas.get(name)
    }

    /// Look up a function's signature by fully qualified name.
    pub fn function(&self, qualified_name: &str) -> Option<&FunctionSignature> {
        let (module, name) = qualified_name.rsplit_once('.')?;
        self.modules.get(module)?.functions.get(name)
    }
}

fn collect_source_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), IndexError> {
    if dir.is_file() {
        if dir.extension().and_then(|e| e.to_str()) == Some("py") {
            out.push(dir.to_path_buf());
        }
        return Ok(());
    }
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| IndexError::Walk(dir.to_path_buf(), e))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    entries.sort();
    for path in entries {
        if path.is_dir() {
            collect_source_files(&path, out)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("py") {
            out.push(path);
        }
    }
    Ok(())
}

fn qualified_module_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if let Some(last) = segments.last_mut() {
        if let Some(stripped) = last.strip_suffix(".py") {
            *last = stripped.to_string();
        }
    }
    segments.join(".")
}

fn index_module(module: &crate::syntax::Module) -> ModuleRecord {
    let mut record = ModuleRecord {
        imports: module.imports.iter().map(|i| i.node.clone()).collect(),
        ..Default::default()
    };

    for stmt in &module.body {
        match &stmt.node {
            Stmt::Assign { target, value, .. } => {
                if let Some(schema) = declare::schema_from_expr(target, value) {
                    record.schemas.insert(target.clone(), schema);
                }
            }
            Stmt::FunctionDef(f) => {
                record.functions.insert(
                    f.name.clone(),
                    FunctionSignature {
                        params: f
                            .params
                            .iter()
                            .map(|p| (p.name.clone(), p.annotation.clone()))
                            .collect(),
                        return_annotation: f.return_annotation.clone(),
                    },
                );
            }
            _ => {}
        }
    }
    record
}
