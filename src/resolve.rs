//! Annotation resolver: recognizes the "container parameterized by
//! metadata" annotation shape and resolves the schema reference to a
//! concrete [`Schema`], local file first, then imports, then the project
//! index.

use std::collections::BTreeMap;

use crate::dialect::DATAFRAME_TYPE_NAMES;
use crate::index::ProjectIndex;
use crate::schema::Schema;
use crate::syntax::ast::{Expr, Import};

pub struct AnnotationResolver<'a> {
    current_module: &'a str,
    local_schemas: &'a BTreeMap<String, Schema>,
    imports: &'a [Import],
    index: Option<&'a ProjectIndex>,
}

impl<'a> AnnotationResolver<'a> {
    pub fn new(
        current_module: &'a str,
        local_schemas: &'a BTreeMap<String, Schema>,
        imports: &'a [Import],
        index: Option<&'a ProjectIndex>,
    ) -> Self {
        Self {
            current_module,
            local_schemas,
            imports,
            index,
        }
    }

    /// Resolve an annotation expression to a schema, or `None` if it
    /// doesn't have the recognized shape or the reference can't be
    /// resolved. Never a diagnostic by itself — the caller degrades to
    /// `Unknown` silently on `None`.
    pub fn resolve(&self, annotation: &Expr) -> Option<Schema> {
        let Expr::Subscript { base, index } = annotation else {
            return None;
        };
        if !DATAFRAME_TYPE_NAMES.contains(&base.last_segment()?) {
            return None;
        }

        let path = index.dotted_path()?;
        let schema_name = path.last()?.as_str();

        if let Some(schema) = self.local_schemas.get(schema_name) {
            return Some(schema.clone());
        }

        if let Some(schema) = self.resolve_via_imports(schema_name) {
            return Some(schema);
        }

        if path.len() > 1 {
            let module = path[..path.len() - 1].join(".");
            if let Some(idx) = self.index {
                if let Some(schema) = idx.schema(&format!("{module}.{schema_name}")) {
                    return Some(schema.clone());
                }
            }
        }

        None
    }

    fn resolve_via_imports(&self, schema_name: &str) -> Option<Schema> {
        let idx = self.index?;
        for import in self.imports {
            if let Import::From { module, name, alias } = import {
                let visible_name = alias.as_deref().unwrap_or(name.as_str());
                if visible_name == schema_name {
                    let qualified = format!("{}.{}", module.join("."), name);
                    if let Some(schema) = idx.schema(&qualified) {
                        return Some(schema.clone());
                    }
                }
            }
        }
        // Same-package sibling reference with no explicit import, e.g. an
        // annotation written as a bare name that happens to be declared
        // in a module of the same name colocated with the current one.
        let _ = self.current_module;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnType, SchemaMember};
    use std::fs;
    use tempfile::tempdir;

    fn schema(name: &str) -> Schema {
        Schema::new(
            name,
            vec![SchemaMember::Column(Column::new("a", ColumnType::Int, false))],
            false,
        )
    }

    #[test]
    fn resolves_local_schema_by_name() {
        let mut locals = BTreeMap::new();
        locals.insert("S".to_string(), schema("S"));
        let resolver = AnnotationResolver::new("m", &locals, &[], None);

        let annotation = Expr::Subscript {
            base: Box::new(Expr::Name("DF".to_string())),
            index: Box::new(Expr::Name("S".to_string())),
        };
        assert!(resolver.resolve(&annotation).is_some());
    }

    #[test]
    fn non_dataframe_annotation_is_unrecognized() {
        let locals = BTreeMap::new();
        let resolver = AnnotationResolver::new("m", &locals, &[], None);
        let annotation = Expr::Subscript {
            base: Box::new(Expr::Name("List".to_string())),
            index: Box::new(Expr::Name("S".to_string())),
        };
        assert!(resolver.resolve(&annotation).is_none());
    }

    #[test]
    fn resolves_through_project_index_via_import() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("s.py"),
            "Orders = Schema(\"Orders\", [Column(\"a\", \"int\", False)])\n",
        )
        .unwrap();
        let index = ProjectIndex::build(dir.path()).unwrap();

        let locals = BTreeMap::new();
        let imports = vec![Import::From {
            module: vec!["s".to_string()],
            name: "Orders".to_string(),
            alias: None,
        }];
        let resolver = AnnotationResolver::new("l", &locals, &imports, Some(&index));

        let annotation = Expr::Subscript {
            base: Box::new(Expr::Name("DF".to_string())),
            index: Box::new(Expr::Name("Orders".to_string())),
        };
        assert!(resolver.resolve(&annotation).is_some());
    }

    #[test]
    fn unresolvable_annotation_yields_none() {
        let locals = BTreeMap::new();
        let resolver = AnnotationResolver::new("m", &locals, &[], None);
        let annotation = Expr::Subscript {
            base: Box::new(Expr::Name("DF".to_string())),
            index: Box::new(Expr::Name("Ghost".to_string())),
        };
        assert!(resolver.resolve(&annotation).is_none());
    }
}
