//! [`Schema`]: an ordered, named collection of columns, column sets, and
//! column groups, plus the combination algebra.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::schema::column::{Column, ColumnType};
use crate::schema::columngroup::{ColumnGroup, GroupMember};
use crate::schema::columnset::ColumnSet;

#[derive(Debug, Clone, Serialize)]
pub enum SchemaMember {
    Column(Column),
    ColumnSet(ColumnSet),
    ColumnGroup(ColumnGroup),
}

impl SchemaMember {
    fn descriptor_name(&self) -> &str {
        match self {
            SchemaMember::Column(c) => &c.name,
            SchemaMember::ColumnSet(s) => s.name(),
            SchemaMember::ColumnGroup(g) => &g.name,
        }
    }

    fn accepts(&self, name: &str) -> bool {
        match self {
            SchemaMember::Column(c) => c.name == name || c.alias.as_deref() == Some(name),
            SchemaMember::ColumnSet(s) => s.accepts(name),
            SchemaMember::ColumnGroup(g) => g.accepts(name),
        }
    }

    fn is_regex_only(&self) -> bool {
        matches!(self, SchemaMember::ColumnSet(s) if s.is_regex())
    }
}

/// Raised when two schemas being combined disagree on a shared column's
/// `(type, nullable)` pair.
#[derive(Debug, Clone, Error)]
#[error("schema conflict on column {column:?}: {left_schema} has {left_type:?}/nullable={left_nullable}, {right_schema} has {right_type:?}/nullable={right_nullable}")]
pub struct SchemaConflict {
    pub column: String,
    pub left_schema: String,
    pub left_type: ColumnType,
    pub left_nullable: bool,
    pub right_schema: String,
    pub right_type: ColumnType,
    pub right_nullable: bool,
}

/// An ordered, named collection of columns/column sets/column groups.
///
/// Invariant: the attribute-indexed view (`by_attr`) and the
/// column-name-indexed view (`by_column`) are consistent — every concrete
/// column name resolves to exactly one member.
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    pub name: String,
    pub allow_extra_columns: bool,
    members: Vec<SchemaMember>,
    #[serde(skip)]
    by_attr: HashMap<String, usize>,
    #[serde(skip)]
    by_column: HashMap<String, usize>,
}

impl Schema {
    pub fn new(name: impl Into<String>, members: Vec<SchemaMember>, allow_extra_columns: bool) -> Self {
        let mut schema = Self {
            name: name.into(),
            allow_extra_columns,
            members,
            by_attr: HashMap::new(),
            by_column: HashMap::new(),
        };
        schema.reindex();
        schema
    }

    fn reindex(&mut self) {
        self.by_attr.clear();
        self.by_column.clear();
        for (idx, member) in self.members.iter().enumerate() {
            self.by_attr.insert(member.descriptor_name().to_string(), idx);
            match member {
                SchemaMember::Column(c) => {
                    self.by_column.insert(c.name.clone(), idx);
                    if let Some(alias) = &c.alias {
                        self.by_column.insert(alias.clone(), idx);
                    }
                }
                SchemaMember::ColumnSet(ColumnSet::Explicit { members, .. }) => {
                    for m in members {
                        self.by_column.insert(m.clone(), idx);
                    }
                }
                SchemaMember::ColumnGroup(g) => {
                    if let Ok(names) = g.expand() {
                        for n in names {
                            self.by_column.insert(n, idx);
                        }
                    }
                }
                SchemaMember::ColumnSet(ColumnSet::Regex { .. }) => {
                    // Not enumerable — absent from `by_column`, reached only
                    // through `resolve_regex`/`has`.
                }
            }
        }
    }

    pub fn members(&self) -> &[SchemaMember] {
        &self.members
    }

    /// Does a column reference of `name` validate against this schema?
    /// True for a concrete member name, an explicit-set/group member, or
    /// a match against any regex set's pattern.
    pub fn has(&self, name: &str) -> bool {
        if self.by_column.contains_key(name) {
            return true;
        }
        self.members.iter().any(|m| m.is_regex_only() && m.accepts(name))
    }

    /// Ordered list of concrete (enumerable) column names. Regex-only sets
    /// contribute nothing — they cannot be flattened.
    pub fn columns(&self) -> Vec<String> {
        let mut out = Vec::new();
        for member in &self.members {
            match member {
                SchemaMember::Column(c) => out.push(c.name.clone()),
                SchemaMember::ColumnSet(ColumnSet::Explicit { members, .. }) => {
                    out.extend(members.iter().cloned())
                }
                SchemaMember::ColumnGroup(g) => {
                    if let Ok(names) = g.expand() {
                        out.extend(names);
                    }
                }
                SchemaMember::ColumnSet(ColumnSet::Regex { .. }) => {}
            }
        }
        out
    }

    /// True if `name` matches a regex set's pattern directly (ignores
    /// explicit members — callers typically want `has` instead).
    pub fn resolve_regex(&self, name: &str) -> bool {
        self.members
            .iter()
            .any(|m| m.is_regex_only() && m.accepts(name))
    }

    /// The `(type, nullable)` pair for a concrete column name, used by
    /// `combine` to detect conflicts. Returns `None` for names only
    /// reachable through a regex set (no fixed type per name).
    fn type_of(&self, name: &str) -> Option<(ColumnType, bool)> {
        let idx = *self.by_column.get(name)?;
        match &self.members[idx] {
            SchemaMember::Column(c) => Some((c.type_tag, c.nullable)),
            SchemaMember::ColumnSet(set) => Some((set.type_tag(), set.nullable())),
            SchemaMember::ColumnGroup(g) => g.members.iter().find_map(|m| match m {
                GroupMember::Column(c) if c.name == name => Some((c.type_tag, c.nullable)),
                GroupMember::ColumnSet(set) if set.accepts(name) => Some((set.type_tag(), set.nullable())),
                _ => None,
            }),
        }
    }

    /// Union of two schemas: `self` first, then `other`, skipping members
    /// whose column name already appears in `self` with an identical
    /// `(type, nullable)` pair. Disagreement is a hard [`SchemaConflict`].
    pub fn combine(&self, other: &Schema) -> Result<Schema, SchemaConflict> {
        let mut members = self.members.clone();
        let mut seen_columns: std::collections::HashSet<String> = self.columns().into_iter().collect();

        for member in &other.members {
            let overlapping: Vec<String> = match member {
                SchemaMember::Column(c) => vec![c.name.clone()],
                SchemaMember::ColumnSet(ColumnSet::Explicit { members, .. }) => members.clone(),
                SchemaMember::ColumnGroup(g) => g.expand().unwrap_or_default(),
                SchemaMember::ColumnSet(ColumnSet::Regex { .. }) => Vec::new(),
            };

            for name in &overlapping {
                if let (Some(left), Some(right)) = (self.type_of(name), other.type_of(name)) {
                    if left != right {
                        return Err(SchemaConflict {
                            column: name.clone(),
                            left_schema: self.name.clone(),
                            left_type: left.0,
                            left_nullable: left.1,
                            right_schema: other.name.clone(),
                            right_type: right.0,
                            right_nullable: right.1,
                        });
                    }
                }
            }

            let already_present = !overlapping.is_empty() && overlapping.iter().all(|n| seen_columns.contains(n));
            if already_present {
                continue;
            }

            members.push(member.clone());
            seen_columns.extend(overlapping);
        }

        Ok(Schema::new(
            format!("{}+{}", self.name, other.name),
            members,
            self.allow_extra_columns || other.allow_extra_columns,
        ))
    }
}
