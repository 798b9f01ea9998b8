//! [`ColumnSet`]: a group of columns sharing one type.

use serde::Serialize;
use thiserror::Error;

use crate::schema::column::ColumnType;

#[derive(Debug, Error)]
pub enum ColumnSetError {
    #[error("cannot enumerate a regex column set ({pattern:?}): member names are not statically known")]
    CannotExpandRegex { pattern: String },

    #[error("invalid regex pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A group of columns sharing one type. `type_tag`/`nullable`
/// describe every member uniformly — that's what makes a `ColumnSet` one
/// conflict unit in schema combination rather than N independent columns.
#[derive(Debug, Clone, Serialize)]
pub enum ColumnSet {
    /// A finite list of member names.
    Explicit {
        name: String,
        type_tag: ColumnType,
        nullable: bool,
        members: Vec<String>,
    },
    /// A pattern intended to match runtime column names. Cannot be
    /// enumerated; accepts any column access whose name matches.
    Regex {
        name: String,
        type_tag: ColumnType,
        nullable: bool,
        pattern: String,
        #[serde(skip)]
        compiled: CompiledRegex,
    },
}

/// Wraps `regex::Regex` so `ColumnSet` can still derive `Clone`/`Debug`
/// without requiring those of the compiled automaton directly (it already
/// implements both, this newtype just keeps the dependency contained to
/// one place and gives `Serialize` something to skip).
#[derive(Debug, Clone)]
pub struct CompiledRegex(pub regex::Regex);

impl PartialEq for ColumnSet {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                ColumnSet::Explicit { name, members, .. },
                ColumnSet::Explicit {
                    name: n2,
                    members: m2,
                    ..
                },
            ) => name == n2 && members == m2,
            (
                ColumnSet::Regex { name, pattern, .. },
                ColumnSet::Regex {
                    name: n2,
                    pattern: p2,
                    ..
                },
            ) => name == n2 && pattern == p2,
            _ => false,
        }
    }
}

impl ColumnSet {
    pub fn explicit(name: impl Into<String>, type_tag: ColumnType, nullable: bool, members: Vec<String>) -> Self {
        ColumnSet::Explicit {
            name: name.into(),
            type_tag,
            nullable,
            members,
        }
    }

    pub fn regex(
        name: impl Into<String>,
        type_tag: ColumnType,
        nullable: bool,
        pattern: impl Into<String>,
    ) -> Result<Self, ColumnSetError> {
        let pattern = pattern.into();
        let compiled = regex::Regex::new(&pattern).map_err(|source| ColumnSetError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
        Ok(ColumnSet::Regex {
            name: name.into(),
            type_tag,
            nullable,
            pattern,
            compiled: CompiledRegex(compiled),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            ColumnSet::Explicit { name, .. } => name,
            ColumnSet::Regex { name, .. } => name,
        }
    }

    pub fn type_tag(&self) -> ColumnType {
        match self {
            ColumnSet::Explicit { type_tag, .. } => *type_tag,
            ColumnSet::Regex { type_tag, .. } => *type_tag,
        }
    }

    pub fn nullable(&self) -> bool {
        match self {
            ColumnSet::Explicit { nullable, .. } => *nullable,
            ColumnSet::Regex { nullable, .. } => *nullable,
        }
    }

    /// Does this set accept a column access of `column_name`?
    pub fn accepts(&self, column_name: &str) -> bool {
        match self {
            ColumnSet::Explicit { members, .. } => members.iter().any(|m| m == column_name),
            ColumnSet::Regex { compiled, .. } => compiled.0.is_match(column_name),
        }
    }

    /// Flat expansion to a list of names. Fails for regex sets — they
    /// cannot be enumerated.
    pub fn expand(&self) -> Result<Vec<String>, ColumnSetError> {
        match self {
            ColumnSet::Explicit { members, .. } => Ok(members.clone()),
            ColumnSet::Regex { pattern, .. } => Err(ColumnSetError::CannotExpandRegex {
                pattern: pattern.clone(),
            }),
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, ColumnSet::Regex { .. })
    }
}
