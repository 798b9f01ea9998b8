//! [`ColumnGroup`]: an ergonomic bundle of columns and/or explicit column
//! sets.

use serde::Serialize;

use crate::schema::column::Column;
use crate::schema::columnset::{ColumnSet, ColumnSetError};

#[derive(Debug, Clone, Serialize)]
pub enum GroupMember {
    Column(Column),
    ColumnSet(ColumnSet),
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnGroup {
    pub name: String,
    pub members: Vec<GroupMember>,
}

impl ColumnGroup {
    pub fn new(name: impl Into<String>, members: Vec<GroupMember>) -> Self {
        Self {
            name: name.into(),
            members,
        }
    }

    /// Flat expansion. Fails if any member is a regex set.
    pub fn expand(&self) -> Result<Vec<String>, ColumnSetError> {
        let mut names = Vec::new();
        for member in &self.members {
            match member {
                GroupMember::Column(c) => names.push(c.name.clone()),
                GroupMember::ColumnSet(set) => names.extend(set.expand()?),
            }
        }
        Ok(names)
    }

    pub fn accepts(&self, column_name: &str) -> bool {
        self.members.iter().any(|m| match m {
            GroupMember::Column(c) => c.name == column_name,
            GroupMember::ColumnSet(set) => set.accepts(column_name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::column::ColumnType;

    #[test]
    fn expand_fails_with_regex_member() {
        let group = ColumnGroup::new(
            "g",
            vec![
                GroupMember::Column(Column::new("a", ColumnType::Int, false)),
                GroupMember::ColumnSet(ColumnSet::regex("m", ColumnType::Int, false, r"^x\d+$").unwrap()),
            ],
        );
        assert!(group.expand().is_err());
    }

    #[test]
    fn expand_succeeds_with_only_explicit_members() {
        let group = ColumnGroup::new(
            "g",
            vec![
                GroupMember::Column(Column::new("a", ColumnType::Int, false)),
                GroupMember::ColumnSet(ColumnSet::explicit(
                    "s",
                    ColumnType::Int,
                    false,
                    vec!["b".into(), "c".into()],
                )),
            ],
        );
        assert_eq!(group.expand().unwrap(), vec!["a", "b", "c"]);
    }
}
