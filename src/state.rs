//! [`ColumnSetState`]: the engine's per-binding runtime representation,
//! plus the rename ledger and the conservative-meet control-flow join.

use std::collections::HashSet;

use crate::schema::Schema;

/// The engine's per-binding runtime representation. A `Schema(S)` state
/// degrades to `Inferred` when a schema-modifying operation rewrites the
/// column set in a way that no longer matches the declared schema
/// identity.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSetState {
    /// The binding is known to conform to schema `S`.
    Schema(Schema),
    /// Column names collected from load calls and propagated through
    /// operations, without a named schema.
    Inferred {
        names: HashSet<String>,
        regex_sets: Vec<String>,
    },
    /// No column information; validation is suppressed.
    Unknown,
    /// Produced by an operation whose output columns are undecidable
    /// statically; no validation, no propagation.
    Untracked,
}

impl ColumnSetState {
    pub fn inferred(names: impl IntoIterator<Item = String>) -> Self {
        ColumnSetState::Inferred {
            names: names.into_iter().collect(),
            regex_sets: Vec::new(),
        }
    }

    pub fn empty_inferred() -> Self {
        ColumnSetState::Inferred {
            names: HashSet::new(),
            regex_sets: Vec::new(),
        }
    }

    /// Validates a single column-name reference against this state.
    /// Returns `true` if the name is accepted; `Unknown`/`Untracked`
    /// always accept.
    pub fn accepts(&self, name: &str) -> bool {
        match self {
            ColumnSetState::Schema(s) => s.has(name),
            ColumnSetState::Inferred { names, regex_sets } => {
                names.contains(name) || regex_sets.iter().any(|p| regex_matches(p, name))
            }
            ColumnSetState::Unknown | ColumnSetState::Untracked => true,
        }
    }

    /// All concrete names currently believed to exist, used for typo
    /// suggestions. Empty for `Unknown`/`Untracked` (no information) and
    /// for a `Schema` state, the schema's own concrete column list.
    pub fn known_names(&self) -> Vec<String> {
        match self {
            ColumnSetState::Schema(s) => s.columns(),
            ColumnSetState::Inferred { names, .. } => {
                let mut v: Vec<String> = names.iter().cloned().collect();
                v.sort();
                v
            }
            ColumnSetState::Unknown | ColumnSetState::Untracked => Vec::new(),
        }
    }

    /// Degrade a `Schema(S)` state to `Inferred` after a schema-modifying
    /// operation (rename/drop/assign/...) rewrites the column set. Other
    /// states pass through the same transformation on their own terms.
    pub fn degrade_to_inferred(&self) -> ColumnSetState {
        match self {
            ColumnSetState::Schema(s) => ColumnSetState::inferred(s.columns()),
            other => other.clone(),
        }
    }

    pub fn with_added(&self, added: &[String]) -> ColumnSetState {
        let mut next = self.degrade_to_inferred();
        if let ColumnSetState::Inferred { names, .. } = &mut next {
            names.extend(added.iter().cloned());
        }
        next
    }

    pub fn with_removed(&self, removed: &[String]) -> ColumnSetState {
        let mut next = self.degrade_to_inferred();
        if let ColumnSetState::Inferred { names, .. } = &mut next {
            for r in removed {
                names.remove(r);
            }
        }
        next
    }

    /// Narrow to exactly the listed names (`select`/list-subscript).
    pub fn narrowed_to(&self, kept: &[String]) -> ColumnSetState {
        ColumnSetState::inferred(kept.iter().cloned())
    }

    /// Whether a reference on this state should be validated at all.
    pub fn is_validated(&self) -> bool {
        !matches!(self, ColumnSetState::Unknown | ColumnSetState::Untracked)
    }

    /// Conservative meet over a control-flow join:
    /// `Schema(S) ∧ Schema(S) = Schema(S)`; `Untracked ∧ X = Untracked`;
    /// any other combination degrades to `Unknown`.
    pub fn meet(&self, other: &ColumnSetState) -> ColumnSetState {
        match (self, other) {
            (ColumnSetState::Untracked, _) | (_, ColumnSetState::Untracked) => ColumnSetState::Untracked,
            (ColumnSetState::Schema(a), ColumnSetState::Schema(b)) if a.name == b.name => {
                ColumnSetState::Schema(a.clone())
            }
            (a, b) if a == b => a.clone(),
            _ => ColumnSetState::Unknown,
        }
    }
}

fn regex_matches(pattern: &str, name: &str) -> bool {
    regex::Regex::new(pattern)
        .map(|re| re.is_match(name))
        .unwrap_or(false)
}

/// Per-binding map from an old column name to the name that replaced it.
/// A hit takes precedence over whatever the current state otherwise says.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenameLedger {
    entries: std::collections::HashMap<String, String>,
}

impl RenameLedger {
    pub fn record(&mut self, old: &str, new: &str) {
        self.entries.insert(old.to_string(), new.to_string());
    }

    pub fn lookup(&self, old: &str) -> Option<&str> {
        self.entries.get(old).map(String::as_str)
    }

    /// Ledgers intersect at a control-flow join: only
    /// entries present and identical on both branches survive.
    pub fn intersect(&self, other: &RenameLedger) -> RenameLedger {
        let mut out = RenameLedger::default();
        for (k, v) in &self.entries {
            if other.entries.get(k) == Some(v) {
                out.entries.insert(k.clone(), v.clone());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Column, ColumnType, Schema, SchemaMember};

    fn schema(name: &str, cols: &[&str]) -> Schema {
        Schema::new(
            name,
            cols.iter()
                .map(|c| SchemaMember::Column(Column::new(*c, ColumnType::Int, false)))
                .collect(),
            false,
        )
    }

    #[test]
    fn unknown_and_untracked_accept_everything() {
        assert!(ColumnSetState::Unknown.accepts("anything"));
        assert!(ColumnSetState::Untracked.accepts("anything"));
    }

    #[test]
    fn schema_state_degrades_on_rename() {
        let s = ColumnSetState::Schema(schema("S", &["a", "b"]));
        let next = s.with_removed(&["a".to_string()]).with_added(&["c".to_string()]);
        assert!(matches!(next, ColumnSetState::Inferred { .. }));
        assert!(next.accepts("b"));
        assert!(next.accepts("c"));
        assert!(!next.accepts("a"));
    }

    #[test]
    fn meet_of_identical_schemas_preserves_schema() {
        let a = ColumnSetState::Schema(schema("S", &["a"]));
        let b = ColumnSetState::Schema(schema("S", &["a"]));
        assert!(matches!(a.meet(&b), ColumnSetState::Schema(_)));
    }

    #[test]
    fn meet_of_untracked_dominates() {
        let a = ColumnSetState::Untracked;
        let b = ColumnSetState::Schema(schema("S", &["a"]));
        assert_eq!(a.meet(&b), ColumnSetState::Untracked);
        assert_eq!(b.meet(&a), ColumnSetState::Untracked);
    }

    #[test]
    fn meet_of_unrelated_states_is_unknown() {
        let a = ColumnSetState::Schema(schema("S", &["a"]));
        let b = ColumnSetState::inferred(["a".to_string()]);
        assert_eq!(a.meet(&b), ColumnSetState::Unknown);
    }

    #[test]
    fn ledger_intersection_keeps_only_agreeing_entries() {
        let mut left = RenameLedger::default();
        left.record("old", "new");
        left.record("x", "y");
        let mut right = RenameLedger::default();
        right.record("old", "new");
        right.record("x", "z");

        let merged = left.intersect(&right);
        assert_eq!(merged.lookup("old"), Some("new"));
        assert_eq!(merged.lookup("x"), None);
    }
}
