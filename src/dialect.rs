//! Closed vocabularies the engine dispatches on: the two supported
//! DataFrame-library type names, the load-call catalogue, and the
//! method-effect catalogue.
//!
//! Kept separate from `engine` so the closed lists can be read and
//! extended without touching inference logic — the same separation kept
//! between a closed, exhaustively matched ID enum and the bodies that
//! dispatch on it.

use strum_macros::{EnumIter, EnumString, IntoStaticStr};

/// Final-attribute-name match for "this is a DataFrame-shaped type",
/// matched structurally by final attribute name. Covers the generic `DF`
/// alias annotations are commonly written with, plus the two libraries'
/// own class names for annotations spelled out in full.
pub const DATAFRAME_TYPE_NAMES: &[&str] = &["DF", "DataFrame", "LazyFrame"];

/// Keyword arguments on a load call that carry column information.
pub const COLUMN_BEARING_KEYWORDS: &[&str] = &["usecols", "columns", "schema", "dtype"];

/// A recognized load call: receiver-module + function-name pair drawn
/// from a closed list covering CSV/parquet/JSON/Excel for both libraries,
/// including the polars lazy `scan_*` variants — same load shape, different
/// eagerness, irrelevant to static analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr)]
pub enum LoadKind {
    ReadCsv,
    ReadParquet,
    ReadJson,
    ReadExcel,
    ScanCsv,
    ScanParquet,
}

impl LoadKind {
    /// Recognize a load call by its final callee segment, e.g. the `c` in
    /// `pd.read_csv(...)` or a bare `read_csv(...)` after
    /// `from pandas import read_csv`.
    pub fn from_callee_name(name: &str) -> Option<Self> {
        match name {
            "read_csv" => Some(Self::ReadCsv),
            "read_parquet" => Some(Self::ReadParquet),
            "read_json" => Some(Self::ReadJson),
            "read_excel" => Some(Self::ReadExcel),
            "scan_csv" => Some(Self::ScanCsv),
            "scan_parquet" => Some(Self::ScanParquet),
            _ => None,
        }
    }
}

/// How a recognized DataFrame method affects the receiver's column-set
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodEffect {
    /// Subscript assignment / `del` / `drop` / `assign` / `rename` /
    /// `select` / `pop` / `insert` / list-subscript: handled with bespoke
    /// logic in the engine (each narrows/extends/renames differently),
    /// this variant just marks "don't passthrough, don't untrack".
    SchemaModifying,
    /// Row-only operations: result state equals receiver state verbatim.
    Passthrough,
    /// Output columns are statically undecidable: result state is
    /// `Untracked` regardless of receiver state.
    Untracked,
}

const SCHEMA_MODIFYING_METHODS: &[&str] =
    &["drop", "assign", "rename", "select", "pop", "insert"];

const PASSTHROUGH_METHODS: &[&str] = &[
    "filter",
    "query",
    "head",
    "tail",
    "sample",
    "sort_values",
    "sort",
    "reset_index",
    "nlargest",
    "nsmallest",
    "fillna",
    "dropna",
    "ffill",
    "bfill",
];

const UNTRACKED_METHODS: &[&str] = &[
    "join",
    "merge",
    "pivot",
    "pivot_table",
    "melt",
    "explode",
    "get_dummies",
    "stack",
    "unstack",
    "apply",
    "map",
    "transform",
    "agg",
    "with_columns",
];

/// Look up the effect of calling `method` on a DataFrame-stated binding.
/// Unrecognized method names are `None` — the engine treats them the same
/// as `Untracked`.
pub fn method_effect(method: &str) -> Option<MethodEffect> {
    if SCHEMA_MODIFYING_METHODS.contains(&method) {
        Some(MethodEffect::SchemaModifying)
    } else if PASSTHROUGH_METHODS.contains(&method) {
        Some(MethodEffect::Passthrough)
    } else if UNTRACKED_METHODS.contains(&method) {
        Some(MethodEffect::Untracked)
    } else {
        None
    }
}

/// Module-level functions that union their DataFrame-shaped arguments:
/// `merge(a, b, ...)` / `concat([a, b, ...], ...)`.
pub fn is_module_level_union_call(name: &str) -> bool {
    matches!(name, "merge" | "concat")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_load_calls() {
        assert_eq!(LoadKind::from_callee_name("read_csv"), Some(LoadKind::ReadCsv));
        assert_eq!(LoadKind::from_callee_name("scan_parquet"), Some(LoadKind::ScanParquet));
        assert_eq!(LoadKind::from_callee_name("to_csv"), None);
    }

    #[test]
    fn classifies_method_effects() {
        assert_eq!(method_effect("rename"), Some(MethodEffect::SchemaModifying));
        assert_eq!(method_effect("filter"), Some(MethodEffect::Passthrough));
        assert_eq!(method_effect("pivot"), Some(MethodEffect::Untracked));
        assert_eq!(method_effect("frobnicate"), None);
    }
}
