//! Recognizes schema-declaration call shapes in source and builds
//! [`Schema`] values from them, for both the annotation resolver's local
//! lookups and the project index's cross-file records.
//!
//! Declaration shape:
//! ```text
//! S = Schema("S", [
//!     Column("a", "int", False),
//!     ColumnSet("metrics", "float", False, ["m1", "m2"]),
//!     RegexColumnSet("tags", "str", True, r"^tag_\w+$"),
//! ], allow_extra_columns=False)
//! ```
//! Anything not matching this shape is simply not a schema declaration —
//! no diagnostic, the binding is just an ordinary value as far as this
//! module is concerned.

use crate::schema::{Column, ColumnGroup, ColumnSet, ColumnType, GroupMember, Schema, SchemaMember};
use crate::syntax::ast::Expr;

/// Try to read `value` as a `Schema(...)` builder call and materialize it.
/// Returns `None` for anything that isn't that exact shape.
pub fn schema_from_expr(binding_name: &str, value: &Expr) -> Option<Schema> {
    let Expr::Call {
        callee,
        args,
        keywords,
    } = value
    else {
        return None;
    };
    if callee.last_segment() != Some("Schema") {
        return None;
    }

    let name = args
        .first()
        .and_then(Expr::as_str_literal)
        .unwrap_or(binding_name)
        .to_string();

    let members_expr = args.get(1)?;
    let Expr::List(items) = members_expr else {
        return None;
    };

    let members = items.iter().filter_map(member_from_expr).collect();

    let allow_extra = keywords
        .iter()
        .find(|(k, _)| k == "allow_extra_columns")
        .map(|(_, v)| matches!(v, Expr::Bool(true)))
        .unwrap_or(false);

    Some(Schema::new(name, members, allow_extra))
}

fn member_from_expr(expr: &Expr) -> Option<SchemaMember> {
    let call = match expr {
        Expr::Call { callee, args, .. } => (callee.last_segment()?, args),
        _ => return None,
    };
    match call.0 {
        "Column" => column_from_args(call.1).map(SchemaMember::Column),
        "ColumnSet" => columnset_from_args(call.1, false).map(SchemaMember::ColumnSet),
        "RegexColumnSet" => columnset_from_args(call.1, true).map(SchemaMember::ColumnSet),
        "ColumnGroup" => columngroup_from_args(call.1).map(SchemaMember::ColumnGroup),
        _ => None,
    }
}

fn column_from_args(args: &[Expr]) -> Option<Column> {
    let name = args.first()?.as_str_literal()?;
    let type_tag = args
        .get(1)
        .and_then(Expr::as_str_literal)
        .and_then(ColumnType::parse)
        .unwrap_or(ColumnType::Any);
    let nullable = matches!(args.get(2), Some(Expr::Bool(true)));
    Some(Column::new(name, type_tag, nullable))
}

fn columnset_from_args(args: &[Expr], is_regex: bool) -> Option<ColumnSet> {
    let name = args.first()?.as_str_literal()?;
    let type_tag = args
        .get(1)
        .and_then(Expr::as_str_literal)
        .and_then(ColumnType::parse)
        .unwrap_or(ColumnType::Any);
    let nullable = matches!(args.get(2), Some(Expr::Bool(true)));
    let last = args.get(3)?;
    if is_regex {
        let pattern = last.as_str_literal()?;
        ColumnSet::regex(name, type_tag, nullable, pattern).ok()
    } else {
        let members = last.as_str_list()?;
        Some(ColumnSet::explicit(name, type_tag, nullable, members))
    }
}

fn columngroup_from_args(args: &[Expr]) -> Option<ColumnGroup> {
    let name = args.first()?.as_str_literal()?;
    let members_expr = args.get(1)?;
    let Expr::List(items) = members_expr else {
        return None;
    };
    let members = items
        .iter()
        .filter_map(|item| match member_from_expr(item)? {
            SchemaMember::Column(c) => Some(GroupMember::Column(c)),
            SchemaMember::ColumnSet(s) => Some(GroupMember::ColumnSet(s)),
            SchemaMember::ColumnGroup(_) => None,
        })
        .collect();
    Some(ColumnGroup::new(name, members))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_source;
    use std::path::PathBuf;

    #[test]
    fn recognizes_schema_with_columns() {
        let src = "S = Schema(\"S\", [Column(\"a\", \"int\", False), Column(\"b\", \"str\", True)])\n";
        let module = parse_source(&PathBuf::from("t.py"), src).unwrap();
        let crate::syntax::ast::Stmt::Assign { target, value, .. } = &module.body[0].node else {
            panic!("expected assign");
        };
        let schema = schema_from_expr(target, value).expect("should recognize schema");
        assert_eq!(schema.name, "S");
        assert_eq!(schema.columns(), vec!["a", "b"]);
    }

    #[test]
    fn non_schema_call_is_not_recognized() {
        let src = "df = read_csv(\"u.csv\")\n";
        let module = parse_source(&PathBuf::from("t.py"), src).unwrap();
        let crate::syntax::ast::Stmt::Assign { target, value, .. } = &module.body[0].node else {
            panic!("expected assign");
        };
        assert!(schema_from_expr(target, value).is_none());
    }
}
