//! Column-set inference engine — the heart of the analyzer. Walks one
//! file's syntax tree, maintains per-binding column-set states plus
//! rename ledgers, applies the load and method-effect catalogues, and
//! emits diagnostics.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::config::EngineConfig;
use crate::dialect::{self, LoadKind, MethodEffect};
use crate::diagnostics::{self, Diagnostic, DiagnosticCode};
use crate::index::{FunctionSignature, ProjectIndex};
use crate::resolve::AnnotationResolver;
use crate::schema::Schema;
use crate::state::{ColumnSetState, RenameLedger};
use crate::syntax::ast::{Expr, FunctionDef, Import, Module, Stmt};
use crate::syntax::span::SourceSpan;

/// A binding's full runtime representation: its column-set state plus its
/// own rename ledger (the ledger lives per-binding, not globally).
#[derive(Debug, Clone, PartialEq)]
struct Evaluated {
    state: ColumnSetState,
    ledger: RenameLedger,
}

impl Evaluated {
    fn unknown() -> Self {
        Self {
            state: ColumnSetState::Unknown,
            ledger: RenameLedger::default(),
        }
    }

    fn untracked() -> Self {
        Self {
            state: ColumnSetState::Untracked,
            ledger: RenameLedger::default(),
        }
    }

    fn schema(s: Schema) -> Self {
        Self {
            state: ColumnSetState::Schema(s),
            ledger: RenameLedger::default(),
        }
    }

    fn meet(&self, other: &Evaluated) -> Evaluated {
        Evaluated {
            state: self.state.meet(&other.state),
            ledger: self.ledger.intersect(&other.ledger),
        }
    }
}

type Scope = HashMap<String, Evaluated>;

/// Analyze one already-parsed file against an optional project index.
/// Produces a deterministic, ordered list of diagnostics; no state
/// survives beyond this call.
pub fn analyze_file(
    path: &Path,
    module: &Module,
    module_name: &str,
    config: &EngineConfig,
    index: Option<&ProjectIndex>,
) -> Vec<Diagnostic> {
    if !config.enabled {
        return Vec::new();
    }

    let local_schemas = local_schema_declarations(module);
    let local_functions = local_function_signatures(module);
    let imports: Vec<Import> = module.imports.iter().map(|i| i.node.clone()).collect();

    let mut analyzer = Analyzer {
        path: path.to_path_buf(),
        module_name: module_name.to_string(),
        config,
        index,
        local_schemas,
        local_functions,
        imports,
        diagnostics: Vec::new(),
    };

    let mut scope = Scope::new();
    analyzer.analyze_block(&module.body, &mut scope);

    diagnostics::finalize(analyzer.diagnostics)
}

fn local_schema_declarations(module: &Module) -> BTreeMap<String, Schema> {
    let mut out = BTreeMap::new();
    for stmt in &module.body {
        if let Stmt::Assign { target, value, .. } = &stmt.node {
            if let Some(schema) = crate::index::declare::schema_from_expr(target, value) {
                out.insert(target.clone(), schema);
            }
        }
    }
    out
}

fn local_function_signatures(module: &Module) -> BTreeMap<String, FunctionSignature> {
    let mut out = BTreeMap::new();
    for stmt in &module.body {
        if let Stmt::FunctionDef(f) = &stmt.node {
            out.insert(
                f.name.clone(),
                FunctionSignature {
                    params: f.params.iter().map(|p| (p.name.clone(), p.annotation.clone())).collect(),
                    return_annotation: f.return_annotation.clone(),
                },
            );
        }
    }
    out
}

struct Analyzer<'a> {
    path: PathBuf,
    module_name: String,
    config: &'a EngineConfig,
    index: Option<&'a ProjectIndex>,
    local_schemas: BTreeMap<String, Schema>,
    local_functions: BTreeMap<String, FunctionSignature>,
    imports: Vec<Import>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Analyzer<'a> {
    fn resolver(&self) -> AnnotationResolver<'_> {
        AnnotationResolver::new(&self.module_name, &self.local_schemas, &self.imports, self.index)
    }

    /// Whether `code` should actually be raised right now: codes gated by
    /// `strict-ingest` only fire once the configuration turns it on.
    fn strict_ingest_gate(&self, code: DiagnosticCode) -> bool {
        !code.requires_strict_ingest() || self.config.strict_ingest
    }

    fn analyze_block(&mut self, body: &[crate::syntax::Located<Stmt>], scope: &mut Scope) {
        for located in body {
            self.analyze_stmt(&located.node, located.span, scope);
        }
    }

    fn analyze_stmt(&mut self, stmt: &Stmt, span: SourceSpan, scope: &mut Scope) {
        match stmt {
            Stmt::Assign { target, annotation, value } => {
                let evaluated = match annotation.as_ref().and_then(|ann| self.resolver().resolve(ann)) {
                    Some(schema) => Evaluated::schema(schema),
                    None => self.eval_expr(value, span, scope),
                };
                scope.insert(target.clone(), evaluated);
            }
            Stmt::SubscriptAssign { base, index, value } => {
                self.eval_expr(value, span, scope);
                if let (Some(name), Some(col)) = (base_name(base), index.as_str_literal()) {
                    if let Some(current) = scope.get(name) {
                        let next = Evaluated {
                            state: current.state.with_added(&[col.to_string()]),
                            ledger: current.ledger.clone(),
                        };
                        scope.insert(name.to_string(), next);
                    }
                }
            }
            Stmt::AttributeAssign { value, .. } => {
                self.eval_expr(value, span, scope);
            }
            Stmt::DelSubscript { base, index } => {
                if let (Some(name), Some(col)) = (base_name(base), index.as_str_literal()) {
                    if let Some(current) = scope.get(name) {
                        let next = Evaluated {
                            state: current.state.with_removed(&[col.to_string()]),
                            ledger: current.ledger.clone(),
                        };
                        scope.insert(name.to_string(), next);
                    }
                }
            }
            Stmt::Expr(expr) => {
                self.eval_expr(expr, span, scope);
            }
            Stmt::FunctionDef(f) => {
                self.analyze_function(f, scope);
            }
            Stmt::If { then_body, else_body } => {
                let mut then_scope = scope.clone();
                self.analyze_block(then_body, &mut then_scope);
                let mut else_scope = scope.clone();
                self.analyze_block(else_body, &mut else_scope);

                let mut joined = Scope::new();
                for (name, then_val) in &then_scope {
                    if let Some(else_val) = else_scope.get(name) {
                        joined.insert(name.clone(), then_val.meet(else_val));
                    }
                }
                *scope = joined;
            }
            Stmt::Loop { body } => {
                // Analyzed once, straight-line — the catalogue is monotone
                // enough that re-applying it to a fixpoint isn't needed.
                self.analyze_block(body, scope);
            }
            Stmt::Return(expr) => {
                if let Some(expr) = expr {
                    self.eval_expr(expr, span, scope);
                }
            }
            Stmt::Other => {}
        }
    }

    fn analyze_function(&mut self, f: &FunctionDef, outer_scope: &Scope) {
        let mut fn_scope = outer_scope.clone();
        for param in &f.params {
            let evaluated = match param.annotation.as_ref().and_then(|ann| self.resolver().resolve(ann)) {
                Some(schema) => Evaluated::schema(schema),
                None => Evaluated::unknown(),
            };
            fn_scope.insert(param.name.clone(), evaluated);
        }
        self.analyze_block(&f.body, &mut fn_scope);
    }

    /// Evaluate an expression to the [`Evaluated`] it produces, emitting
    /// any validation diagnostics encountered along the way.
    fn eval_expr(&mut self, expr: &Expr, span: SourceSpan, scope: &Scope) -> Evaluated {
        match expr {
            Expr::Name(name) => scope.get(name).cloned().unwrap_or_else(Evaluated::unknown),

            Expr::Subscript { base, index } => self.eval_subscript(base, index, span, scope),

            Expr::Call { callee, args, keywords } => self.eval_call(callee, args, keywords, span, scope),

            _ => Evaluated::unknown(),
        }
    }

    fn eval_subscript(&mut self, base: &Expr, index: &Expr, span: SourceSpan, scope: &Scope) -> Evaluated {
        let base_eval = self.eval_expr(base, span, scope);

        if let Some(name) = index.as_str_literal() {
            self.validate_reference(&base_eval, name, span);
            return base_eval;
        }

        if let Some(names) = index.as_str_list() {
            for name in &names {
                self.validate_reference(&base_eval, name, span);
            }
            return Evaluated {
                state: base_eval.state.narrowed_to(&names),
                ledger: RenameLedger::default(),
            };
        }

        base_eval
    }

    /// A single column-name reference against an already-evaluated
    /// binding: rename ledger hits take precedence over the current
    /// state, `Unknown`/`Untracked` never produce a diagnostic.
    fn validate_reference(&mut self, binding: &Evaluated, name: &str, span: SourceSpan) {
        if let Some(new_name) = binding.ledger.lookup(name) {
            self.diagnostics.push(Diagnostic::new(
                &self.path,
                span.start_line,
                span.start_col,
                DiagnosticCode::E002,
                format!("column {name:?} was renamed to {new_name:?}"),
            ));
            return;
        }

        if !binding.state.is_validated() {
            return;
        }

        if binding.state.accepts(name) {
            return;
        }

        let known = binding.state.known_names();
        let mut message = format!(
            "column {name:?} not found; known columns: {}",
            diagnostics::known_columns_clause(&known)
        );
        if let Some(suggestion) = diagnostics::suggest(name, &known) {
            message.push_str(&format!("; did you mean {suggestion:?}?"));
        }
        self.diagnostics
            .push(Diagnostic::new(&self.path, span.start_line, span.start_col, DiagnosticCode::E001, message));
    }

    fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        keywords: &[(String, Expr)],
        span: SourceSpan,
        scope: &Scope,
    ) -> Evaluated {
        if let Some(method) = callee_as_method(callee) {
            let receiver = self.eval_expr(method.1, span, scope);
            self.validate_col_builder_args(&receiver, args, keywords, span);
            return self.apply_method(method.0, &receiver, args, keywords, span);
        }

        if let Expr::Name(name) = callee {
            if let Some(kind) = LoadKind::from_callee_name(name) {
                return self.eval_load(kind, args, keywords, span);
            }
            if dialect::is_module_level_union_call(name) {
                return self.eval_union_call(name, args, span, scope);
            }
            if let Some(schema) = self.resolve_call_return_schema(name, scope) {
                return Evaluated::schema(schema);
            }
        }

        Evaluated::untracked()
    }

    fn eval_load(&mut self, _kind: LoadKind, _args: &[Expr], keywords: &[(String, Expr)], span: SourceSpan) -> Evaluated {
        for (key, value) in keywords {
            if !dialect::COLUMN_BEARING_KEYWORDS.contains(&key.as_str()) {
                continue;
            }
            if let Some(names) = value.as_str_list() {
                return Evaluated {
                    state: ColumnSetState::inferred(names),
                    ledger: RenameLedger::default(),
                };
            }
            if let Some(names) = value.as_str_keyed_dict() {
                return Evaluated {
                    state: ColumnSetState::inferred(names),
                    ledger: RenameLedger::default(),
                };
            }
        }

        if self.strict_ingest_gate(DiagnosticCode::W001) {
            self.diagnostics.push(Diagnostic::new(
                &self.path,
                span.start_line,
                span.start_col,
                DiagnosticCode::W001,
                "bare load call carries no column information".to_string(),
            ));
        }
        Evaluated::unknown()
    }

    fn eval_union_call(&mut self, name: &str, args: &[Expr], span: SourceSpan, scope: &Scope) -> Evaluated {
        let operands: Vec<&Expr> = if name == "concat" {
            match args.first() {
                Some(Expr::List(items)) => items.iter().collect(),
                _ => Vec::new(),
            }
        } else {
            args.iter().collect()
        };

        let evaluated: Vec<Evaluated> = operands
            .into_iter()
            .map(|e| self.eval_expr(e, span, scope))
            .collect();

        let mut iter = evaluated.into_iter();
        let Some(first) = iter.next() else {
            return Evaluated::unknown();
        };

        let combined = iter.fold(first, |acc, next| match (&acc.state, &next.state) {
            (ColumnSetState::Schema(a), ColumnSetState::Schema(b)) => match a.combine(b) {
                Ok(s) => Evaluated::schema(s),
                Err(_) => {
                    let mut names = a.columns();
                    names.extend(b.columns());
                    Evaluated {
                        state: ColumnSetState::inferred(names),
                        ledger: RenameLedger::default(),
                    }
                }
            },
            _ => {
                let mut names = acc.state.known_names();
                names.extend(next.state.known_names());
                Evaluated {
                    state: ColumnSetState::inferred(names),
                    ledger: RenameLedger::default(),
                }
            }
        });
        combined
    }

    fn apply_method(
        &mut self,
        method: &str,
        receiver: &Evaluated,
        args: &[Expr],
        keywords: &[(String, Expr)],
        span: SourceSpan,
    ) -> Evaluated {
        match dialect::method_effect(method) {
            Some(MethodEffect::Passthrough) => receiver.clone(),
            Some(MethodEffect::Untracked) | None => Evaluated::untracked(),
            Some(MethodEffect::SchemaModifying) => self.apply_schema_modifying(method, receiver, args, keywords, span),
        }
    }

    fn apply_schema_modifying(
        &mut self,
        method: &str,
        receiver: &Evaluated,
        args: &[Expr],
        keywords: &[(String, Expr)],
        span: SourceSpan,
    ) -> Evaluated {
        match method {
            "assign" => {
                let added: Vec<String> = keywords.iter().map(|(k, _)| k.clone()).collect();
                Evaluated {
                    state: receiver.state.with_added(&added),
                    ledger: receiver.ledger.clone(),
                }
            }
            "drop" => {
                let names = drop_target_names(args, keywords);
                for name in &names {
                    if !receiver.state.accepts(name) && receiver.state.is_validated() && self.strict_ingest_gate(DiagnosticCode::W002) {
                        self.diagnostics.push(Diagnostic::new(
                            &self.path,
                            span.start_line,
                            span.start_col,
                            DiagnosticCode::W002,
                            format!("drop target {name:?} is not a known column"),
                        ));
                    }
                }
                Evaluated {
                    state: receiver.state.with_removed(&names),
                    ledger: receiver.ledger.clone(),
                }
            }
            "rename" => {
                let mapping = keywords
                    .iter()
                    .find(|(k, _)| k == "columns")
                    .and_then(|(_, v)| match v {
                        Expr::Dict(pairs) => Some(pairs.clone()),
                        _ => None,
                    })
                    .unwrap_or_default();

                let mut next_state = receiver.state.clone();
                let mut next_ledger = receiver.ledger.clone();
                for (old_expr, new_expr) in &mapping {
                    let (Some(old), Some(new)) = (old_expr.as_str_literal(), new_expr.as_str_literal()) else {
                        continue;
                    };
                    next_state = next_state.with_removed(&[old.to_string()]).with_added(&[new.to_string()]);
                    next_ledger.record(old, new);
                }
                Evaluated {
                    state: next_state,
                    ledger: next_ledger,
                }
            }
            "select" => {
                let names = args
                    .first()
                    .and_then(Expr::as_str_list)
                    .unwrap_or_else(|| col_builder_names(args));
                Evaluated {
                    state: receiver.state.narrowed_to(&names),
                    ledger: RenameLedger::default(),
                }
            }
            "pop" => {
                let names: Vec<String> = args.first().and_then(Expr::as_str_literal).map(String::from).into_iter().collect();
                Evaluated {
                    state: receiver.state.with_removed(&names),
                    ledger: receiver.ledger.clone(),
                }
            }
            "insert" => {
                let name = args.get(1).and_then(Expr::as_str_literal).map(String::from);
                Evaluated {
                    state: receiver.state.with_added(&name.into_iter().collect::<Vec<_>>()),
                    ledger: receiver.ledger.clone(),
                }
            }
            _ => receiver.clone(),
        }
    }

    fn validate_col_builder_args(&mut self, receiver: &Evaluated, args: &[Expr], keywords: &[(String, Expr)], span: SourceSpan) {
        for name in col_builder_names(args) {
            self.validate_reference(receiver, &name, span);
        }
        for (key, value) in keywords {
            if matches!(key.as_str(), "on" | "left_on" | "right_on") {
                if let Some(name) = value.as_str_literal() {
                    self.validate_reference(receiver, name, span);
                }
            }
        }
    }

    fn resolve_call_return_schema(&self, name: &str, _scope: &Scope) -> Option<Schema> {
        if let Some(sig) = self.local_functions.get(name) {
            if let Some(ann) = &sig.return_annotation {
                return self.resolver().resolve(ann);
            }
        }

        let index = self.index?;
        for import in &self.imports {
            if let Import::From { module, name: imported, alias } = import {
                let visible = alias.as_deref().unwrap_or(imported.as_str());
                if visible == name {
                    let target_module = module.join(".");
                    return self.resolve_remote_function(index, &target_module, imported);
                }
            }
        }
        None
    }

    fn resolve_remote_function(&self, index: &ProjectIndex, module_name: &str, fn_name: &str) -> Option<Schema> {
        let record = index.module(module_name)?;
        let sig = record.functions.get(fn_name)?;
        let ann = sig.return_annotation.as_ref()?;
        let resolver = AnnotationResolver::new(module_name, &record.schemas, &record.imports, Some(index));
        resolver.resolve(ann)
    }
}

fn base_name(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Name(n) => Some(n.as_str()),
        _ => None,
    }
}

fn callee_as_method(callee: &Expr) -> Option<(&str, &Expr)> {
    match callee {
        Expr::Attribute { base, attr } => Some((attr.as_str(), base.as_ref())),
        _ => None,
    }
}

fn drop_target_names(args: &[Expr], keywords: &[(String, Expr)]) -> Vec<String> {
    if let Some(names) = args.first().and_then(Expr::as_str_list) {
        return names;
    }
    keywords
        .iter()
        .find(|(k, _)| k == "columns")
        .and_then(|(_, v)| v.as_str_list())
        .unwrap_or_default()
}

fn col_builder_names(args: &[Expr]) -> Vec<String> {
    args.iter()
        .filter_map(|a| match a {
            Expr::Call { callee, args, .. } if callee.last_segment() == Some("col") => {
                args.first().and_then(Expr::as_str_literal).map(String::from)
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_source;
    use std::path::PathBuf;

    fn analyze(source: &str) -> Vec<Diagnostic> {
        let module = parse_source(&PathBuf::from("t.py"), source).unwrap();
        analyze_file(&PathBuf::from("t.py"), &module, "t", &EngineConfig::default(), None)
    }

    #[test]
    fn inferred_load_with_unknown_column_is_e001() {
        let source = "df = read_csv(\"u.csv\", usecols=[\"user_id\",\"email\"])\ndf[\"age\"]\n";
        let diags = analyze(source);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::E001);
        assert_eq!(diags[0].line, 2);
    }

    #[test]
    fn typo_gets_a_suggestion() {
        let source = "df = read_csv(\"u.csv\", usecols=[\"revenue\"])\ndf[\"revnue\"]\n";
        let diags = analyze(source);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("revenue"));
    }

    #[test]
    fn rename_ledger_hit_is_e002() {
        let source = "df = read_csv(\"u.csv\", usecols=[\"email\"])\nrenamed = df.rename(columns={\"email\": \"email_address\"})\nrenamed[\"email\"]\n";
        let diags = analyze(source);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::E002);
        assert!(diags[0].message.contains("email_address"));
    }

    #[test]
    fn drop_unknown_column_needs_strict_ingest() {
        let source = "df = read_csv(\"u.csv\", usecols=[\"a\",\"b\"])\ndf.drop(columns=[\"nope\"])\n";
        let module = parse_source(&PathBuf::from("t.py"), source).unwrap();

        let lenient = analyze_file(&PathBuf::from("t.py"), &module, "t", &EngineConfig::default(), None);
        assert!(lenient.is_empty());

        let mut strict = EngineConfig::default();
        strict.strict_ingest = true;
        let strict_diags = analyze_file(&PathBuf::from("t.py"), &module, "t", &strict, None);
        assert_eq!(strict_diags.len(), 1);
        assert_eq!(strict_diags[0].code, DiagnosticCode::W002);
    }

    #[test]
    fn untracked_pivot_result_suppresses_downstream_diagnostics() {
        let source = "df = read_csv(\"u.csv\", usecols=[\"a\"])\ny = df.pivot(index=\"a\", columns=\"b\", values=\"a\")\ny[\"anything\"]\n";
        let diags = analyze(source);
        assert!(diags.is_empty());
    }

    #[test]
    fn passthrough_preserves_receiver_state() {
        let source = "df = read_csv(\"u.csv\", usecols=[\"a\"])\nfiltered = df.filter(cond)\nfiltered[\"missing\"]\n";
        let diags = analyze(source);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::E001);
    }

    #[test]
    fn disabled_engine_emits_nothing() {
        let source = "df = read_csv(\"u.csv\", usecols=[\"a\"])\ndf[\"missing\"]\n";
        let module = parse_source(&PathBuf::from("t.py"), source).unwrap();
        let mut config = EngineConfig::default();
        config.enabled = false;
        let diags = analyze_file(&PathBuf::from("t.py"), &module, "t", &config, None);
        assert!(diags.is_empty());
    }

    #[test]
    fn merge_of_two_clean_schemas_combines_into_a_single_validated_schema() {
        let source = "A = Schema(\"A\", [Column(\"x\", \"int\", False)])\n\
                       B = Schema(\"B\", [Column(\"y\", \"str\", False)])\n\
                       a: DF[A] = read_csv(\"u.csv\")\n\
                       b: DF[B] = read_csv(\"v.csv\")\n\
                       m = merge(a, b)\n\
                       m[\"x\"]\n\
                       m[\"y\"]\n";
        let diags = analyze(source);
        assert!(diags.is_empty(), "known columns from both sides of a clean merge must not flag: {diags:?}");
    }

    #[test]
    fn merge_of_conflicting_schemas_degrades_to_inferred_but_stays_validated() {
        let source = "A = Schema(\"A\", [Column(\"x\", \"int\", False)])\n\
                       B = Schema(\"B\", [Column(\"x\", \"str\", False)])\n\
                       a: DF[A] = read_csv(\"u.csv\")\n\
                       b: DF[B] = read_csv(\"v.csv\")\n\
                       m = merge(a, b)\n\
                       m[\"nope\"]\n";
        let diags = analyze(source);
        assert_eq!(diags.len(), 1, "a conflicting merge must degrade to Inferred, not escape to Untracked/Unknown: {diags:?}");
        assert_eq!(diags[0].code, DiagnosticCode::E001);
    }

    #[test]
    fn concat_of_two_clean_schemas_combines_into_a_single_validated_schema() {
        let source = "A = Schema(\"A\", [Column(\"x\", \"int\", False)])\n\
                       B = Schema(\"B\", [Column(\"y\", \"str\", False)])\n\
                       a: DF[A] = read_csv(\"u.csv\")\n\
                       b: DF[B] = read_csv(\"v.csv\")\n\
                       m = concat([a, b])\n\
                       m[\"x\"]\n\
                       m[\"y\"]\n";
        let diags = analyze(source);
        assert!(diags.is_empty(), "known columns from both sides of a clean concat must not flag: {diags:?}");
    }

    #[test]
    fn concat_of_conflicting_schemas_degrades_to_inferred_but_stays_validated() {
        let source = "A = Schema(\"A\", [Column(\"x\", \"int\", False)])\n\
                       B = Schema(\"B\", [Column(\"x\", \"str\", False)])\n\
                       a: DF[A] = read_csv(\"u.csv\")\n\
                       b: DF[B] = read_csv(\"v.csv\")\n\
                       m = concat([a, b])\n\
                       m[\"nope\"]\n";
        let diags = analyze(source);
        assert_eq!(diags.len(), 1, "a conflicting concat must degrade to Inferred, not escape to Untracked/Unknown: {diags:?}");
        assert_eq!(diags[0].code, DiagnosticCode::E001);
    }
}
