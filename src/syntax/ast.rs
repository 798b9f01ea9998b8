//! Abstract syntax tree for the subset of the dynamically-typed host
//! language the engine needs: assignments, attribute/call/subscript
//! chains, function definitions with annotations, and the handful of
//! control-flow shapes the inference engine joins over.
//!
//! This is deliberately not a full grammar. Constructs the parser does
//! not recognize fall back to `Stmt::Other` / `Expr::Opaque` rather than
//! failing the whole file — only a genuine tokenizer/structural failure
//! is a parse error (see `syntax::IngestError`).

use crate::syntax::span::{Located, SourceSpan};

#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub imports: Vec<Located<Import>>,
    pub body: Vec<Located<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Import {
    /// `import pandas as pd` / `import pandas`
    Module {
        path: Vec<String>,
        alias: Option<String>,
    },
    /// `from pkg.schemas import Orders` / `from pkg.schemas import Orders as O`
    From {
        module: Vec<String>,
        name: String,
        alias: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `x = expr` or `x: Ann = expr` (annotation is `None` for the plain form).
    Assign {
        target: String,
        annotation: Option<Expr>,
        value: Expr,
    },
    /// `df["c"] = expr`
    SubscriptAssign { base: Expr, index: Expr, value: Expr },
    /// `df.c = expr` — attribute assignment, rare but some host dialects allow it.
    AttributeAssign { base: Expr, attr: String, value: Expr },
    /// `del df["c"]`
    DelSubscript { base: Expr, index: Expr },
    /// A bare expression statement, e.g. `df["age"]` used only for its
    /// validation side effect, or `df.drop(columns=["x"])` with the
    /// result discarded.
    Expr(Expr),
    FunctionDef(FunctionDef),
    If {
        then_body: Vec<Located<Stmt>>,
        else_body: Vec<Located<Stmt>>,
    },
    Loop {
        body: Vec<Located<Stmt>>,
    },
    Return(Option<Expr>),
    /// Anything the parser recognizes as a statement shape it does not
    /// model further (e.g. `raise`, `with`, `assert`). Preserved so the
    /// engine can skip it without losing statement count/ordering.
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub annotation: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub return_annotation: Option<Expr>,
    pub body: Vec<Located<Stmt>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Name(String),
    Attribute {
        base: Box<Expr>,
        attr: String,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<(String, Expr)>,
    },
    Subscript {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Str(String),
    Num(f64),
    Bool(bool),
    NoneLit,
    List(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    /// Anything the parser didn't need to model further (binary ops,
    /// comprehensions, f-strings, ...). Opaque to validation.
    Opaque,
}

impl Expr {
    /// The last dotted segment of an attribute chain / bare name, used to
    /// structurally match type names.
    pub fn last_segment(&self) -> Option<&str> {
        match self {
            Expr::Name(n) => Some(n.as_str()),
            Expr::Attribute { attr, .. } => Some(attr.as_str()),
            _ => None,
        }
    }

    /// Flattens an attribute/name chain into its dotted segments, e.g.
    /// `pd.DataFrame` -> `["pd", "DataFrame"]`. Returns `None` if the
    /// expression isn't a pure name/attribute chain.
    pub fn dotted_path(&self) -> Option<Vec<String>> {
        match self {
            Expr::Name(n) => Some(vec![n.clone()]),
            Expr::Attribute { base, attr } => {
                let mut path = base.dotted_path()?;
                path.push(attr.clone());
                Some(path)
            }
            _ => None,
        }
    }

    pub fn as_str_literal(&self) -> Option<&str> {
        match self {
            Expr::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// A literal list of string literals, e.g. `["a", "b"]`. Returns
    /// `None` if any element is not a string literal.
    pub fn as_str_list(&self) -> Option<Vec<String>> {
        match self {
            Expr::List(items) => items.iter().map(|e| e.as_str_literal().map(String::from)).collect(),
            _ => None,
        }
    }

    /// A literal mapping of string-literal keys, e.g. `{"a": int, "b": str}`.
    pub fn as_str_keyed_dict(&self) -> Option<Vec<String>> {
        match self {
            Expr::Dict(pairs) => pairs
                .iter()
                .map(|(k, _)| k.as_str_literal().map(String::from))
                .collect(),
            _ => None,
        }
    }
}

/// A function call shape with a single receiver ("method call"), the form
/// the method-effect catalogue dispatches on: `receiver.method(args, kwargs)`.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodCall<'a> {
    pub receiver: &'a Expr,
    pub method: &'a str,
    pub args: &'a [Expr],
    pub keywords: &'a [(String, Expr)],
}

impl Expr {
    /// Decompose `self` as a method call, if it has that shape.
    pub fn as_method_call(&self) -> Option<MethodCall<'_>> {
        match self {
            Expr::Call {
                callee,
                args,
                keywords,
            } => match callee.as_ref() {
                Expr::Attribute { base, attr } => Some(MethodCall {
                    receiver: base.as_ref(),
                    method: attr.as_str(),
                    args,
                    keywords,
                }),
                _ => None,
            },
            _ => None,
        }
    }
}

pub type LocSpan = SourceSpan;
