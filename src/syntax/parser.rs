//! Recursive-descent parser turning a token stream into the [`Module`] AST.
//!
//! The grammar is intentionally narrow: it models exactly the shapes the
//! inference engine needs (assignments, calls, subscripts, function defs,
//! `if`/`for`/`while` for scope-join purposes) and treats everything else —
//! binary expressions, comprehensions, `with`/`try`/`lambda` — as opaque.
//! A statement or expression that doesn't parse as a recognized shape
//! degrades to `Stmt::Other` / `Expr::Opaque` rather than failing the file;
//! only a lexer failure or a genuinely unbalanced block structure is a
//! hard parse error.

use crate::syntax::ast::{Expr, FunctionDef, Import, Module, Param, Stmt};
use crate::syntax::lexer::{SpannedToken, Token};
use crate::syntax::span::{Located, SourceSpan};

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

const BINARY_OPS: &[&str] = &[
    "+", "-", "*", "/", "%", "**", "//", "<", ">", "<=", ">=", "==", "!=", "|", "&", ":=",
];
const BINARY_KEYWORDS: &[&str] = &["and", "or", "in", "is", "not", "if", "else", "lambda"];

pub fn parse(tokens: Vec<SpannedToken>) -> Result<Module, ParseError> {
    Parser::new(tokens).parse_module()
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<SpannedToken>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].token
    }

    fn peek_span(&self) -> SourceSpan {
        self.tokens[self.pos.min(self.tokens.len() - 1)].span
    }

    fn advance(&mut self) -> SpannedToken {
        let t = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    fn at_op(&self, s: &str) -> bool {
        matches!(self.peek(), Token::Op(o) if o == s)
    }

    fn at_name(&self, s: &str) -> bool {
        matches!(self.peek(), Token::Name(n) if n == s)
    }

    fn eat_op(&mut self, s: &str) -> bool {
        if self.at_op(s) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_name(&mut self, s: &str) -> bool {
        if self.at_name(s) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn err(&self, message: impl Into<String>) -> ParseError {
        let span = self.peek_span();
        ParseError {
            message: message.into(),
            line: span.start_line,
            col: span.start_col,
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Token::Newline) {
            self.advance();
        }
    }

    // ---- module / block structure ----

    fn parse_module(&mut self) -> Result<Module, ParseError> {
        let mut imports = Vec::new();
        let mut body = Vec::new();
        self.skip_newlines();
        while !self.at_eof() {
            if self.at_name("import") || self.at_name("from") {
                imports.push(self.parse_import()?);
            } else {
                body.push(self.parse_stmt()?);
            }
            self.skip_newlines();
        }
        Ok(Module { imports, body })
    }

    fn parse_import(&mut self) -> Result<Located<Import>, ParseError> {
        let start = self.peek_span();
        if self.eat_name("import") {
            let path = self.parse_dotted_name()?;
            let alias = if self.eat_name("as") {
                Some(self.expect_name()?)
            } else {
                None
            };
            self.finish_line();
            Ok(Located::new(Import::Module { path, alias }, start))
        } else {
            self.eat_name("from");
            let module = self.parse_dotted_name()?;
            self.eat_name("import");
            let name = self.expect_name()?;
            let alias = if self.eat_name("as") {
                Some(self.expect_name()?)
            } else {
                None
            };
            self.finish_line();
            Ok(Located::new(
                Import::From {
                    module,
                    name,
                    alias,
                },
                start,
            ))
        }
    }

    fn parse_dotted_name(&mut self) -> Result<Vec<String>, ParseError> {
        let mut parts = vec![self.expect_name()?];
        while self.eat_op(".") {
            parts.push(self.expect_name()?);
        }
        Ok(parts)
    }

    fn expect_name(&mut self) -> Result<String, ParseError> {
        match self.peek().clone() {
            Token::Name(n) => {
                self.advance();
                Ok(n)
            }
            _ => Err(self.err("expected identifier")),
        }
    }

    /// Consumes tokens through the end of the current logical line
    /// (the Newline token), tolerating a missing one at EOF.
    fn finish_line(&mut self) {
        while !matches!(self.peek(), Token::Newline | Token::Eof) {
            self.advance();
        }
        if matches!(self.peek(), Token::Newline) {
            self.advance();
        }
    }

    fn parse_block(&mut self) -> Result<Vec<Located<Stmt>>, ParseError> {
        self.skip_newlines();
        if !matches!(self.peek(), Token::Indent) {
            return Ok(Vec::new());
        }
        self.advance();
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !matches!(self.peek(), Token::Dedent | Token::Eof) {
            stmts.push(self.parse_stmt()?);
            self.skip_newlines();
        }
        if matches!(self.peek(), Token::Dedent) {
            self.advance();
        }
        Ok(stmts)
    }

    /// Skips a header clause (the condition of `if`/`for`/`while`) through
    /// the terminating top-level `:`, tracking bracket depth so a `:` used
    /// for slicing inside `[...]` doesn't end the header early.
    fn skip_header_to_colon(&mut self) {
        let mut depth = 0i32;
        loop {
            match self.peek().clone() {
                Token::Op(o) if o == "(" || o == "[" || o == "{" => {
                    depth += 1;
                    self.advance();
                }
                Token::Op(o) if o == ")" || o == "]" || o == "}" => {
                    depth -= 1;
                    self.advance();
                }
                Token::Op(o) if o == ":" && depth == 0 => {
                    self.advance();
                    break;
                }
                Token::Newline | Token::Eof => break,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ---- statements ----

    fn parse_stmt(&mut self) -> Result<Located<Stmt>, ParseError> {
        let start = self.peek_span();

        if self.at_name("def") {
            return self.parse_function_def(start);
        }
        if self.at_name("if") {
            return self.parse_if(start);
        }
        if self.at_name("for") || self.at_name("while") {
            self.advance();
            self.skip_header_to_colon();
            let body = self.parse_block()?;
            return Ok(Located::new(Stmt::Loop { body }, start));
        }
        if self.at_name("return") {
            self.advance();
            if matches!(self.peek(), Token::Newline | Token::Eof) {
                self.finish_line();
                return Ok(Located::new(Stmt::Return(None), start));
            }
            let value = self.parse_expr();
            self.finish_line();
            return Ok(Located::new(Stmt::Return(Some(value)), start));
        }
        if self.at_name("del") {
            self.advance();
            let target = self.parse_primary_with_trailers();
            self.finish_line();
            if let Expr::Subscript { base, index } = target {
                return Ok(Located::new(
                    Stmt::DelSubscript {
                        base: *base,
                        index: *index,
                    },
                    start,
                ));
            }
            return Ok(Located::new(Stmt::Other, start));
        }
        if matches!(
            self.peek(),
            Token::Name(n) if ["class", "with", "try", "except", "finally", "raise", "assert",
                "pass", "break", "continue", "global", "nonlocal", "import", "from"].contains(&n.as_str())
        ) {
            // Block-shaped or single-line statements outside the engine's
            // scope. `class`/`with`/`try` still own a nested block that
            // must be consumed so indentation stays in sync.
            let is_block = matches!(self.peek(), Token::Name(n) if ["class", "with", "try"].contains(&n.as_str()));
            self.advance();
            if is_block {
                self.skip_header_to_colon();
                let _ = self.parse_block()?;
            } else {
                self.finish_line();
            }
            return Ok(Located::new(Stmt::Other, start));
        }

        self.parse_assignment_or_expr_stmt(start)
    }

    fn parse_if(&mut self, start: SourceSpan) -> Result<Located<Stmt>, ParseError> {
        self.advance(); // 'if'
        self.skip_header_to_colon();
        let then_body = self.parse_block()?;
        self.skip_newlines();
        let else_body = if self.at_name("elif") {
            // Treat elif as a nested if inside the else branch so the
            // conservative meet still joins every arm.
            vec![self.parse_if(self.peek_span())?]
        } else if self.eat_name("else") {
            self.eat_op(":");
            self.parse_block()?
        } else {
            Vec::new()
        };
        Ok(Located::new(
            Stmt::If {
                then_body,
                else_body,
            },
            start,
        ))
    }

    fn parse_function_def(&mut self, start: SourceSpan) -> Result<Located<Stmt>, ParseError> {
        self.advance(); // 'def'
        let name = self.expect_name()?;
        if !self.eat_op("(") {
            return Err(self.err("expected '(' in function definition"));
        }
        let mut params = Vec::new();
        while !self.at_op(")") && !self.at_eof() {
            if self.eat_op("*") || self.eat_op("**") {
                // *args / **kwargs: consume the name but no annotation tracking.
                let _ = self.expect_name();
            } else {
                let pname = self.expect_name()?;
                let annotation = if self.eat_op(":") {
                    Some(self.parse_expr())
                } else {
                    None
                };
                if self.eat_op("=") {
                    let _ = self.parse_expr();
                }
                params.push(Param {
                    name: pname,
                    annotation,
                });
            }
            if !self.eat_op(",") {
                break;
            }
        }
        self.eat_op(")");
        let return_annotation = if self.eat_op("->") {
            Some(self.parse_expr())
        } else {
            None
        };
        self.eat_op(":");
        let body = self.parse_block()?;
        Ok(Located::new(
            Stmt::FunctionDef(FunctionDef {
                name,
                params,
                return_annotation,
                body,
            }),
            start,
        ))
    }

    fn parse_assignment_or_expr_stmt(
        &mut self,
        start: SourceSpan,
    ) -> Result<Located<Stmt>, ParseError> {
        // Typed assignment to a bare name: `x: Ann = expr`.
        if let Token::Name(name) = self.peek().clone() {
            if matches!(self.tokens.get(self.pos + 1).map(|t| &t.token), Some(Token::Op(o)) if o == ":")
            {
                self.advance(); // name
                self.advance(); // ':'
                let annotation = self.parse_expr();
                if self.eat_op("=") {
                    let value = self.parse_expr();
                    self.finish_line();
                    return Ok(Located::new(
                        Stmt::Assign {
                            target: name,
                            annotation: Some(annotation),
                            value,
                        },
                        start,
                    ));
                }
                // Bare annotation with no value: `x: Ann` — rare, treat as opaque.
                self.finish_line();
                return Ok(Located::new(Stmt::Other, start));
            }
        }

        let target = self.parse_primary_with_trailers();

        if self.eat_op("=") {
            let value = self.parse_expr();
            self.finish_line();
            return Ok(Located::new(assign_stmt(target, value), start));
        }

        // Augmented assignment (`+=`, `-=`, ...): validated columns are
        // never on the LHS of these in the catalogue, so the binding is
        // left untouched (Stmt::Other is enough — no state mutation).
        if let Token::Op(o) = self.peek().clone() {
            if o.ends_with('=') && o != "==" && o != "!=" && o != "<=" && o != ">=" {
                self.advance();
                let _ = self.parse_expr();
                self.finish_line();
                return Ok(Located::new(Stmt::Other, start));
            }
        }

        self.finish_line();
        Ok(Located::new(Stmt::Expr(target), start))
    }

    // ---- expressions ----

    fn parse_expr(&mut self) -> Expr {
        let primary = self.parse_primary_with_trailers();
        if self.peek_is_binary() {
            self.skip_opaque_tail();
            return Expr::Opaque;
        }
        primary
    }

    fn peek_is_binary(&self) -> bool {
        match self.peek() {
            Token::Op(o) => BINARY_OPS.contains(&o.as_str()),
            Token::Name(n) => BINARY_KEYWORDS.contains(&n.as_str()),
            _ => false,
        }
    }

    /// Consumes the remainder of the current expression context (balanced
    /// on brackets) once we've determined it's an opaque expression we
    /// don't model further.
    fn skip_opaque_tail(&mut self) {
        let mut depth = 0i32;
        loop {
            match self.peek().clone() {
                Token::Op(o) if o == "(" || o == "[" || o == "{" => {
                    depth += 1;
                    self.advance();
                }
                Token::Op(o) if o == ")" || o == "]" || o == "}" => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    self.advance();
                }
                Token::Op(o) if o == "," && depth == 0 => break,
                Token::Op(o) if o == ":" && depth == 0 => break,
                Token::Newline | Token::Eof => break,
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn parse_primary_with_trailers(&mut self) -> Expr {
        let mut expr = self.parse_atom();
        loop {
            if self.eat_op(".") {
                let attr = self.expect_name().unwrap_or_default();
                expr = Expr::Attribute {
                    base: Box::new(expr),
                    attr,
                };
            } else if self.at_op("(") {
                let (args, keywords) = self.parse_call_args();
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                    keywords,
                };
            } else if self.at_op("[") {
                self.advance();
                let index = self.parse_expr();
                self.eat_op("]");
                expr = Expr::Subscript {
                    base: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                break;
            }
        }
        expr
    }

    fn parse_call_args(&mut self) -> (Vec<Expr>, Vec<(String, Expr)>) {
        self.advance(); // '('
        let mut args = Vec::new();
        let mut keywords = Vec::new();
        while !self.at_op(")") && !self.at_eof() {
            if self.eat_op("*") || self.eat_op("**") {
                let _ = self.parse_expr();
            } else if let Token::Name(name) = self.peek().clone() {
                if matches!(self.tokens.get(self.pos + 1).map(|t| &t.token), Some(Token::Op(o)) if o == "=")
                {
                    self.advance();
                    self.advance();
                    let value = self.parse_expr();
                    keywords.push((name, value));
                } else {
                    args.push(self.parse_expr());
                }
            } else {
                args.push(self.parse_expr());
            }
            if !self.eat_op(",") {
                break;
            }
        }
        self.eat_op(")");
        (args, keywords)
    }

    fn parse_atom(&mut self) -> Expr {
        match self.peek().clone() {
            Token::Str(s) => {
                self.advance();
                Expr::Str(s)
            }
            Token::Num(n) => {
                self.advance();
                Expr::Num(n)
            }
            Token::Name(n) if n == "True" => {
                self.advance();
                Expr::Bool(true)
            }
            Token::Name(n) if n == "False" => {
                self.advance();
                Expr::Bool(false)
            }
            Token::Name(n) if n == "None" => {
                self.advance();
                Expr::NoneLit
            }
            Token::Name(n) => {
                self.advance();
                Expr::Name(n)
            }
            Token::Op(o) if o == "(" => {
                self.advance();
                let inner = self.parse_expr();
                self.eat_op(")");
                inner
            }
            Token::Op(o) if o == "[" => {
                self.advance();
                let mut items = Vec::new();
                while !self.at_op("]") && !self.at_eof() {
                    items.push(self.parse_expr());
                    if !self.eat_op(",") {
                        break;
                    }
                }
                self.eat_op("]");
                Expr::List(items)
            }
            Token::Op(o) if o == "{" => {
                self.advance();
                let mut pairs = Vec::new();
                while !self.at_op("}") && !self.at_eof() {
                    let key = self.parse_expr();
                    self.eat_op(":");
                    let value = self.parse_expr();
                    pairs.push((key, value));
                    if !self.eat_op(",") {
                        break;
                    }
                }
                self.eat_op("}");
                Expr::Dict(pairs)
            }
            _ => {
                self.skip_opaque_tail();
                Expr::Opaque
            }
        }
    }
}

fn assign_stmt(target: Expr, value: Expr) -> Stmt {
    match target {
        Expr::Name(name) => Stmt::Assign {
            target: name,
            annotation: None,
            value,
        },
        Expr::Subscript { base, index } => Stmt::SubscriptAssign {
            base: *base,
            index: *index,
            value,
        },
        Expr::Attribute { base, attr } => Stmt::AttributeAssign {
            base: *base,
            attr,
            value,
        },
        _ => Stmt::Other,
    }
}
