//! Indentation-sensitive tokenizer for the host-language subset.
//!
//! Mirrors (at a much smaller scale) how Python's own tokenizer turns
//! leading whitespace into `INDENT`/`DEDENT` tokens and treats unmatched
//! bracket depth as implicit line continuation. This crate never imports
//! a Python parser — there isn't one in the project's dependency lineage
//! — so the ingester owns this layer end to end.

use crate::syntax::span::SourceSpan;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Indent,
    Dedent,
    Newline,
    Name(String),
    Str(String),
    Num(f64),
    /// Punctuation / operators, kept as their literal spelling rather than
    /// one variant per symbol — the parser only ever compares by value.
    Op(String),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

const MULTI_CHAR_OPS: &[&str] = &["->", "==", "!=", "<=", ">=", "**", "//", ":="];

pub fn lex(source: &str) -> Result<Vec<SpannedToken>, LexError> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    chars: Vec<char>,
    src: &'a str,
    pos: usize,
    line: usize,
    col: usize,
    bracket_depth: i32,
    indent_stack: Vec<usize>,
    at_line_start: bool,
    tokens: Vec<SpannedToken>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().collect(),
            src: source,
            pos: 0,
            line: 1,
            col: 1,
            bracket_depth: 0,
            indent_stack: vec![0],
            at_line_start: true,
            tokens: Vec::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn err(&self, message: impl Into<String>) -> LexError {
        LexError {
            message: message.into(),
            line: self.line,
            col: self.col,
        }
    }

    fn run(mut self) -> Result<Vec<SpannedToken>, LexError> {
        loop {
            if self.at_line_start && self.bracket_depth == 0 {
                self.handle_indentation()?;
                if self.peek().is_none() {
                    break;
                }
            }
            self.at_line_start = false;

            match self.peek() {
                None => break,
                Some(c) if c == '\n' => {
                    self.advance();
                    if self.bracket_depth == 0 {
                        self.push(Token::Newline, self.point_span());
                        self.at_line_start = true;
                    }
                }
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('#') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some(c) if c.is_ascii_digit() => self.lex_number()?,
                Some(c) if is_ident_start(c) => self.lex_name_or_string_prefix()?,
                Some(c) if c == '\'' || c == '"' => self.lex_string(c)?,
                Some(c) if "()[]{}".contains(c) => self.lex_bracket(c)?,
                Some(_) => self.lex_operator()?,
            }
        }

        // Final dedents.
        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.push(Token::Dedent, self.point_span());
        }
        self.push(Token::Eof, self.point_span());
        Ok(self.tokens)
    }

    fn point_span(&self) -> SourceSpan {
        SourceSpan::point(self.line, self.col)
    }

    fn push(&mut self, token: Token, span: SourceSpan) {
        self.tokens.push(SpannedToken { token, span });
    }

    /// Measure leading whitespace of the current logical line and emit
    /// Indent/Dedent tokens. Blank and comment-only lines are skipped
    /// without affecting the indent stack, exactly like Python.
    fn handle_indentation(&mut self) -> Result<(), LexError> {
        loop {
            let start = self.pos;
            let mut width = 0usize;
            while let Some(c) = self.peek() {
                if c == ' ' {
                    width += 1;
                    self.advance();
                } else if c == '\t' {
                    width += 8 - (width % 8);
                    self.advance();
                } else {
                    break;
                }
            }
            match self.peek() {
                None => return Ok(()),
                Some('\n') => {
                    self.advance();
                    continue;
                }
                Some('#') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                    continue;
                }
                _ => {
                    let _ = start;
                    let current = *self.indent_stack.last().unwrap();
                    if width > current {
                        self.indent_stack.push(width);
                        self.push(Token::Indent, self.point_span());
                    } else {
                        while width < *self.indent_stack.last().unwrap() {
                            self.indent_stack.pop();
                            self.push(Token::Dedent, self.point_span());
                        }
                    }
                    return Ok(());
                }
            }
        }
    }

    fn lex_number(&mut self) -> Result<(), LexError> {
        let start_line = self.line;
        let start_col = self.col;
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        if self.peek() == Some('.') && self.peek_at(1).map(|c| c.is_ascii_digit()).unwrap_or(false) {
            s.push('.');
            self.advance();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    s.push(c);
                    self.advance();
                } else {
                    break;
                }
            }
        }
        let n: f64 = s.parse().map_err(|_| self.err("malformed number literal"))?;
        let end_span = SourceSpan::new(start_line, start_col, self.line, self.col);
        self.push(Token::Num(n), end_span);
        Ok(())
    }

    fn lex_name_or_string_prefix(&mut self) -> Result<(), LexError> {
        let start_line = self.line;
        let start_col = self.col;
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if is_ident_continue(c) {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        // String prefixes: r"...", f"...", b"...", rb"...", etc.
        if s.len() <= 2
            && s.chars().all(|c| "rRfFbBuU".contains(c))
            && matches!(self.peek(), Some('\'') | Some('"'))
        {
            let quote = self.peek().unwrap();
            return self.lex_string(quote);
        }
        let end_span = SourceSpan::new(start_line, start_col, self.line, self.col);
        self.push(Token::Name(s), end_span);
        Ok(())
    }

    fn lex_string(&mut self, quote: char) -> Result<(), LexError> {
        let start_line = self.line;
        let start_col = self.col;
        // Triple-quoted strings.
        let triple = self.peek() == Some(quote)
            && self.peek_at(1) == Some(quote)
            && self.peek_at(2) == Some(quote);
        if triple {
            self.advance();
            self.advance();
            self.advance();
        } else {
            self.advance();
        }
        let mut s = String::new();
        loop {
            match self.peek() {
                None => return Err(self.err("unterminated string literal")),
                Some('\\') => {
                    self.advance();
                    if let Some(escaped) = self.advance() {
                        s.push(escaped);
                    }
                }
                Some(c) if c == quote => {
                    if triple {
                        if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                            self.advance();
                            self.advance();
                            self.advance();
                            break;
                        }
                        s.push(c);
                        self.advance();
                    } else {
                        self.advance();
                        break;
                    }
                }
                Some(c) => {
                    s.push(c);
                    self.advance();
                }
            }
        }
        let end_span = SourceSpan::new(start_line, start_col, self.line, self.col);
        self.push(Token::Str(s), end_span);
        Ok(())
    }

    fn lex_bracket(&mut self, c: char) -> Result<(), LexError> {
        let span = self.point_span();
        match c {
            '(' | '[' | '{' => self.bracket_depth += 1,
            ')' | ']' | '}' => self.bracket_depth = (self.bracket_depth - 1).max(0),
            _ => {}
        }
        self.advance();
        self.push(Token::Op(c.to_string()), span);
        Ok(())
    }

    fn lex_operator(&mut self) -> Result<(), LexError> {
        let span = self.point_span();
        for op in MULTI_CHAR_OPS {
            if self.src[self.byte_pos()..].starts_with(op) {
                for _ in 0..op.chars().count() {
                    self.advance();
                }
                self.push(Token::Op(op.to_string()), span);
                return Ok(());
            }
        }
        let c = self.advance().ok_or_else(|| self.err("unexpected end of input"))?;
        self.push(Token::Op(c.to_string()), span);
        Ok(())
    }

    /// Byte offset into `self.src` corresponding to the current char index.
    /// Only used for the multi-char operator lookahead.
    fn byte_pos(&self) -> usize {
        self.chars[..self.pos].iter().collect::<String>().len()
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
