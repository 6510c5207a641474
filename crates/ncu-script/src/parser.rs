//! Config module parser.
//!
//! Parses the module subset into an expression tree. A module is a sequence of
//! statements of which exactly one must be an export:
//!
//! ```text
//! module.exports = { filter: name => name.startsWith('@acme/') }
//! export default { reject: ['left-pad'] }
//! ```

use std::sync::Arc;

use crate::error::ScriptError;
use crate::lexer::{Lexer, Punct, Token, TokenKind};

/// Deepest expression nesting accepted before parsing fails.
pub const MAX_NESTING: usize = 64;

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    StrictEq,
    StrictNe,
    LooseEq,
    LooseNe,
    Lt,
    Lte,
    Gt,
    Gte,
}

/// Short-circuiting operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    /// `name`
    Ident(String),
    /// `{ key, key: binding }`
    Destructure(Vec<(String, String)>),
}

/// A function literal: parameters plus the returned expression.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub params: Vec<Param>,
    pub body: Expr,
}

/// Expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Regex {
        pattern: String,
        flags: String,
    },
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
    Ident(String),
    Member {
        object: Box<Expr>,
        property: String,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
    Function(Arc<FunctionDef>),
}

/// Parse module source and return the exported expression.
pub fn parse_module(src: &str) -> Result<Expr, ScriptError> {
    let tokens = Lexer::new(src).tokenize()?;
    let mut parser = Parser::new(tokens);
    parser.parse_module()
}

/// Parse a single expression (used for inline snippets and tests).
pub fn parse_expression(src: &str) -> Result<Expr, ScriptError> {
    let tokens = Lexer::new(src).tokenize()?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expr()?;
    parser.eat_punct(Punct::Semi);
    parser.expect_eof()?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_NESTING`].
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, ScriptError>) -> Result<T, ScriptError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_here("nesting too deep"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)].kind
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        kind
    }

    fn error_here(&self, message: impl Into<String>) -> ScriptError {
        let tok = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        ScriptError::syntax(tok.line, tok.column, message)
    }

    fn is_punct(&self, punct: Punct) -> bool {
        matches!(self.peek(), TokenKind::Punct(p) if *p == punct)
    }

    fn is_ident(&self, name: &str) -> bool {
        matches!(self.peek(), TokenKind::Ident(n) if n == name)
    }

    fn eat_punct(&mut self, punct: Punct) -> bool {
        if self.is_punct(punct) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: Punct, what: &str) -> Result<(), ScriptError> {
        if self.eat_punct(punct) {
            Ok(())
        } else {
            Err(self.error_here(format!("expected {}, found {}", what, describe(self.peek()))))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, ScriptError> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(self.error_here(format!("expected {}, found {}", what, describe(&other)))),
        }
    }

    fn expect_eof(&self) -> Result<(), ScriptError> {
        match self.peek() {
            TokenKind::Eof => Ok(()),
            other => Err(self.error_here(format!("unexpected {}", describe(other)))),
        }
    }

    fn parse_module(&mut self) -> Result<Expr, ScriptError> {
        let mut export = None;

        loop {
            while self.eat_punct(Punct::Semi) {}
            if matches!(self.peek(), TokenKind::Eof) {
                break;
            }

            // Directive prologue such as 'use strict'
            if let TokenKind::Str(_) = self.peek() {
                self.advance();
                continue;
            }

            let value = if self.is_ident("module") {
                self.advance();
                self.expect_punct(Punct::Dot, "`.`")?;
                let property = self.expect_ident("`exports`")?;
                if property != "exports" {
                    return Err(self.error_here(format!(
                        "only `module.exports` may be assigned, found `module.{}`",
                        property
                    )));
                }
                self.expect_punct(Punct::Assign, "`=`")?;
                self.parse_expr()?
            } else if self.is_ident("export") {
                self.advance();
                let keyword = self.expect_ident("`default`")?;
                if keyword != "default" {
                    return Err(self.error_here("only `export default` is supported"));
                }
                self.parse_expr()?
            } else {
                return Err(self.error_here(format!(
                    "expected `module.exports =` or `export default`, found {}",
                    describe(self.peek())
                )));
            };

            // Last assignment wins, as with repeated assignments to module.exports
            export = Some(value);
        }

        export.ok_or(ScriptError::NoExport)
    }

    pub(crate) fn parse_expr(&mut self) -> Result<Expr, ScriptError> {
        self.nested(Self::parse_conditional)
    }

    fn parse_conditional(&mut self) -> Result<Expr, ScriptError> {
        let test = self.parse_or()?;
        if self.eat_punct(Punct::Question) {
            let consequent = self.parse_expr()?;
            self.expect_punct(Punct::Colon, "`:`")?;
            let alternate = self.parse_expr()?;
            return Ok(Expr::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            });
        }
        Ok(test)
    }

    fn parse_or(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.parse_and()?;
        while self.eat_punct(Punct::OrOr) {
            let right = self.parse_and()?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.parse_equality()?;
        while self.eat_punct(Punct::AndAnd) {
            let right = self.parse_equality()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek() {
                TokenKind::Punct(Punct::StrictEq) => BinaryOp::StrictEq,
                TokenKind::Punct(Punct::StrictNe) => BinaryOp::StrictNe,
                TokenKind::Punct(Punct::LooseEq) => BinaryOp::LooseEq,
                TokenKind::Punct(Punct::LooseNe) => BinaryOp::LooseNe,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_relational()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_relational(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Punct(Punct::Lt) => BinaryOp::Lt,
                TokenKind::Punct(Punct::Lte) => BinaryOp::Lte,
                TokenKind::Punct(Punct::Gt) => BinaryOp::Gt,
                TokenKind::Punct(Punct::Gte) => BinaryOp::Gte,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ScriptError> {
        if self.eat_punct(Punct::Bang) {
            let operand = self.nested(Self::parse_unary)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        if self.eat_punct(Punct::Minus) {
            let operand = self.nested(Self::parse_unary)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, ScriptError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat_punct(Punct::Dot) {
                let property = self.expect_ident("property name")?;
                expr = Expr::Member {
                    object: Box::new(expr),
                    property,
                };
            } else if self.eat_punct(Punct::LBracket) {
                let index = self.parse_expr()?;
                self.expect_punct(Punct::RBracket, "`]`")?;
                expr = Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.eat_punct(Punct::LParen) {
                let args = self.parse_list(Punct::RParen, Self::parse_expr)?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ScriptError> {
        match self.peek().clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Str(s))
            }
            TokenKind::Regex { pattern, flags } => {
                self.advance();
                Ok(Expr::Regex { pattern, flags })
            }
            TokenKind::Ident(name) => {
                if matches!(self.peek_at(1), TokenKind::Punct(Punct::FatArrow)) {
                    self.advance();
                    self.advance();
                    return self.parse_function_body(vec![Param::Ident(name)], true);
                }
                self.advance();
                match name.as_str() {
                    "true" => Ok(Expr::Bool(true)),
                    "false" => Ok(Expr::Bool(false)),
                    "null" => Ok(Expr::Null),
                    "undefined" => Ok(Expr::Undefined),
                    "function" => self.parse_function_expr(),
                    _ => Ok(Expr::Ident(name)),
                }
            }
            TokenKind::Punct(Punct::LParen) => {
                if self.arrow_follows_parens() {
                    self.advance();
                    let params = self.parse_list(Punct::RParen, Self::parse_param)?;
                    self.expect_punct(Punct::FatArrow, "`=>`")?;
                    return self.parse_function_body(params, true);
                }
                self.advance();
                let expr = self.parse_expr()?;
                self.expect_punct(Punct::RParen, "`)`")?;
                Ok(expr)
            }
            TokenKind::Punct(Punct::LBracket) => {
                self.advance();
                let items = self.parse_list(Punct::RBracket, Self::parse_expr)?;
                Ok(Expr::Array(items))
            }
            TokenKind::Punct(Punct::LBrace) => {
                self.advance();
                self.parse_object()
            }
            other => Err(self.error_here(format!("unexpected {}", describe(&other)))),
        }
    }

    /// Scan ahead from `(` to its matching `)` and report whether `=>` follows.
    fn arrow_follows_parens(&self) -> bool {
        let mut depth = 0usize;
        let mut i = self.pos;
        while i < self.tokens.len() {
            match &self.tokens[i].kind {
                TokenKind::Punct(Punct::LParen | Punct::LBrace | Punct::LBracket) => depth += 1,
                TokenKind::Punct(Punct::RParen | Punct::RBrace | Punct::RBracket) => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return matches!(
                            self.tokens.get(i + 1).map(|t| &t.kind),
                            Some(TokenKind::Punct(Punct::FatArrow))
                        );
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            i += 1;
        }
        false
    }

    fn parse_param(&mut self) -> Result<Param, ScriptError> {
        if self.eat_punct(Punct::LBrace) {
            let fields = self.parse_list(Punct::RBrace, |p| {
                let key = p.expect_ident("destructured property")?;
                let binding = if p.eat_punct(Punct::Colon) {
                    p.expect_ident("binding name")?
                } else {
                    key.clone()
                };
                Ok((key, binding))
            })?;
            return Ok(Param::Destructure(fields));
        }
        Ok(Param::Ident(self.expect_ident("parameter name")?))
    }

    fn parse_function_expr(&mut self) -> Result<Expr, ScriptError> {
        // Optional function name, ignored
        if let TokenKind::Ident(_) = self.peek() {
            self.advance();
        }
        self.expect_punct(Punct::LParen, "`(`")?;
        let params = self.parse_list(Punct::RParen, Self::parse_param)?;
        self.parse_function_body(params, false)
    }

    /// Parse either an expression body (arrows only) or `{ return expr; }`.
    fn parse_function_body(
        &mut self,
        params: Vec<Param>,
        allow_expression: bool,
    ) -> Result<Expr, ScriptError> {
        let body = if self.is_punct(Punct::LBrace) {
            self.advance();
            while self.eat_punct(Punct::Semi) {}
            let body = if self.is_ident("return") {
                self.advance();
                if self.is_punct(Punct::Semi) || self.is_punct(Punct::RBrace) {
                    Expr::Undefined
                } else {
                    self.parse_expr()?
                }
            } else if self.is_punct(Punct::RBrace) {
                Expr::Undefined
            } else {
                return Err(self.error_here("function bodies may only contain a `return` statement"));
            };
            while self.eat_punct(Punct::Semi) {}
            self.expect_punct(Punct::RBrace, "`}`")?;
            body
        } else if allow_expression {
            self.parse_expr()?
        } else {
            return Err(self.error_here("expected `{` to open function body"));
        };
        Ok(Expr::Function(Arc::new(FunctionDef { params, body })))
    }

    fn parse_object(&mut self) -> Result<Expr, ScriptError> {
        let entries = self.parse_list(Punct::RBrace, |p| {
            let key = match p.advance() {
                TokenKind::Ident(name) => name,
                TokenKind::Str(s) => s,
                TokenKind::Number(n) => format_number(n),
                other => {
                    return Err(p.error_here(format!("expected property key, found {}", describe(&other))))
                }
            };
            // Method shorthand: `filter(name) { return ... }`
            if p.eat_punct(Punct::LParen) {
                let params = p.parse_list(Punct::RParen, Self::parse_param)?;
                let function = p.parse_function_body(params, false)?;
                return Ok((key, function));
            }
            p.expect_punct(Punct::Colon, "`:`")?;
            let value = p.parse_expr()?;
            Ok((key, value))
        })?;
        Ok(Expr::Object(entries))
    }

    /// Parse a comma-separated list up to `close`, allowing a trailing comma.
    /// The opening delimiter must already be consumed.
    fn parse_list<T>(
        &mut self,
        close: Punct,
        mut item: impl FnMut(&mut Self) -> Result<T, ScriptError>,
    ) -> Result<Vec<T>, ScriptError> {
        let mut items = Vec::new();
        loop {
            if self.eat_punct(close) {
                return Ok(items);
            }
            items.push(item(self)?);
            if !self.eat_punct(Punct::Comma) {
                self.expect_punct(close, "`,` or closing delimiter")?;
                return Ok(items);
            }
        }
    }
}

/// Render a number the way it would appear as an object key.
pub(crate) fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Ident(name) => format!("`{}`", name),
        TokenKind::Number(n) => format!("number {}", format_number(*n)),
        TokenKind::Str(s) => format!("string {:?}", s),
        TokenKind::Regex { pattern, flags } => format!("regex /{}/{}", pattern, flags),
        TokenKind::Punct(p) => format!("{:?}", p),
        TokenKind::Eof => "end of input".to_string(),
    }
}
