//! `calc(...)` arithmetic.
//!
//! Precedence (lowest → highest):
//! 3. `+`, `-`
//! 2. `*`, `/`, `%`
//! 1. unary `-`, `+`
//!
//! Paths inside the body are substituted from the context before any
//! arithmetic happens. Numbers are used as is, numeric strings are parsed,
//! booleans count as `1`/`0`. Anything else stays as its literal text,
//! which is not a number and fails the evaluation.

use crate::error::{ExprError, ExprResult};
use crate::lexer::Lexer;
use crate::path;
use crate::token::{Token, TokenKind};
use crumbview_types::{Context, Value};

/// Maximum parenthesis nesting inside one `calc(...)` body.
pub const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Parsed arithmetic expression.
#[derive(Debug, Clone, PartialEq)]
pub enum MathExpr {
    Number(f64),
    /// An unsubstituted context path.
    Path(String),
    Neg(Box<MathExpr>),
    Binary {
        left: Box<MathExpr>,
        op: BinOp,
        right: Box<MathExpr>,
    },
}

/// Evaluate a `calc` body. Failures are logged and yield `0`.
pub fn calc(body: &str, ctx: &Context) -> Value {
    match try_calc(body, ctx) {
        Ok(n) => Value::Number(n),
        Err(err) => {
            tracing::warn!(expression = body, error = %err, "calc() failed, using 0");
            Value::Number(0.0)
        }
    }
}

/// Evaluate a `calc` body, reporting why it failed.
pub fn try_calc(body: &str, ctx: &Context) -> ExprResult<f64> {
    let expr = parse(body)?;
    eval(&expr, ctx)
}

/// Parse a `calc` body into a [`MathExpr`].
pub fn parse(body: &str) -> ExprResult<MathExpr> {
    let tokens = Lexer::new(body).lex()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_additive()?;
    match parser.peek() {
        TokenKind::Eof => Ok(expr),
        _ => Err(parser.unexpected("operator or end of input")),
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Parser
// ══════════════════════════════════════════════════════════════════════════

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        kind
    }

    fn unexpected(&self, expected: &'static str) -> ExprError {
        match self.tokens.get(self.pos) {
            Some(t) if t.kind != TokenKind::Eof => ExprError::UnexpectedToken {
                found: t.kind.to_string(),
                offset: t.offset,
                expected,
            },
            _ => ExprError::UnexpectedEnd,
        }
    }

    /// `Additive = Multiplicative { ("+" | "-") Multiplicative }`
    fn parse_additive(&mut self) -> ExprResult<MathExpr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = MathExpr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
    }

    /// `Multiplicative = Unary { ("*" | "/" | "%") Unary }`
    fn parse_multiplicative(&mut self) -> ExprResult<MathExpr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = MathExpr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
    }

    /// `Unary = ("-" | "+") Unary | Primary`
    fn parse_unary(&mut self) -> ExprResult<MathExpr> {
        match self.peek() {
            TokenKind::Minus => {
                self.advance();
                let operand = self.nested(Self::parse_unary)?;
                Ok(MathExpr::Neg(Box::new(operand)))
            }
            TokenKind::Plus => {
                self.advance();
                self.nested(Self::parse_unary)
            }
            _ => self.parse_primary(),
        }
    }

    /// `Primary = number | path | "(" Additive ")"`
    fn parse_primary(&mut self) -> ExprResult<MathExpr> {
        match self.peek().clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(MathExpr::Number(n))
            }
            TokenKind::Path(p) => {
                self.advance();
                Ok(MathExpr::Path(p))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.nested(Self::parse_additive)?;
                match self.advance() {
                    TokenKind::RParen => Ok(inner),
                    TokenKind::Eof => Err(ExprError::UnexpectedEnd),
                    _ => {
                        self.pos -= 1;
                        Err(self.unexpected("')'"))
                    }
                }
            }
            _ => Err(self.unexpected("number, identifier or '('")),
        }
    }

    fn nested(
        &mut self,
        f: fn(&mut Self) -> ExprResult<MathExpr>,
    ) -> ExprResult<MathExpr> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::TooDeep(MAX_DEPTH));
        }
        let result = f(self);
        self.depth -= 1;
        result
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Evaluation
// ══════════════════════════════════════════════════════════════════════════

fn eval(expr: &MathExpr, ctx: &Context) -> ExprResult<f64> {
    match expr {
        MathExpr::Number(n) => Ok(*n),
        MathExpr::Path(p) => substitute(p, ctx),
        MathExpr::Neg(inner) => Ok(-eval(inner, ctx)?),
        MathExpr::Binary { left, op, right } => {
            let a = eval(left, ctx)?;
            let b = eval(right, ctx)?;
            apply(*op, a, b)
        }
    }
}

fn substitute(path_text: &str, ctx: &Context) -> ExprResult<f64> {
    match path::lookup(ctx, path_text) {
        Value::Number(n) => Ok(n),
        Value::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ExprError::NonNumeric(s.clone())),
        _ => Err(ExprError::NonNumeric(path_text.to_string())),
    }
}

fn apply(op: BinOp, a: f64, b: f64) -> ExprResult<f64> {
    let result = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => {
            if b == 0.0 {
                return Err(ExprError::ArithmeticTrap("division by zero".into()));
            }
            a / b
        }
        BinOp::Mod => {
            if b == 0.0 {
                return Err(ExprError::ArithmeticTrap("modulo by zero".into()));
            }
            a % b
        }
    };
    if result.is_finite() {
        Ok(result)
    } else {
        Err(ExprError::ArithmeticTrap(format!(
            "{op:?} produced NaN/Infinity"
        )))
    }
}
