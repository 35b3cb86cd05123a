//! Arithmetic lexer for `calc(...)` bodies.
//!
//! Produces numbers, operators, parentheses, and context paths. Paths
//! keep their dots and bracket indices so that substitution can look them
//! up as a whole.

use crate::error::{ExprError, ExprResult};
use crate::token::{Token, TokenKind};

pub struct Lexer<'src> {
    source: &'src [u8],
    text: &'src str,
    pos: usize,
}

impl<'src> Lexer<'src> {
    pub fn new(text: &'src str) -> Self {
        Self {
            source: text.as_bytes(),
            text,
            pos: 0,
        }
    }

    /// Lex the whole input. The token stream always ends with
    /// [`TokenKind::Eof`].
    pub fn lex(mut self) -> ExprResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let start = self.pos;
            let Some(ch) = self.peek() else {
                tokens.push(Token::new(TokenKind::Eof, start));
                return Ok(tokens);
            };
            let kind = match ch {
                b'+' => self.single(TokenKind::Plus),
                b'-' => self.single(TokenKind::Minus),
                b'*' => self.single(TokenKind::Star),
                b'/' => self.single(TokenKind::Slash),
                b'%' => self.single(TokenKind::Percent),
                b'(' => self.single(TokenKind::LParen),
                b')' => self.single(TokenKind::RParen),
                b'0'..=b'9' | b'.' => self.scan_number()?,
                c if is_path_start(c) => self.scan_path(),
                _ => {
                    let ch = self.text[start..].chars().next().unwrap_or('?');
                    return Err(ExprError::UnexpectedChar { ch, offset: start });
                }
            };
            tokens.push(Token::new(kind, start));
        }
    }

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn scan_number(&mut self) -> ExprResult<TokenKind> {
        let start = self.pos;
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            match c {
                b'0'..=b'9' => self.pos += 1,
                b'.' if !seen_dot => {
                    seen_dot = true;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        let lexeme = &self.text[start..self.pos];
        lexeme
            .parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| ExprError::UnexpectedToken {
                found: format!("'{lexeme}'"),
                offset: start,
                expected: "number",
            })
    }

    fn scan_path(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek().is_some_and(is_path_continue) {
            self.pos += 1;
        }
        TokenKind::Path(self.text[start..self.pos].to_string())
    }
}

fn is_path_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$'
}

fn is_path_continue(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'_' | b'$' | b'.' | b'[' | b']')
}
