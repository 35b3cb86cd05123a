//! Expression error types.
//!
//! These never escape [`crate::evaluate`]; they describe why a `calc(...)`
//! body fell back to `0`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    /// A character the arithmetic lexer does not accept.
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    /// A token in the wrong place.
    #[error("unexpected {found} at offset {offset}, expected {expected}")]
    UnexpectedToken {
        found: String,
        offset: usize,
        expected: &'static str,
    },
    /// Input ended mid-expression.
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    /// An identifier that did not resolve to a number.
    #[error("non-numeric operand '{0}'")]
    NonNumeric(String),
    /// Division by zero, NaN or Infinity.
    #[error("arithmetic trap: {0}")]
    ArithmeticTrap(String),
    /// Parenthesis nesting beyond the parser limit.
    #[error("maximum expression nesting depth is {0}")]
    TooDeep(usize),
}

/// Result alias for expression operations.
pub type ExprResult<T> = Result<T, ExprError>;
