//! crumbview expression language.
//!
//! Strings in a node definition may embed `{{expr}}` templates. This crate
//! evaluates a single expression against a [`Context`] ([`evaluate`]) and
//! resolves every template inside an arbitrary value ([`resolve`]).
//!
//! The language is deliberately small:
//!
//! ```text
//! expr     = calc | equality | literal | path
//! calc     = "calc(" math ")"          arithmetic only: + - * / % ( )
//! equality = expr ("===" | "!==") expr
//! literal  = true | false | null | undefined | number | 'str' | "str"
//! path     = ident { "." ident | "[" digits "]" }
//! ```
//!
//! Evaluation is total: malformed arithmetic yields `0` and unresolved
//! paths yield `undefined`. Nothing in this crate returns an error to the
//! renderer.
//!
//! [`Context`]: crumbview_types::Context

pub mod calc;
mod error;
pub mod evaluator;
pub mod lexer;
pub mod path;
pub mod template;
pub mod token;

pub use calc::{calc, try_calc};
pub use error::{ExprError, ExprResult};
pub use evaluator::evaluate;
pub use path::{lookup, parse_path, Segment};
pub use template::{has_template, parse_template, resolve, resolve_map, resolve_str, Part};
