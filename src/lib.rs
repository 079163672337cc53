//! l4xp - An interpreter for the L4 Scheme-like language
//!
//! This crate provides a small tree-walking interpreter: an S-expression
//! front-end that builds a typed abstract syntax tree, a layered mutable
//! environment model, and an applicative-order evaluator with first-class
//! closures and a closed set of primitive operations.
//!
//! ```scheme
//! (L4
//!   (define fact (lambda (n) (if (= n 0) 1 (* n (fact (- n 1))))))
//!   (fact 5))                          ; => 120
//!
//! (let ((x 1) (y 2)) (+ x y))          ; => 3
//! (letrec ((even? (lambda (n) (if (= n 0) #t (odd? (- n 1)))))
//!          (odd?  (lambda (n) (if (= n 0) #f (even? (- n 1))))))
//!   (even? 10))                        ; => #t
//! ```
//!
//! ## Mutation semantics
//!
//! Environments are graphs of frames whose bindings are individually
//! mutable cells. Closures alias their defining frame rather than copying
//! it, so a `set!` executed through one closure is visible to every other
//! closure sharing that frame:
//!
//! ```scheme
//! (L4 (define x 0)
//!     (define bump (lambda () (set! x (+ x 1)) x))
//!     (bump)
//!     (bump))                          ; => 2
//! ```
//!
//! ## Error model
//!
//! Every fallible operation returns a tagged error value; nothing throws.
//! Parse failures across sibling forms (program elements, binding lists,
//! operand lists) are aggregated into a single message rather than
//! reporting only the first.
//!
//! ## Modules
//!
//! - `sexp`: generic S-expression structure consumed by the parser
//! - `reader`: text to S-expression reading (feature `reader`)
//! - `ast`: typed expression tree and unparsing
//! - `parser`: S-expression to AST, with the quoted-datum parser
//! - `value`: runtime values and printable rendering
//! - `env`: environment frames supporting `set!` and `letrec`
//! - `evaluator`: applicative-order evaluation
//! - `builtinops`: the primitive-operation dispatch table

use std::fmt;

/// Maximum reader nesting depth, bounding deeply nested input forms
pub const MAX_PARSE_DEPTH: usize = 32;

/// Maximum evaluation recursion depth. Runaway recursion is reported as
/// [`Error::DepthExceeded`] instead of exhausting the host stack.
pub const MAX_EVAL_DEPTH: usize = 512;

/// Error type for the interpreter
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Malformed syntax: wrong arity, unexpected empty form, bad binding
    /// target, malformed dotted literal, nested program
    ParseError(String),
    /// Lookup or mutation target not found in any enclosing frame
    UnboundVariable(String),
    /// Operation applied to an operand of the wrong kind
    TypeError(String),
    /// Application head is neither a primitive nor a closure
    BadProcedure(String),
    /// Expression matches no known evaluation rule
    BadForm(String),
    /// Evaluation exceeded the recursion depth limit
    DepthExceeded(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ParseError(msg) => write!(f, "ParseError: {msg}"),
            Error::UnboundVariable(var) => write!(f, "Unbound variable: {var}"),
            Error::TypeError(msg) => write!(f, "Type error: {msg}"),
            Error::BadProcedure(msg) => write!(f, "Bad procedure: {msg}"),
            Error::BadForm(msg) => write!(f, "Bad form: {msg}"),
            Error::DepthExceeded(max) => {
                write!(f, "Evaluation depth limit exceeded (max: {max})")
            }
        }
    }
}

pub mod ast;
pub mod builtinops;
pub mod env;
pub mod evaluator;
pub mod parser;
pub mod sexp;
pub mod value;

#[cfg(feature = "reader")]
pub mod reader;
