//! Generic S-expression structure: the parser's input format.
//!
//! A [`Sexp`] is the untyped nested structure a reader produces from
//! text: bare atom tokens, pre-tagged string literals, and nested lists.
//! String literals are kept distinct from atoms so the AST parser can
//! tell a lexical string apart from a symbol or identifier.

use std::fmt;

/// An untyped S-expression as produced by a reader
#[derive(Debug, Clone, PartialEq)]
pub enum Sexp {
    /// A bare token: identifier, number literal, `#t`, `.`, an operator
    Atom(String),
    /// A double-quoted string literal, quotes and escapes resolved
    Str(String),
    /// A parenthesized sequence of S-expressions
    List(Vec<Sexp>),
}

impl Sexp {
    /// Construct an atom token.
    pub fn atom<S: AsRef<str>>(token: S) -> Sexp {
        Sexp::Atom(token.as_ref().to_owned())
    }

    /// Construct a string literal.
    pub fn string<S: AsRef<str>>(s: S) -> Sexp {
        Sexp::Str(s.as_ref().to_owned())
    }

    /// Construct a list.
    pub fn list<I: IntoIterator<Item = Sexp>>(items: I) -> Sexp {
        Sexp::List(items.into_iter().collect())
    }
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Atom(token) => write!(f, "{token}"),
            Sexp::Str(s) => write!(f, "\"{s}\""),
            Sexp::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}
