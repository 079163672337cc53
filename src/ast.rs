//! Typed abstract syntax tree for L4.
//!
//! Expressions form a closed, tagged union: a [`Program`] holds a
//! sequence of top-level expressions, an [`Exp`] is either a top-level
//! `define` or a computable expression, and a [`CExp`] covers the atomic
//! and compound forms. Quoted literals hold a runtime [`Value`] built
//! from the datum subset (symbols, pairs, scalars, the empty list).
//!
//! `Display` on each node is the unparser: it renders canonical surface
//! syntax such that parsing the rendered text reproduces the same tree.

use std::fmt;

use crate::value::Value;

/// A declared variable name (binding position)
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub var: String,
}

impl VarDecl {
    pub fn new<S: AsRef<str>>(var: S) -> VarDecl {
        VarDecl {
            var: var.as_ref().to_owned(),
        }
    }
}

/// One `let`/`letrec` binding: a variable paired with its value expression
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub var: VarDecl,
    pub val: CExp,
}

impl Binding {
    pub fn new<S: AsRef<str>>(var: S, val: CExp) -> Binding {
        Binding {
            var: VarDecl::new(var),
            val,
        }
    }
}

/// A top-level program: `(L4 <exp>+)`. Never nested.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub exps: Vec<Exp>,
}

/// A top-level expression: `define` or a computable expression
#[derive(Debug, Clone, PartialEq)]
pub enum Exp {
    Define { var: VarDecl, val: CExp },
    CExp(CExp),
}

/// A computable expression
#[derive(Debug, Clone, PartialEq)]
pub enum CExp {
    /// Number literal
    Num(f64),
    /// Boolean literal (`#t` / `#f`)
    Bool(bool),
    /// String literal
    Str(String),
    /// One of the closed set of primitive operators
    PrimOp(String),
    /// Variable reference
    VarRef(String),
    /// Application: `(<rator> <rand>*)`
    App { rator: Box<CExp>, rands: Vec<CExp> },
    /// Conditional: `(if <test> <then> <alt>)`
    If {
        test: Box<CExp>,
        then: Box<CExp>,
        alt: Box<CExp>,
    },
    /// Procedure: `(lambda (<var>*) <body>+)`
    Proc { params: Vec<VarDecl>, body: Vec<CExp> },
    /// Quoted literal datum
    Lit(Value),
    /// `(let ((<var> <val>)*) <body>+)`
    Let {
        bindings: Vec<Binding>,
        body: Vec<CExp>,
    },
    /// `(letrec ((<var> <val>)*) <body>+)`
    Letrec {
        bindings: Vec<Binding>,
        body: Vec<CExp>,
    },
    /// Mutation: `(set! <var> <val>)`
    Set { var: String, val: Box<CExp> },
}

impl CExp {
    /// Atomic expressions carry no subexpressions.
    pub fn is_atomic(&self) -> bool {
        matches!(
            self,
            CExp::Num(_) | CExp::Bool(_) | CExp::Str(_) | CExp::PrimOp(_) | CExp::VarRef(_)
        )
    }
}

/// Result of parsing one raw S-expression: a whole program or a single
/// top-level expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Program(Program),
    Exp(Exp),
}

/// Render an AST back to canonical surface syntax.
pub fn unparse(parsed: &Parsed) -> String {
    parsed.to_string()
}

fn write_seq<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_bindings(f: &mut fmt::Formatter<'_>, bindings: &[Binding]) -> fmt::Result {
    write!(f, "(")?;
    for (i, b) in bindings.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "({} {})", b.var.var, b.val)?;
    }
    write!(f, ")")
}

impl fmt::Display for CExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CExp::Num(n) => write!(f, "{n}"),
            CExp::Bool(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            CExp::Str(s) => write!(f, "{}", Value::Str(s.clone())),
            CExp::PrimOp(op) => write!(f, "{op}"),
            CExp::VarRef(var) => write!(f, "{var}"),
            CExp::App { rator, rands } => {
                write!(f, "({rator}")?;
                for rand in rands {
                    write!(f, " {rand}")?;
                }
                write!(f, ")")
            }
            CExp::If { test, then, alt } => write!(f, "(if {test} {then} {alt})"),
            CExp::Proc { params, body } => {
                write!(f, "(lambda (")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", p.var)?;
                }
                write!(f, ") ")?;
                write_seq(f, body)?;
                write!(f, ")")
            }
            // Quoted data are re-prefixed with ' so the rendering reads
            // back to the same literal node.
            CExp::Lit(val) => write!(f, "'{val}"),
            CExp::Let { bindings, body } => {
                write!(f, "(let ")?;
                write_bindings(f, bindings)?;
                write!(f, " ")?;
                write_seq(f, body)?;
                write!(f, ")")
            }
            CExp::Letrec { bindings, body } => {
                write!(f, "(letrec ")?;
                write_bindings(f, bindings)?;
                write!(f, " ")?;
                write_seq(f, body)?;
                write!(f, ")")
            }
            CExp::Set { var, val } => write!(f, "(set! {var} {val})"),
        }
    }
}

impl fmt::Display for Exp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exp::Define { var, val } => write!(f, "(define {} {val})", var.var),
            Exp::CExp(e) => write!(f, "{e}"),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(L4 ")?;
        write_seq(f, &self.exps)?;
        write!(f, ")")
    }
}

impl fmt::Display for Parsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parsed::Program(p) => write!(f, "{p}"),
            Parsed::Exp(e) => write!(f, "{e}"),
        }
    }
}
