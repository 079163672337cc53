//! Parsing: generic S-expressions into the typed AST.
//!
//! The entry point [`parse`] dispatches on the shape of the input: a
//! list headed by `L4` is a program, a list headed by `define` is a
//! top-level definition, anything else is a computable expression.
//! Atomic tokens are classified as booleans, numbers, strings, primitive
//! operators, or variable references, in that order.
//!
//! Every step returns a value or an error; nothing throws. When several
//! independent sub-parses fail (program elements, binding lists, operand
//! lists), the reported message concatenates all sub-messages instead of
//! keeping only the first.

use crate::Error;
use crate::ast::{Binding, CExp, Exp, Parsed, Program, VarDecl};
use crate::builtinops::is_builtin_op;
use crate::sexp::Sexp;
use crate::value::Value;

/// Parse one raw S-expression into a program or top-level expression.
pub fn parse(sexp: &Sexp) -> Result<Parsed, Error> {
    match sexp {
        Sexp::List(items) if items.is_empty() => {
            Err(Error::ParseError("unexpected empty form".to_owned()))
        }
        Sexp::List(items) => match &items[0] {
            Sexp::Atom(head) if head == "L4" => parse_program(&items[1..]),
            Sexp::Atom(head) if head == "define" => parse_define(items).map(Parsed::Exp),
            _ => parse_cexp(sexp).map(|exp| Parsed::Exp(Exp::CExp(exp))),
        },
        _ => parse_cexp(sexp).map(|exp| Parsed::Exp(Exp::CExp(exp))),
    }
}

/// Read and parse in one step.
#[cfg(feature = "reader")]
pub fn parse_str(input: &str) -> Result<Parsed, Error> {
    crate::reader::read(input).and_then(|sexp| parse(&sexp))
}

/// The raw message of an error, without its kind prefix, for aggregation.
fn error_message(error: &Error) -> String {
    match error {
        Error::ParseError(msg) => msg.clone(),
        other => other.to_string(),
    }
}

fn aggregate(errors: &[Error]) -> Error {
    Error::ParseError(
        errors
            .iter()
            .map(error_message)
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// Parse every element of a sibling group, aggregating all failures.
fn parse_cexps<'a, I>(sexps: I) -> Result<Vec<CExp>, Error>
where
    I: IntoIterator<Item = &'a Sexp>,
{
    let mut exps = Vec::new();
    let mut errors = Vec::new();
    for sexp in sexps {
        match parse_cexp(sexp) {
            Ok(exp) => exps.push(exp),
            Err(err) => errors.push(err),
        }
    }
    if errors.is_empty() {
        Ok(exps)
    } else {
        Err(aggregate(&errors))
    }
}

fn parse_program(elements: &[Sexp]) -> Result<Parsed, Error> {
    if elements.is_empty() {
        return Err(Error::ParseError("empty program".to_owned()));
    }
    let mut exps = Vec::new();
    let mut errors = Vec::new();
    let mut nested_program = false;
    for element in elements {
        match parse(element) {
            Ok(Parsed::Exp(exp)) => exps.push(exp),
            Ok(Parsed::Program(_)) => nested_program = true,
            Err(err) => errors.push(err),
        }
    }
    if !errors.is_empty() {
        Err(aggregate(&errors))
    } else if nested_program {
        Err(Error::ParseError(
            "program cannot be embedded in another program".to_owned(),
        ))
    } else {
        Ok(Parsed::Program(Program { exps }))
    }
}

fn parse_define(items: &[Sexp]) -> Result<Exp, Error> {
    match items {
        [_, Sexp::Atom(var), val] => Ok(Exp::Define {
            var: VarDecl::new(var),
            val: parse_cexp(val)?,
        }),
        [_, other, _] => Err(Error::ParseError(format!(
            "define target must be an identifier, got {other}"
        ))),
        _ => Err(Error::ParseError(
            "define should be (define <var> <CExp>)".to_owned(),
        )),
    }
}

/// Parse a computable expression.
pub fn parse_cexp(sexp: &Sexp) -> Result<CExp, Error> {
    match sexp {
        Sexp::List(items) if items.is_empty() => {
            Err(Error::ParseError("unexpected empty form".to_owned()))
        }
        Sexp::List(items) => parse_compound_cexp(items),
        _ => parse_atomic(sexp),
    }
}

/// Classify an atomic token: boolean, number, string, primitive
/// operator, or variable reference.
fn parse_atomic(sexp: &Sexp) -> Result<CExp, Error> {
    match sexp {
        Sexp::Str(s) => Ok(CExp::Str(s.clone())),
        Sexp::Atom(token) => Ok(match token.as_str() {
            "#t" => CExp::Bool(true),
            "#f" => CExp::Bool(false),
            _ if is_numeric_token(token) => CExp::Num(numeric_value(token)),
            _ if is_builtin_op(token) => CExp::PrimOp(token.clone()),
            _ => CExp::VarRef(token.clone()),
        }),
        Sexp::List(_) => Err(Error::ParseError(format!(
            "expected an atomic token, got {sexp}"
        ))),
    }
}

/// Numeric literal syntax: optional minus sign, digits, optional
/// fraction part.
fn is_numeric_token(token: &str) -> bool {
    let unsigned = token.strip_prefix('-').unwrap_or(token);
    let mut parts = unsigned.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next();
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    all_digits(int_part) && frac_part.is_none_or(all_digits)
}

fn numeric_value(token: &str) -> f64 {
    // is_numeric_token guarantees valid f64 syntax
    token.parse().unwrap_or(f64::NAN)
}

fn parse_compound_cexp(items: &[Sexp]) -> Result<CExp, Error> {
    match &items[0] {
        Sexp::Atom(head) => match head.as_str() {
            "if" => parse_if(items),
            "lambda" => parse_proc(items),
            "let" => parse_let_like(items, false),
            "letrec" => parse_let_like(items, true),
            "quote" => parse_lit(items),
            "set!" => parse_set(items),
            _ => parse_app(items),
        },
        _ => parse_app(items),
    }
}

fn parse_if(items: &[Sexp]) -> Result<CExp, Error> {
    if items.len() != 4 {
        return Err(Error::ParseError(
            "if should be (if <test> <then> <alt>)".to_owned(),
        ));
    }
    let mut operands = parse_cexps(&items[1..])?.into_iter();
    Ok(CExp::If {
        test: Box::new(operands.next().unwrap()),
        then: Box::new(operands.next().unwrap()),
        alt: Box::new(operands.next().unwrap()),
    })
}

fn parse_proc(items: &[Sexp]) -> Result<CExp, Error> {
    if items.len() < 3 {
        return Err(Error::ParseError(
            "lambda should be (lambda (<var>*) <body>+)".to_owned(),
        ));
    }
    let params = match &items[1] {
        Sexp::List(param_sexps) => param_sexps
            .iter()
            .map(|p| match p {
                Sexp::Atom(name) => Ok(VarDecl::new(name)),
                other => Err(Error::ParseError(format!(
                    "lambda parameters must be identifiers, got {other}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?,
        other => {
            return Err(Error::ParseError(format!(
                "lambda parameters must be a list, got {other}"
            )));
        }
    };
    let body = parse_cexps(&items[2..])?;
    Ok(CExp::Proc { params, body })
}

fn parse_let_like(items: &[Sexp], recursive: bool) -> Result<CExp, Error> {
    let keyword = if recursive { "letrec" } else { "let" };
    if items.len() < 2 {
        return Err(Error::ParseError(format!(
            "{keyword} should be ({keyword} ((<var> <val>)*) <body>+)"
        )));
    }
    let bindings = parse_bindings(&items[1])?;
    let body = parse_cexps(&items[2..])?;
    Ok(if recursive {
        CExp::Letrec { bindings, body }
    } else {
        CExp::Let { bindings, body }
    })
}

/// Parse a binding list: each binding is a 2-element list whose first
/// element is an identifier token.
fn parse_bindings(sexp: &Sexp) -> Result<Vec<Binding>, Error> {
    let binding_sexps = match sexp {
        Sexp::List(items) => items,
        other => {
            return Err(Error::ParseError(format!("bad bindings: {other}")));
        }
    };
    let mut vars = Vec::new();
    let mut val_sexps = Vec::new();
    for binding in binding_sexps {
        match binding {
            Sexp::List(pair) if pair.len() == 2 => match &pair[0] {
                Sexp::Atom(var) => {
                    vars.push(var.clone());
                    val_sexps.push(&pair[1]);
                }
                other => {
                    return Err(Error::ParseError(format!(
                        "bad bindings: {other} is not an identifier"
                    )));
                }
            },
            other => {
                return Err(Error::ParseError(format!("bad bindings: {other}")));
            }
        }
    }
    let vals = parse_cexps(val_sexps)?;
    Ok(vars
        .into_iter()
        .zip(vals)
        .map(|(var, val)| Binding::new(var, val))
        .collect())
}

fn parse_lit(items: &[Sexp]) -> Result<CExp, Error> {
    if items.len() != 2 {
        return Err(Error::ParseError(
            "quote should be (quote <datum>)".to_owned(),
        ));
    }
    Ok(CExp::Lit(parse_datum(&items[1])?))
}

fn parse_set(items: &[Sexp]) -> Result<CExp, Error> {
    match items {
        [_, Sexp::Atom(var), val] => Ok(CExp::Set {
            var: var.clone(),
            val: Box::new(parse_cexp(val)?),
        }),
        _ => Err(Error::ParseError(
            "set! should be (set! <var> <CExp>)".to_owned(),
        )),
    }
}

fn parse_app(items: &[Sexp]) -> Result<CExp, Error> {
    let mut exps = parse_cexps(items)?.into_iter();
    let rator = exps.next().unwrap();
    Ok(CExp::App {
        rator: Box::new(rator),
        rands: exps.collect(),
    })
}

/// Parse a quoted datum into its value-level representation: scalars map
/// directly, bare tokens become symbols, lists become right-branching
/// cons chains, and a 3-element list with a `.` in the middle is a
/// dotted pair.
pub fn parse_datum(sexp: &Sexp) -> Result<Value, Error> {
    match sexp {
        Sexp::Atom(token) => Ok(match token.as_str() {
            "#t" => Value::Bool(true),
            "#f" => Value::Bool(false),
            _ if is_numeric_token(token) => Value::Number(numeric_value(token)),
            _ => Value::symbol(token),
        }),
        Sexp::Str(s) => Ok(Value::Str(s.clone())),
        Sexp::List(items) => parse_datum_list(items),
    }
}

fn parse_datum_list(items: &[Sexp]) -> Result<Value, Error> {
    match items {
        [] => Ok(Value::Empty),
        [val1, Sexp::Atom(dot), val2] if dot == "." => {
            Ok(Value::cons(parse_datum(val1)?, parse_datum(val2)?))
        }
        [Sexp::Atom(dot), ..] if dot == "." => Err(Error::ParseError(format!(
            "bad dotted sexp: {}",
            Sexp::List(items.to_vec())
        ))),
        [first, rest @ ..] => Ok(Value::cons(parse_datum(first)?, parse_datum_list(rest)?)),
    }
}

#[cfg(test)]
mod datum_tests {
    use super::*;

    #[test]
    fn test_parse_datum() {
        let cases = vec![
            (Sexp::atom("42"), Ok(Value::Number(42.0))),
            (Sexp::atom("#t"), Ok(Value::Bool(true))),
            (Sexp::string("hi"), Ok(Value::string("hi"))),
            (Sexp::atom("abc"), Ok(Value::symbol("abc"))),
            (Sexp::list([]), Ok(Value::Empty)),
            (
                Sexp::list([Sexp::atom("1"), Sexp::atom("2")]),
                Ok(Value::list_from([Value::Number(1.0), Value::Number(2.0)])),
            ),
            (
                Sexp::list([Sexp::atom("1"), Sexp::atom("."), Sexp::atom("2")]),
                Ok(Value::cons(Value::Number(1.0), Value::Number(2.0))),
            ),
            (
                // (a b . c) parses as (a . (b . c))
                Sexp::list([
                    Sexp::atom("a"),
                    Sexp::atom("b"),
                    Sexp::atom("."),
                    Sexp::atom("c"),
                ]),
                Ok(Value::cons(
                    Value::symbol("a"),
                    Value::cons(Value::symbol("b"), Value::symbol("c")),
                )),
            ),
            (
                Sexp::list([Sexp::atom("."), Sexp::atom("x")]),
                Err(()),
            ),
        ];
        for (i, (sexp, expected)) in cases.iter().enumerate() {
            let result = parse_datum(sexp);
            match expected {
                Ok(want) => assert_eq!(result.as_ref(), Ok(want), "case #{}", i + 1),
                Err(()) => assert!(
                    matches!(result, Err(Error::ParseError(_))),
                    "case #{}: expected a parse error, got {result:?}",
                    i + 1
                ),
            }
        }
    }
}
