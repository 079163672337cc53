//! Primitive-operation registry.
//!
//! The language exposes a closed set of primitive operators. Each entry
//! pairs the operator token with its arity contract and implementation;
//! the parser consults the registry to classify atoms, and the evaluator
//! dispatches applications of [`Value::PrimOp`] through it.
//!
//! Primitives are ordinary applicative operations: they receive fully
//! evaluated arguments and return a value or a typed error. `and`/`or`
//! are no exception here - both operands are pre-evaluated and must be
//! booleans, which is stricter than standard Scheme.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::Error;
use crate::value::Value;

/// Expected number of arguments for a builtin operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    /// Check an argument count against this arity contract.
    pub fn validate(&self, op: &str, got: usize) -> Result<(), Error> {
        match self {
            Arity::Exact(expected) if got != *expected => Err(Error::TypeError(format!(
                "{op} expects exactly {expected} argument(s), got {got}"
            ))),
            Arity::AtLeast(min) if got < *min => Err(Error::TypeError(format!(
                "{op} expects at least {min} argument(s), got {got}"
            ))),
            _ => Ok(()),
        }
    }
}

/// Definition of one builtin operation
pub struct BuiltinOp {
    /// The operator token
    pub op: &'static str,
    /// Expected number of arguments
    pub arity: Arity,
    func: fn(&[Value]) -> Result<Value, Error>,
}

/// Registry of all builtin operations. The set is closed: the parser
/// recognizes exactly these tokens as primitive operators.
static BUILTIN_OPS: &[BuiltinOp] = &[
    // Arithmetic
    BuiltinOp {
        op: "+",
        arity: Arity::Any,
        func: prim_add,
    },
    BuiltinOp {
        op: "-",
        arity: Arity::Exact(2),
        func: prim_sub,
    },
    BuiltinOp {
        op: "*",
        arity: Arity::Any,
        func: prim_mul,
    },
    BuiltinOp {
        op: "/",
        arity: Arity::Exact(2),
        func: prim_div,
    },
    // Comparisons
    BuiltinOp {
        op: ">",
        arity: Arity::Exact(2),
        func: prim_gt,
    },
    BuiltinOp {
        op: "<",
        arity: Arity::Exact(2),
        func: prim_lt,
    },
    BuiltinOp {
        op: "=",
        arity: Arity::Exact(2),
        func: prim_num_eq,
    },
    // Boolean logic
    BuiltinOp {
        op: "not",
        arity: Arity::Exact(1),
        func: prim_not,
    },
    BuiltinOp {
        op: "and",
        arity: Arity::Exact(2),
        func: prim_and,
    },
    BuiltinOp {
        op: "or",
        arity: Arity::Exact(2),
        func: prim_or,
    },
    // Equality
    BuiltinOp {
        op: "eq?",
        arity: Arity::Exact(2),
        func: prim_eq,
    },
    BuiltinOp {
        op: "string=?",
        arity: Arity::Exact(2),
        func: prim_string_eq,
    },
    // Pairs and lists
    BuiltinOp {
        op: "cons",
        arity: Arity::Exact(2),
        func: prim_cons,
    },
    BuiltinOp {
        op: "car",
        arity: Arity::Exact(1),
        func: prim_car,
    },
    BuiltinOp {
        op: "cdr",
        arity: Arity::Exact(1),
        func: prim_cdr,
    },
    BuiltinOp {
        op: "list",
        arity: Arity::Any,
        func: prim_list,
    },
    // Type predicates
    BuiltinOp {
        op: "pair?",
        arity: Arity::Exact(1),
        func: prim_is_pair,
    },
    BuiltinOp {
        op: "list?",
        arity: Arity::Exact(1),
        func: prim_is_list,
    },
    BuiltinOp {
        op: "number?",
        arity: Arity::Exact(1),
        func: prim_is_number,
    },
    BuiltinOp {
        op: "boolean?",
        arity: Arity::Exact(1),
        func: prim_is_boolean,
    },
    BuiltinOp {
        op: "symbol?",
        arity: Arity::Exact(1),
        func: prim_is_symbol,
    },
    BuiltinOp {
        op: "string?",
        arity: Arity::Exact(1),
        func: prim_is_string,
    },
];

static OPS_BY_NAME: LazyLock<HashMap<&'static str, &'static BuiltinOp>> =
    LazyLock::new(|| BUILTIN_OPS.iter().map(|entry| (entry.op, entry)).collect());

/// Find a builtin operation by its operator token.
pub fn find_builtin_op(op: &str) -> Option<&'static BuiltinOp> {
    OPS_BY_NAME.get(op).copied()
}

/// Whether a token names a primitive operator.
pub fn is_builtin_op(op: &str) -> bool {
    OPS_BY_NAME.contains_key(op)
}

/// Apply a primitive operation to evaluated arguments.
pub fn apply_builtin(op: &str, args: &[Value]) -> Result<Value, Error> {
    // Unreachable through the parser, which only produces known tokens
    let entry =
        find_builtin_op(op).ok_or_else(|| Error::BadForm(format!("bad primitive op {op}")))?;
    entry.arity.validate(op, args.len())?;
    (entry.func)(args)
}

//
// Implementations
//

fn nums(op: &str, args: &[Value]) -> Result<Vec<f64>, Error> {
    args.iter()
        .map(|arg| match arg {
            Value::Number(n) => Ok(*n),
            _ => Err(Error::TypeError(format!("{op} expects numbers only"))),
        })
        .collect()
}

fn prim_add(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Number(nums("+", args)?.iter().sum()))
}

fn prim_mul(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Number(nums("*", args)?.iter().product()))
}

fn prim_sub(args: &[Value]) -> Result<Value, Error> {
    let ns = nums("-", args)?;
    Ok(Value::Number(ns[0] - ns[1]))
}

// No division-by-zero guard: IEEE semantics apply
fn prim_div(args: &[Value]) -> Result<Value, Error> {
    let ns = nums("/", args)?;
    Ok(Value::Number(ns[0] / ns[1]))
}

fn prim_gt(args: &[Value]) -> Result<Value, Error> {
    match (&args[0], &args[1]) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),
        (Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a > b)),
        _ => Err(Error::TypeError(
            "> expects numbers or strings only".to_owned(),
        )),
    }
}

fn prim_lt(args: &[Value]) -> Result<Value, Error> {
    match (&args[0], &args[1]) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),
        (Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a < b)),
        _ => Err(Error::TypeError(
            "< expects numbers or strings only".to_owned(),
        )),
    }
}

// Same-typed scalars compare by value; anything else is #f
fn prim_num_eq(args: &[Value]) -> Result<Value, Error> {
    let eq = match (&args[0], &args[1]) {
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        _ => false,
    };
    Ok(Value::Bool(eq))
}

fn prim_string_eq(args: &[Value]) -> Result<Value, Error> {
    match (&args[0], &args[1]) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Bool(a == b)),
        _ => Err(Error::TypeError("string=? expects strings only".to_owned())),
    }
}

// Only #f is false; every other value is true
fn prim_not(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(matches!(args[0], Value::Bool(false))))
}

fn bools(op: &str, args: &[Value]) -> Result<(bool, bool), Error> {
    match (&args[0], &args[1]) {
        (Value::Bool(a), Value::Bool(b)) => Ok((*a, *b)),
        _ => Err(Error::TypeError(format!("{op} expects booleans only"))),
    }
}

fn prim_and(args: &[Value]) -> Result<Value, Error> {
    let (a, b) = bools("and", args)?;
    Ok(Value::Bool(a && b))
}

fn prim_or(args: &[Value]) -> Result<Value, Error> {
    let (a, b) = bools("or", args)?;
    Ok(Value::Bool(a || b))
}

// Identity comparison case-by-case over the datum kinds; mixed or
// non-scalar operands compare unequal
fn prim_eq(args: &[Value]) -> Result<Value, Error> {
    let eq = match (&args[0], &args[1]) {
        (Value::Symbol(a), Value::Symbol(b)) => a == b,
        (Value::Empty, Value::Empty) => true,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        _ => false,
    };
    Ok(Value::Bool(eq))
}

fn prim_cons(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::cons(args[0].clone(), args[1].clone()))
}

fn prim_car(args: &[Value]) -> Result<Value, Error> {
    match &args[0] {
        Value::Compound(val1, _) => Ok((**val1).clone()),
        other => Err(Error::TypeError(format!("car expects a pair, got {other}"))),
    }
}

fn prim_cdr(args: &[Value]) -> Result<Value, Error> {
    match &args[0] {
        Value::Compound(_, val2) => Ok((**val2).clone()),
        other => Err(Error::TypeError(format!("cdr expects a pair, got {other}"))),
    }
}

fn prim_list(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::list_from(args.iter().cloned()))
}

fn prim_is_pair(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(matches!(args[0], Value::Compound(_, _))))
}

fn prim_is_list(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(matches!(
        args[0],
        Value::Empty | Value::Compound(_, _)
    )))
}

fn prim_is_number(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(matches!(args[0], Value::Number(_))))
}

fn prim_is_boolean(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(matches!(args[0], Value::Bool(_))))
}

fn prim_is_symbol(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(matches!(args[0], Value::Symbol(_))))
}

fn prim_is_string(args: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(matches!(args[0], Value::Str(_))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Number(n)
    }

    /// Expected outcome of one builtin application
    enum Expect {
        Val(Value),
        TypeErr,
    }
    use Expect::*;

    fn run_builtin_tests(cases: Vec<(&str, Vec<Value>, Expect)>) {
        for (i, (op, args, expected)) in cases.iter().enumerate() {
            let result = apply_builtin(op, args);
            match (result, expected) {
                (Ok(actual), Val(want)) => {
                    assert_eq!(actual, *want, "case #{}: ({op} ...)", i + 1);
                }
                (Err(Error::TypeError(_)), TypeErr) => {}
                (got, Val(want)) => {
                    panic!("case #{}: ({op} ...): expected {want:?}, got {got:?}", i + 1)
                }
                (got, TypeErr) => {
                    panic!("case #{}: ({op} ...): expected type error, got {got:?}", i + 1)
                }
            }
        }
    }

    #[test]
    fn test_arithmetic() {
        run_builtin_tests(vec![
            ("+", vec![num(1.0), num(2.0), num(3.0)], Val(num(6.0))),
            ("+", vec![], Val(num(0.0))),
            ("*", vec![num(2.0), num(3.0), num(4.0)], Val(num(24.0))),
            ("*", vec![], Val(num(1.0))),
            ("-", vec![num(10.0), num(4.0)], Val(num(6.0))),
            ("/", vec![num(1.0), num(2.0)], Val(num(0.5))),
            ("+", vec![num(1.0), Value::string("a")], TypeErr),
            ("*", vec![Value::Bool(true)], TypeErr),
            ("-", vec![num(1.0), Value::Empty], TypeErr),
            // Binary-only operations reject other argument counts
            ("-", vec![num(1.0)], TypeErr),
            ("/", vec![num(1.0), num(2.0), num(3.0)], TypeErr),
        ]);
    }

    #[test]
    fn test_division_follows_float_semantics() {
        let result = apply_builtin("/", &[num(1.0), num(0.0)]).unwrap();
        match result {
            Value::Number(n) => assert!(n.is_infinite()),
            other => panic!("expected a number, got {other:?}"),
        }
    }

    #[test]
    fn test_comparisons() {
        run_builtin_tests(vec![
            (">", vec![num(3.0), num(2.0)], Val(Value::Bool(true))),
            (">", vec![num(2.0), num(3.0)], Val(Value::Bool(false))),
            ("<", vec![num(2.0), num(3.0)], Val(Value::Bool(true))),
            (
                ">",
                vec![Value::string("b"), Value::string("a")],
                Val(Value::Bool(true)),
            ),
            (
                "<",
                vec![Value::string("b"), Value::string("a")],
                Val(Value::Bool(false)),
            ),
            (">", vec![num(1.0), Value::string("a")], TypeErr),
            ("<", vec![Value::Bool(true), Value::Bool(false)], TypeErr),
            ("=", vec![num(2.0), num(2.0)], Val(Value::Bool(true))),
            ("=", vec![num(2.0), num(3.0)], Val(Value::Bool(false))),
            ("=", vec![num(2.0), Value::string("2")], Val(Value::Bool(false))),
            (
                "string=?",
                vec![Value::string("ab"), Value::string("ab")],
                Val(Value::Bool(true)),
            ),
            ("string=?", vec![Value::string("ab"), num(1.0)], TypeErr),
        ]);
    }

    #[test]
    fn test_boolean_logic() {
        run_builtin_tests(vec![
            ("not", vec![Value::Bool(false)], Val(Value::Bool(true))),
            ("not", vec![Value::Bool(true)], Val(Value::Bool(false))),
            // Everything except #f counts as true
            ("not", vec![num(0.0)], Val(Value::Bool(false))),
            ("not", vec![Value::Empty], Val(Value::Bool(false))),
            (
                "and",
                vec![Value::Bool(true), Value::Bool(false)],
                Val(Value::Bool(false)),
            ),
            (
                "and",
                vec![Value::Bool(true), Value::Bool(true)],
                Val(Value::Bool(true)),
            ),
            (
                "or",
                vec![Value::Bool(false), Value::Bool(true)],
                Val(Value::Bool(true)),
            ),
            (
                "or",
                vec![Value::Bool(false), Value::Bool(false)],
                Val(Value::Bool(false)),
            ),
            ("and", vec![num(1.0), Value::Bool(true)], TypeErr),
            ("or", vec![Value::Bool(false), num(2.0)], TypeErr),
        ]);
    }

    #[test]
    fn test_eq() {
        run_builtin_tests(vec![
            (
                "eq?",
                vec![Value::symbol("a"), Value::symbol("a")],
                Val(Value::Bool(true)),
            ),
            (
                "eq?",
                vec![Value::symbol("a"), Value::symbol("b")],
                Val(Value::Bool(false)),
            ),
            ("eq?", vec![Value::Empty, Value::Empty], Val(Value::Bool(true))),
            ("eq?", vec![num(1.0), num(1.0)], Val(Value::Bool(true))),
            (
                "eq?",
                vec![Value::string("a"), Value::string("a")],
                Val(Value::Bool(true)),
            ),
            (
                "eq?",
                vec![Value::Bool(true), Value::Bool(true)],
                Val(Value::Bool(true)),
            ),
            ("eq?", vec![num(1.0), Value::string("1")], Val(Value::Bool(false))),
            (
                "eq?",
                vec![
                    Value::cons(num(1.0), Value::Empty),
                    Value::cons(num(1.0), Value::Empty),
                ],
                Val(Value::Bool(false)),
            ),
        ]);
    }

    #[test]
    fn test_pairs_and_lists() {
        let pair = Value::cons(num(1.0), num(2.0));
        let lst = Value::list_from([num(1.0), num(2.0), num(3.0)]);
        run_builtin_tests(vec![
            ("cons", vec![num(1.0), num(2.0)], Val(pair.clone())),
            ("car", vec![pair.clone()], Val(num(1.0))),
            ("cdr", vec![pair.clone()], Val(num(2.0))),
            ("car", vec![num(1.0)], TypeErr),
            ("cdr", vec![Value::Empty], TypeErr),
            ("list", vec![num(1.0), num(2.0), num(3.0)], Val(lst)),
            ("list", vec![], Val(Value::Empty)),
            ("pair?", vec![pair.clone()], Val(Value::Bool(true))),
            ("pair?", vec![Value::Empty], Val(Value::Bool(false))),
            ("list?", vec![Value::Empty], Val(Value::Bool(true))),
            ("list?", vec![pair], Val(Value::Bool(true))),
            ("list?", vec![num(1.0)], Val(Value::Bool(false))),
            ("number?", vec![num(1.0)], Val(Value::Bool(true))),
            ("number?", vec![Value::string("1")], Val(Value::Bool(false))),
            ("boolean?", vec![Value::Bool(false)], Val(Value::Bool(true))),
            ("symbol?", vec![Value::symbol("a")], Val(Value::Bool(true))),
            ("symbol?", vec![Value::string("a")], Val(Value::Bool(false))),
            ("string?", vec![Value::string("a")], Val(Value::Bool(true))),
            ("string?", vec![Value::symbol("a")], Val(Value::Bool(false))),
        ]);
    }

    #[test]
    fn test_registry_lookup() {
        assert!(is_builtin_op("+"));
        assert!(is_builtin_op("string=?"));
        assert!(!is_builtin_op("append"));
        assert!(!is_builtin_op("if"));

        assert_eq!(find_builtin_op("car").map(|entry| entry.op), Some("car"));
        assert!(matches!(
            apply_builtin("nope", &[]),
            Err(Error::BadForm(_))
        ));
    }
}
