//! Applicative-order evaluation over the typed AST.
//!
//! Evaluation is a direct recursive walk: the operator and all operands
//! of an application are fully evaluated, left to right, before the
//! application happens, and any operand error short-circuits the
//! application. Conditionals are lazy in their branches; everything but
//! the boolean `#f` counts as true. Procedure expressions close over the
//! environment they are evaluated in; applying a closure extends the
//! *captured* environment, not the caller's.
//!
//! Top-level `define` mutates the global environment additively, so
//! later expressions (and recursive references through the global frame)
//! see the new binding. Recursion depth is tracked through every call
//! and bounded by [`MAX_EVAL_DEPTH`].

use crate::Error;
use crate::MAX_EVAL_DEPTH;
use crate::ast::{Binding, CExp, Exp, Parsed, Program};
use crate::builtinops::apply_builtin;
use crate::env::Env;
use crate::value::{Closure, Value};

/// Evaluate a computable expression in an environment.
pub fn evaluate(exp: &CExp, env: &Env) -> Result<Value, Error> {
    applicative_eval(exp, env, 0)
}

/// Everything except the boolean `#f` is true.
pub fn is_true_value(val: &Value) -> bool {
    !matches!(val, Value::Bool(false))
}

fn applicative_eval(exp: &CExp, env: &Env, depth: usize) -> Result<Value, Error> {
    if depth >= MAX_EVAL_DEPTH {
        return Err(Error::DepthExceeded(MAX_EVAL_DEPTH));
    }
    match exp {
        CExp::Num(n) => Ok(Value::Number(*n)),
        CExp::Bool(b) => Ok(Value::Bool(*b)),
        CExp::Str(s) => Ok(Value::Str(s.clone())),
        CExp::PrimOp(op) => Ok(Value::PrimOp(op.clone())),
        CExp::VarRef(var) => env.lookup(var),
        CExp::Lit(val) => Ok(val.clone()),
        CExp::If { test, then, alt } => {
            let test_val = applicative_eval(test, env, depth + 1)?;
            // The untaken branch is never evaluated
            if is_true_value(&test_val) {
                applicative_eval(then, env, depth + 1)
            } else {
                applicative_eval(alt, env, depth + 1)
            }
        }
        CExp::Proc { params, body } => Ok(Value::Closure(Closure {
            params: params.clone(),
            body: body.clone(),
            env: env.clone(),
        })),
        CExp::App { rator, rands } => {
            let proc = applicative_eval(rator, env, depth + 1)?;
            let args = rands
                .iter()
                .map(|rand| applicative_eval(rand, env, depth + 1))
                .collect::<Result<Vec<_>, _>>()?;
            apply_procedure(&proc, args, depth).map_err(|err| add_context(err, exp))
        }
        CExp::Let { bindings, body } => eval_let(bindings, body, env, depth),
        CExp::Letrec { bindings, body } => eval_letrec(bindings, body, env, depth),
        CExp::Set { var, val } => {
            let new_val = applicative_eval(val, env, depth + 1)?;
            env.rebind(var, new_val)?;
            Ok(Value::Unspecified)
        }
    }
}

/// Apply a primitive or closure to already-evaluated arguments.
fn apply_procedure(proc: &Value, args: Vec<Value>, depth: usize) -> Result<Value, Error> {
    match proc {
        Value::PrimOp(op) => apply_builtin(op, &args),
        Value::Closure(closure) => apply_closure(closure, args, depth),
        other => Err(Error::BadProcedure(other.to_string())),
    }
}

/// Extend the closure's captured environment (not the caller's) with the
/// parameters bound to the arguments, then evaluate the body sequence.
fn apply_closure(closure: &Closure, args: Vec<Value>, depth: usize) -> Result<Value, Error> {
    if closure.params.len() != args.len() {
        return Err(Error::TypeError(format!(
            "procedure expects {} argument(s), got {}",
            closure.params.len(),
            args.len()
        )));
    }
    let vars = closure.params.iter().map(|p| p.var.clone()).collect();
    let ext_env = closure.env.extend(vars, args);
    eval_seq(&closure.body, &ext_env, depth + 1)
}

/// Annotate application failures with the offending expression.
fn add_context(error: Error, exp: &CExp) -> Error {
    let context = format!("while evaluating: {exp}");
    match error {
        Error::TypeError(msg) => Error::TypeError(format!("{msg}\n  Context: {context}")),
        Error::BadProcedure(msg) => Error::BadProcedure(format!("{msg}\n  Context: {context}")),
        other => other,
    }
}

/// `let`: right-hand sides are evaluated in the outer environment (not
/// sequentially visible to each other), then all bindings extend the
/// outer environment simultaneously.
fn eval_let(bindings: &[Binding], body: &[CExp], env: &Env, depth: usize) -> Result<Value, Error> {
    let vals = bindings
        .iter()
        .map(|b| applicative_eval(&b.val, env, depth + 1))
        .collect::<Result<Vec<_>, _>>()?;
    let vars = bindings.iter().map(|b| b.var.var.clone()).collect();
    let ext_env = env.extend(vars, vals);
    eval_seq(body, &ext_env, depth + 1)
}

/// `letrec`: every binding must be a lambda form. The recursive frame
/// stores the parameter lists and bodies; looking a name up derives a
/// closure over the frame itself, so sibling names resolve from inside
/// any of the bodies.
fn eval_letrec(
    bindings: &[Binding],
    body: &[CExp],
    env: &Env,
    depth: usize,
) -> Result<Value, Error> {
    let mut vars = Vec::new();
    let mut paramss = Vec::new();
    let mut bodiess = Vec::new();
    for binding in bindings {
        match &binding.val {
            CExp::Proc { params, body } => {
                vars.push(binding.var.var.clone());
                paramss.push(params.clone());
                bodiess.push(body.clone());
            }
            other => {
                return Err(Error::TypeError(format!(
                    "letrec binds only lambda forms, got {other}"
                )));
            }
        }
    }
    let rec_env = env.extend_rec(vars, paramss, bodiess);
    eval_seq(body, &rec_env, depth + 1)
}

/// Evaluate a body sequence: non-final expressions for effect, the final
/// expression for its value. An error anywhere aborts the remainder.
fn eval_seq(exps: &[CExp], env: &Env, depth: usize) -> Result<Value, Error> {
    match exps {
        [] => Err(Error::BadForm("empty expression sequence".to_owned())),
        [rest @ .., last] => {
            for exp in rest {
                applicative_eval(exp, env, depth)?;
            }
            applicative_eval(last, env, depth)
        }
    }
}

/// Evaluate a top-level expression sequence against a global
/// environment. Each `define` evaluates its right-hand side in the
/// global environment and adds or overwrites the global binding before
/// the next expression runs; a trailing `define` yields the defined
/// value.
pub fn eval_exps(exps: &[Exp], env: &Env) -> Result<Value, Error> {
    if exps.is_empty() {
        return Err(Error::BadForm("empty expression sequence".to_owned()));
    }
    let mut result = Value::Unspecified;
    for exp in exps {
        result = match exp {
            Exp::Define { var, val } => {
                let rhs = applicative_eval(val, env, 0)?;
                env.define(&var.var, rhs.clone())?;
                rhs
            }
            Exp::CExp(cexp) => applicative_eval(cexp, env, 0)?,
        };
    }
    Ok(result)
}

/// Evaluate a whole program against a fresh global environment.
pub fn eval_program(program: &Program) -> Result<Value, Error> {
    let global_env = Env::global();
    eval_exps(&program.exps, &global_env)
}

/// Evaluate a parse result against a fresh global environment.
pub fn eval_parsed(parsed: &Parsed) -> Result<Value, Error> {
    match parsed {
        Parsed::Program(program) => eval_program(program),
        Parsed::Exp(exp) => {
            let global_env = Env::global();
            eval_exps(std::slice::from_ref(exp), &global_env)
        }
    }
}

/// Read, parse, and evaluate one input against a fresh global
/// environment.
#[cfg(feature = "reader")]
pub fn eval_string(input: &str) -> Result<Value, Error> {
    crate::parser::parse_str(input).and_then(|parsed| eval_parsed(&parsed))
}
