//! Environment model: a graph of frames mapping names to values.
//!
//! An environment is defined inductively:
//!
//! - `Empty`: the terminal environment; every lookup fails.
//! - `Ext`: an ordinary frame of positionally matched variables and
//!   values, wrapping a next environment.
//! - `Rec`: a recursive frame for `letrec`. It stores parameter lists
//!   and bodies instead of values; looking up one of its names derives a
//!   fresh closure over the frame itself, which is what lets mutually
//!   recursive bodies resolve their sibling names.
//! - `Global`: the single growable top-level frame mutated by `define`.
//!
//! Frames are shared, not copied: closures hold the same `Rc` as the
//! scope that created the frame. Bindings in `Ext` and `Global` frames
//! are independently mutable cells so `set!` can rebind in place and the
//! update is visible through every alias of the frame.

use std::cell::RefCell;
use std::rc::Rc;

use crate::Error;
use crate::ast::{CExp, VarDecl};
use crate::value::{Closure, Value};

/// An environment: a chain of frames, innermost first
#[derive(Debug, Clone)]
pub enum Env {
    Empty,
    Ext(Rc<ExtFrame>),
    Rec(Rc<RecFrame>),
    Global(Rc<GlobalFrame>),
}

/// An ordinary frame: `vars[i]` is bound to the cell `vals[i]`
#[derive(Debug)]
pub struct ExtFrame {
    vars: Vec<String>,
    vals: Vec<RefCell<Value>>,
    next: Env,
}

/// A recursive frame: `vars[i]` is bound to a closure derived on demand
/// from `paramss[i]` / `bodiess[i]`, closing over this frame
#[derive(Debug)]
pub struct RecFrame {
    vars: Vec<String>,
    paramss: Vec<Vec<VarDecl>>,
    bodiess: Vec<Vec<CExp>>,
    next: Env,
}

/// The growable top-level frame
#[derive(Debug, Default)]
pub struct GlobalFrame {
    bindings: RefCell<Vec<(String, Value)>>,
}

impl Env {
    /// Create a fresh global environment, the root for one program run.
    pub fn global() -> Env {
        Env::Global(Rc::new(GlobalFrame::default()))
    }

    /// Extend with an ordinary frame. `vars` and `vals` correspond
    /// positionally; the caller is responsible for matching lengths.
    pub fn extend(&self, vars: Vec<String>, vals: Vec<Value>) -> Env {
        debug_assert_eq!(vars.len(), vals.len());
        Env::Ext(Rc::new(ExtFrame {
            vars,
            vals: vals.into_iter().map(RefCell::new).collect(),
            next: self.clone(),
        }))
    }

    /// Extend with a recursive frame. `vars`, `paramss` and `bodiess`
    /// correspond positionally.
    pub fn extend_rec(
        &self,
        vars: Vec<String>,
        paramss: Vec<Vec<VarDecl>>,
        bodiess: Vec<Vec<CExp>>,
    ) -> Env {
        debug_assert_eq!(vars.len(), paramss.len());
        debug_assert_eq!(vars.len(), bodiess.len());
        Env::Rec(Rc::new(RecFrame {
            vars,
            paramss,
            bodiess,
            next: self.clone(),
        }))
    }

    /// Look up a variable, walking frames outward. Within one frame the
    /// scan is left-to-right, so the first occurrence of a duplicated
    /// name shadows later ones.
    pub fn lookup(&self, name: &str) -> Result<Value, Error> {
        match self {
            Env::Empty => Err(Error::UnboundVariable(name.to_owned())),
            Env::Ext(frame) => match frame.position(name) {
                Some(i) => Ok(frame.vals[i].borrow().clone()),
                None => frame.next.lookup(name),
            },
            Env::Rec(frame) => match frame.position(name) {
                // A fresh closure per lookup, closing over this frame.
                // Building it eagerly at frame-creation time is not
                // possible: the closure must capture the frame it is
                // stored in.
                Some(i) => Ok(Value::Closure(Closure {
                    params: frame.paramss[i].clone(),
                    body: frame.bodiess[i].clone(),
                    env: Env::Rec(Rc::clone(frame)),
                })),
                None => frame.next.lookup(name),
            },
            Env::Global(frame) => frame
                .get(name)
                .ok_or_else(|| Error::UnboundVariable(name.to_owned())),
        }
    }

    /// Rebind a variable in place for `set!`. The update happens in the
    /// innermost frame containing the name; if the name is unbound, no
    /// frame is touched.
    pub fn rebind(&self, name: &str, val: Value) -> Result<(), Error> {
        match self {
            Env::Empty => Err(Error::UnboundVariable(name.to_owned())),
            Env::Ext(frame) => match frame.position(name) {
                Some(i) => {
                    *frame.vals[i].borrow_mut() = val;
                    Ok(())
                }
                None => frame.next.rebind(name, val),
            },
            Env::Rec(frame) => {
                if frame.position(name).is_some() {
                    // Recursive frames hold no cells; skipping outward
                    // would mutate a shadowed binding instead.
                    Err(Error::TypeError(format!(
                        "set!: {name} is bound by letrec and cannot be mutated"
                    )))
                } else {
                    frame.next.rebind(name, val)
                }
            }
            Env::Global(frame) => {
                if frame.set(name, val) {
                    Ok(())
                } else {
                    Err(Error::UnboundVariable(name.to_owned()))
                }
            }
        }
    }

    /// Add or overwrite a top-level binding. Valid only on the global
    /// environment, where `define` is evaluated.
    pub fn define(&self, name: &str, val: Value) -> Result<(), Error> {
        match self {
            Env::Global(frame) => {
                frame.define(name, val);
                Ok(())
            }
            _ => Err(Error::BadForm(
                "define outside the global environment".to_owned(),
            )),
        }
    }
}

// Environments compare by frame identity: two environments are equal when
// they share the same frame object.
impl PartialEq for Env {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Env::Empty, Env::Empty) => true,
            (Env::Ext(a), Env::Ext(b)) => Rc::ptr_eq(a, b),
            (Env::Rec(a), Env::Rec(b)) => Rc::ptr_eq(a, b),
            (Env::Global(a), Env::Global(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl ExtFrame {
    fn position(&self, name: &str) -> Option<usize> {
        self.vars.iter().position(|v| v == name)
    }
}

impl RecFrame {
    fn position(&self, name: &str) -> Option<usize> {
        self.vars.iter().position(|v| v == name)
    }
}

impl GlobalFrame {
    fn get(&self, name: &str) -> Option<Value> {
        self.bindings
            .borrow()
            .iter()
            .find(|(var, _)| var == name)
            .map(|(_, val)| val.clone())
    }

    fn set(&self, name: &str, val: Value) -> bool {
        let mut bindings = self.bindings.borrow_mut();
        match bindings.iter_mut().find(|(var, _)| var == name) {
            Some(binding) => {
                binding.1 = val;
                true
            }
            None => false,
        }
    }

    fn define(&self, name: &str, val: Value) {
        let mut bindings = self.bindings.borrow_mut();
        match bindings.iter_mut().find(|(var, _)| var == name) {
            Some(binding) => binding.1 = val,
            None => bindings.push((name.to_owned(), val)),
        }
    }
}
