//! Callable values: user‑defined functions and host natives.
//!
//! Both expose the same capability set (a fixed arity plus `call`), and the
//! evaluator checks arity *before* invoking, so `call` itself never
//! re‑validates argument counts.

use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use chrono::Utc;
use log::debug;

use crate::ast::{FunctionDecl, Stmt};
use crate::environment::Environment;
use crate::interpreter::{ExecResult, Interpreter, Unwind};
use crate::value::Value;

/// A user‑defined function value.
///
/// Holds a shared handle to its declaration (parameter tokens + body) and a
/// shared handle to the environment that was current at *declaration* time:
/// the closure.  Capturing the defining environment rather than the caller's
/// is what makes scoping lexical.
#[derive(Clone)]
pub struct LoxFunction<'a> {
    declaration: Rc<FunctionDecl<'a>>,
    closure: Rc<RefCell<Environment<'a>>>,
}

impl<'a> LoxFunction<'a> {
    pub fn new(declaration: Rc<FunctionDecl<'a>>, closure: Rc<RefCell<Environment<'a>>>) -> Self {
        Self {
            declaration,
            closure,
        }
    }

    pub fn name(&self) -> &'a str {
        self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Execute the function body in a fresh environment chained to the
    /// captured closure, with each parameter bound positionally.
    ///
    /// A `return` unwind from the body stops *here* and becomes the call
    /// result; runtime failures keep propagating.
    pub fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<'a, W>,
        arguments: Vec<Value<'a>>,
    ) -> ExecResult<'a, Value<'a>> {
        debug!("Calling <fn {}> with {} arguments", self.name(), arguments.len());

        let mut environment: Environment<'a> = Environment::with_enclosing(self.closure.clone());

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(param.lexeme, argument);
        }

        let body: &[Stmt<'a>] = &self.declaration.body;

        match interpreter.execute_block(body, Rc::new(RefCell::new(environment))) {
            Ok(()) => Ok(Value::Nil),

            Err(Unwind::Return { value, .. }) => Ok(value),

            Err(unwind) => Err(unwind),
        }
    }
}

// Manual impl: the closure chain may contain this very function, so deriving
// Debug would recurse through the cycle.
impl<'a> fmt::Debug for LoxFunction<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .finish_non_exhaustive()
    }
}

/// A host‑defined function: no declaration, no environment machinery, just a
/// fixed computation.
#[derive(Debug, Clone)]
pub struct NativeFunction<'a> {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value<'a>]) -> Result<Value<'a>, String>,
}

impl<'a> NativeFunction<'a> {
    pub fn call(&self, arguments: &[Value<'a>]) -> Result<Value<'a>, String> {
        debug!("Calling <native fn {}>", self.name);

        (self.func)(arguments)
    }
}

/// The one native in the standard environment: wall‑clock seconds since the
/// Unix epoch, arity 0.
pub fn clock<'a>() -> NativeFunction<'a> {
    NativeFunction {
        name: "clock",
        arity: 0,
        func: |_args: &[Value<'_>]| {
            let seconds: f64 = Utc::now().timestamp_millis() as f64 / 1000.0;

            Ok(Value::Number(seconds))
        },
    }
}
