//! Lexical scopes: a mutable name → value map chained to an optional
//! enclosing scope.
//!
//! The chain is shared, not owned: multiple closures may hold the same
//! enclosing environment, so links are `Rc<RefCell<_>>` and a scope lives as
//! long as its longest‑lived holder.  Lookup and assignment walk the chain
//! outward; `define` always binds in the innermost scope.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::{LoxError, Result};
use crate::token::Token;
use crate::value::Value;

#[derive(Debug, Clone, Default)]
pub struct Environment<'a> {
    values: HashMap<String, Value<'a>>,
    enclosing: Option<Rc<RefCell<Environment<'a>>>>,
}

impl<'a> Environment<'a> {
    /// A root scope with no enclosing chain (the globals).
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    /// A child scope whose lookups fall through to `enclosing`.
    pub fn with_enclosing(enclosing: Rc<RefCell<Environment<'a>>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind `name` in *this* scope, shadowing any identically‑named binding
    /// here.  Always succeeds.
    pub fn define(&mut self, name: &str, value: Value<'a>) {
        debug!("Defining '{}' = {}", name, value);

        self.values.insert(name.to_string(), value);
    }

    /// Read the nearest binding for `name`, walking the enclosing chain.
    pub fn get(&self, name: &Token<'a>) -> Result<Value<'a>> {
        if let Some(value) = self.values.get(name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Mutate the nearest scope that already defines `name`.  Assignment
    /// never creates a binding.
    pub fn assign(&mut self, name: &Token<'a>, value: Value<'a>) -> Result<()> {
        if self.values.contains_key(name.lexeme) {
            debug!("Assigning '{}' = {}", name.lexeme, value);

            self.values.insert(name.lexeme.to_string(), value);

            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(LoxError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }
}
