//! The tree‑walking evaluator: one match arm per expression variant, one per
//! statement variant.
//!
//! Runtime semantics live here: truthiness, equality, arithmetic coercions,
//! short‑circuit logic, call dispatch, and the environment discipline
//! (innermost declaration wins, assignment mutates in place, blocks restore
//! the previous environment on every exit path).
//!
//! Control flow out of a statement travels on [`Unwind`], which keeps the
//! two channels strictly apart: `Return` is a non‑local transfer absorbed at
//! the nearest function‑call boundary, `Fail` is a genuine runtime error
//! that aborts the rest of the run.  All interpreter state is held in the
//! session object, so independent runs cannot leak into each other.

use std::cell::RefCell;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, LiteralValue, Stmt};
use crate::callable::{self, LoxFunction};
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Why statement execution stopped early.
///
/// `Return` is *not* an error: it unwinds exactly to the enclosing call,
/// which turns it back into an ordinary value.  Only `Fail` ever reaches the
/// caller of [`Interpreter::interpret`].
#[derive(Debug)]
pub enum Unwind<'a> {
    /// A `return` statement in flight; `keyword` pins the source position in
    /// case the unwind escapes top‑level code.
    Return {
        value: Value<'a>,
        keyword: &'a Token<'a>,
    },

    /// Runtime failure, fatal to the current run.
    Fail(LoxError),
}

impl<'a> From<LoxError> for Unwind<'a> {
    fn from(e: LoxError) -> Self {
        Unwind::Fail(e)
    }
}

/// Result alias for statement execution and expression evaluation.
pub type ExecResult<'a, T> = std::result::Result<T, Unwind<'a>>;

/// One interpreter session: the current environment chain plus the output
/// sink `print` writes to.  Generic over the sink so tests can capture
/// output in a buffer.
pub struct Interpreter<'a, W: Write = io::Stdout> {
    environment: Rc<RefCell<Environment<'a>>>,
    out: W,
}

impl<'a> Interpreter<'a, io::Stdout> {
    /// A session printing to stdout, with the native `clock` predefined.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl<'a> Default for Interpreter<'a, io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, W: Write> Interpreter<'a, W> {
    /// A session writing `print` output to `out`.
    pub fn with_output(out: W) -> Self {
        info!("Initializing interpreter session");

        let environment: Rc<RefCell<Environment<'a>>> = Rc::new(RefCell::new(Environment::new()));

        environment
            .borrow_mut()
            .define("clock", Value::Native(Rc::new(callable::clock())));

        Self { environment, out }
    }

    /// Consume the session and hand back the output sink.
    pub fn into_output(self) -> W {
        self.out
    }

    // ───────────────────────── public API ─────────────────────────

    /// Execute a program in source order.  The first runtime failure aborts
    /// the remaining statements; output produced before it stands.
    pub fn interpret(&mut self, statements: &[Stmt<'a>]) -> Result<()> {
        info!("Interpreting {} statements", statements.len());

        for statement in statements {
            match self.execute(statement) {
                Ok(()) => {}

                Err(Unwind::Fail(e)) => return Err(e),

                Err(Unwind::Return { keyword, .. }) => {
                    return Err(LoxError::runtime(
                        keyword,
                        "Cannot return from top-level code.",
                    ));
                }
            }
        }

        info!("Interpretation completed");

        Ok(())
    }

    /// Evaluate a single expression (the `evaluate` subcommand).
    pub fn evaluate_expression(&mut self, expr: &Expr<'a>) -> Result<Value<'a>> {
        match self.evaluate(expr) {
            Ok(value) => Ok(value),
            Err(Unwind::Fail(e)) => Err(e),
            // No function body is executing, so a return cannot be in
            // flight here.
            Err(Unwind::Return { keyword, .. }) => Err(LoxError::runtime(
                keyword,
                "Cannot return from top-level code.",
            )),
        }
    }

    // ──────────────────────── statement execution ─────────────────

    fn execute(&mut self, stmt: &Stmt<'a>) -> ExecResult<'a, ()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value: Value<'a> = self.evaluate(expr)?;

                debug!("print: {}", value);

                writeln!(self.out, "{}", value).map_err(LoxError::from)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value<'a> = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                self.environment.borrow_mut().define(name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => {
                let child: Environment<'a> = Environment::with_enclosing(self.environment.clone());

                self.execute_block(statements, Rc::new(RefCell::new(child)))
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Function(declaration) => {
                debug!("Defining <fn {}>", declaration.name.lexeme);

                // The closure is the environment current *now*, at
                // declaration time.
                let function: LoxFunction<'a> =
                    LoxFunction::new(declaration.clone(), self.environment.clone());

                self.environment
                    .borrow_mut()
                    .define(declaration.name.lexeme, Value::Function(Rc::new(function)));

                Ok(())
            }

            Stmt::Return { keyword, value } => {
                let value: Value<'a> = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("return: {}", value);

                Err(Unwind::Return {
                    value,
                    keyword: *keyword,
                })
            }

            Stmt::Class { name, .. } => Err(Unwind::Fail(LoxError::runtime(
                name,
                "Classes are not yet supported.",
            ))),
        }
    }

    /// Run `statements` inside `environment`, then restore the previous
    /// environment, including when a statement fails or returns.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt<'a>],
        environment: Rc<RefCell<Environment<'a>>>,
    ) -> ExecResult<'a, ()> {
        let previous: Rc<RefCell<Environment<'a>>> =
            mem::replace(&mut self.environment, environment);

        let result: ExecResult<'a, ()> = statements
            .iter()
            .try_for_each(|statement| self.execute(statement));

        self.environment = previous;

        result
    }

    // ──────────────────────── expression evaluation ───────────────

    fn evaluate(&mut self, expr: &Expr<'a>) -> ExecResult<'a, Value<'a>> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),

            Expr::Variable(name) => Ok(self.environment.borrow().get(name)?),

            Expr::Assign { name, value } => {
                let value: Value<'a> = self.evaluate(value)?;

                self.environment.borrow_mut().assign(name, value.clone())?;

                // Assignment is an expression; its value is the assigned one.
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),
        }
    }

    fn evaluate_unary(
        &mut self,
        operator: &Token<'a>,
        right: &Expr<'a>,
    ) -> ExecResult<'a, Value<'a>> {
        let right: Value<'a> = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(LoxError::runtime(operator, "Operand must be a number.").into()),
            },

            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),

            _ => Err(LoxError::runtime(operator, "Invalid unary operator.").into()),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr<'a>,
        operator: &Token<'a>,
        right: &Expr<'a>,
    ) -> ExecResult<'a, Value<'a>> {
        // Operands evaluate left to right, unconditionally.
        let left: Value<'a> = self.evaluate(left)?;
        let right: Value<'a> = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(LoxError::runtime(
                    operator,
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            },

            TokenType::MINUS => {
                let (a, b) = Self::number_operands(operator, left, right)?;

                Ok(Value::Number(a - b))
            }

            TokenType::STAR => {
                let (a, b) = Self::number_operands(operator, left, right)?;

                Ok(Value::Number(a * b))
            }

            TokenType::SLASH => {
                let (a, b) = Self::number_operands(operator, left, right)?;

                if b == 0.0 {
                    return Err(LoxError::runtime(operator, "Division by zero.").into());
                }

                Ok(Value::Number(a / b))
            }

            TokenType::GREATER => {
                let (a, b) = Self::number_operands(operator, left, right)?;

                Ok(Value::Bool(a > b))
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = Self::number_operands(operator, left, right)?;

                Ok(Value::Bool(a >= b))
            }

            TokenType::LESS => {
                let (a, b) = Self::number_operands(operator, left, right)?;

                Ok(Value::Bool(a < b))
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = Self::number_operands(operator, left, right)?;

                Ok(Value::Bool(a <= b))
            }

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left == right)),

            TokenType::BANG_EQUAL => Ok(Value::Bool(left != right)),

            _ => Err(LoxError::runtime(operator, "Invalid binary operator.").into()),
        }
    }

    fn evaluate_logical(
        &mut self,
        left: &Expr<'a>,
        operator: &Token<'a>,
        right: &Expr<'a>,
    ) -> ExecResult<'a, Value<'a>> {
        let left: Value<'a> = self.evaluate(left)?;

        // Short‑circuit: the right operand only runs when the left does not
        // already decide the outcome, and the result is the last operand
        // evaluated, never coerced to a boolean.
        match operator.token_type {
            TokenType::OR if left.is_truthy() => Ok(left),

            TokenType::AND if !left.is_truthy() => Ok(left),

            _ => self.evaluate(right),
        }
    }

    fn evaluate_call(
        &mut self,
        callee: &Expr<'a>,
        paren: &Token<'a>,
        arguments: &[Expr<'a>],
    ) -> ExecResult<'a, Value<'a>> {
        let callee: Value<'a> = self.evaluate(callee)?;

        let mut args: Vec<Value<'a>> = Vec::with_capacity(arguments.len());

        for argument in arguments {
            args.push(self.evaluate(argument)?);
        }

        let arity: usize = match &callee {
            Value::Function(function) => function.arity(),
            Value::Native(native) => native.arity,

            _ => {
                return Err(
                    LoxError::runtime(paren, "Can only call functions and classes.").into(),
                );
            }
        };

        if args.len() != arity {
            return Err(LoxError::runtime(
                paren,
                format!("Expected {} arguments but got {}.", arity, args.len()),
            )
            .into());
        }

        match callee {
            Value::Function(function) => function.call(self, args),

            Value::Native(native) => native
                .call(&args)
                .map_err(|msg| LoxError::runtime(paren, msg).into()),

            _ => unreachable!("checked above"),
        }
    }

    // ────────────────────── runtime type checks ───────────────────

    fn number_operands(
        operator: &Token<'a>,
        left: Value<'a>,
        right: Value<'a>,
    ) -> ExecResult<'a, (f64, f64)> {
        match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok((a, b)),

            _ => Err(LoxError::runtime(operator, "Operands must be numbers.").into()),
        }
    }
}
