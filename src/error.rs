//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, runtime, CLI) must convert their internal
//! failure modes into one of the variants defined here.  This enables a
//! uniform `Result<T>` alias throughout the crate and ergonomic
//! inter‑operation with `anyhow`, while still preserving rich diagnostic
//! detail.
//!
//! The `Display` output of each variant is the externally observable
//! diagnostic contract:
//!
//! * lexical: `[line N] Error: message`
//! * syntax:  `[line N] Error at 'lexeme': message` (or `at end`)
//! * runtime: `message` followed by `[line N]` on the next line
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.  `location` is `at 'lexeme'` for a concrete
    /// token, `at end` when the parser ran off the token stream.
    #[error("[line {line}] Error {location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error, carrying the offending token's line.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.  Derives the location
    /// qualifier from the token the parser was looking at.
    pub fn parse<S: Into<String>>(token: &Token<'_>, msg: S) -> Self {
        let message: String = msg.into();

        let location: String = if matches!(token.token_type, TokenType::EOF) {
            "at end".to_string()
        } else {
            format!("at '{}'", token.lexeme)
        };

        info!(
            "Creating Parse error: line={}, {}, msg={}",
            token.line, location, message
        );

        LoxError::Parse {
            message,
            location,
            line: token.line,
        }
    }

    /// Helper constructor for the **evaluator**.
    pub fn runtime<S: Into<String>>(token: &Token<'_>, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Runtime error: line={}, msg={}",
            token.line, message
        );

        LoxError::Runtime {
            message,
            line: token.line,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
