//! Error taxonomy of the expression engine.
//!
//! Parse errors are raised synchronously before an expression is stored.
//! Task errors describe rejected lifecycle transitions and are never fatal:
//! callers log them and move on.

use thiserror::Error;

/// Rejection of malformed expression text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expression is empty")]
    Empty,

    #[error("expression contains invalid character at position {position}: {character}")]
    InvalidCharacter { position: usize, character: char },

    #[error("expression contains invalid number at position {position}")]
    MalformedNumber { position: usize },

    #[error("unexpected whitespace at position {position}")]
    UnexpectedWhitespace { position: usize },

    #[error("invalid number literal: {0}")]
    InvalidNumber(String),

    #[error("unbalanced brackets: {0}")]
    UnbalancedBrackets(&'static str),

    #[error("invalid operator placement: {0}")]
    InvalidOperatorPlacement(&'static str),
}

/// Arithmetic that cannot produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ComputeError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NonFinite,
}

/// Invalid transition of a task lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("task is already completed")]
    AlreadyCompleted,

    #[error("task is already canceled")]
    AlreadyCanceled,

    #[error("task is completed and cannot be canceled")]
    CannotCancelCompleted,

    #[error("expression of the task has already failed")]
    ExpressionFailed,
}

/// Errors surfaced by local evaluation and result reads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalcError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compute(#[from] ComputeError),

    #[error("expression is not evaluated")]
    NotEvaluated,
}
