//! Error taxonomy for the compile/evaluate pipeline.
//!
//! Manual `Display`/`Error` impls rather than `thiserror`: compile-time
//! failures are one of [`CompileError`]'s variants, runtime numeric
//! failures are [`MathError`], and asking for a non-boolean result as a
//! boolean is [`EvalError`]. [`Error`] unifies all three behind `?`.

use std::fmt::{Display, Formatter};

/// A compile-time failure: malformed source text or a word-replacement
/// arity mismatch.
#[derive(Debug, Clone, PartialEq)]
pub enum CompileError {
    /// Unterminated string, bad adjacency, unbalanced brackets, unknown
    /// identifier used as a function, too few arguments, etc.
    Syntax(String),
    /// `ReplaceExprWord` was asked to swap in a word whose arity disagrees
    /// with the word it replaces.
    Arity { expected: u8, found: u8 },
}

impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::Syntax(message) => write!(f, "SyntaxError: {}", message),
            CompileError::Arity { expected, found } => write!(
                f,
                "ArityError: replacement word takes {} argument(s), expected {}",
                found, expected
            ),
        }
    }
}

impl std::error::Error for CompileError {}

/// A runtime numeric failure from a builtin kernel: divide-by-zero, a
/// domain error, or overflow. Propagates unchanged through folding and
/// evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum MathError {
    DivisionByZero,
    Domain(String),
    Overflow,
}

impl Display for MathError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MathError::DivisionByZero => write!(f, "MathError: division by zero"),
            MathError::Domain(message) => write!(f, "MathError: {}", message),
            MathError::Overflow => write!(f, "MathError: overflow"),
        }
    }
}

impl std::error::Error for MathError {}

/// Raised by `as_boolean` when the compiled program's terminal word is not
/// boolean-typed.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalError {
    pub message: String,
}

impl EvalError {
    pub fn not_boolean() -> Self {
        Self {
            message: "expression does not evaluate to a boolean result".into(),
        }
    }
}

impl Display for EvalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "EvalError: {}", self.message)
    }
}

impl std::error::Error for EvalError {}

/// Unified error type returned by the public façade.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Compile(CompileError),
    Math(MathError),
    Eval(EvalError),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Compile(e) => Display::fmt(e, f),
            Error::Math(e) => Display::fmt(e, f),
            Error::Eval(e) => Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Error {}

impl From<CompileError> for Error {
    fn from(e: CompileError) -> Self {
        Error::Compile(e)
    }
}
impl From<MathError> for Error {
    fn from(e: MathError) -> Self {
        Error::Math(e)
    }
}
impl From<EvalError> for Error {
    fn from(e: EvalError) -> Self {
        Error::Eval(e)
    }
}
