//! Abrupt completions and host-facing errors.
//!
//! Evaluation returns [`Eval<T>`]. Everything that leaves a node other than
//! a normal value travels in [`Abrupt`]: JavaScript exceptions, `return`,
//! `break`/`continue`, the suspend signal of `yield`/`await`, cancellation
//! and internal errors. Only `Throw` can be caught by user code.

use core_types::{ErrorKind, InternalError, JsString, Value};
use thiserror::Error;

use crate::config::ConfigError;

/// Result of evaluating a node.
pub type Eval<T> = Result<T, Abrupt>;

/// Non-normal completion of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum Abrupt {
    /// JavaScript exception
    Throw(Value),
    /// `return` statement (or injected by `generator.return()`)
    Return(Value),
    /// `break`, optionally labeled
    Break(Option<JsString>),
    /// `continue`, optionally labeled
    Continue(Option<JsString>),
    /// A `yield` or `await` suspended the running coroutine. Every node on
    /// the way out has saved its resume state.
    Suspend,
    /// The cancellation token fired. Not catchable, skips `finally`.
    Cancelled,
    /// Engine invariant violation. Not catchable, skips `finally`.
    Fatal(InternalError),
}

impl Abrupt {
    /// Whether `finally` blocks run while this completion unwinds.
    pub fn runs_finally(&self) -> bool {
        !matches!(self, Abrupt::Suspend | Abrupt::Cancelled | Abrupt::Fatal(_))
    }

    pub(crate) fn fatal(message: impl Into<String>) -> Self {
        Abrupt::Fatal(InternalError::new(message))
    }
}

impl From<InternalError> for Abrupt {
    fn from(error: InternalError) -> Self {
        Abrupt::Fatal(error)
    }
}

/// Completion injected into a suspended coroutine.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// `next(value)` or a fulfilled await
    Normal(Value),
    /// `return(value)`
    Return(Value),
    /// `throw(value)` or a rejected await
    Throw(Value),
}

impl Completion {
    /// Turn the completion into the result of the suspended expression.
    pub fn into_eval(self) -> Eval<Value> {
        match self {
            Completion::Normal(value) => Ok(value),
            Completion::Return(value) => Err(Abrupt::Return(value)),
            Completion::Throw(value) => Err(Abrupt::Throw(value)),
        }
    }
}

/// Error reported to the embedder.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A JavaScript exception escaped to the host
    #[error("Uncaught {kind}: {message}")]
    Uncaught {
        /// Error kind, `Error` for thrown non-error values
        kind: ErrorKind,
        /// The error message, or the thrown value converted to a string
        message: String,
    },
    /// Engine bug
    #[error(transparent)]
    Internal(#[from] InternalError),
    /// Execution was cancelled through the cancellation token
    #[error("execution cancelled")]
    Cancelled,
    /// Invalid engine configuration
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    /// Error kind of an uncaught exception.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            EngineError::Uncaught { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
