//! Runtime errors and the non-local exit type threaded through evaluation.

use std::fmt;

use crate::ast::CodeLoc;
use crate::context::{Context, TraceEntry};
use crate::scope::ScopeError;
use crate::value::Value;

/// Classification of runtime failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
pub enum ErrorKind {
    NotDefined,
    AlreadyDefined,
    ReservedName,
    ConstantAssignment,
    NotCallable,
    NotInstantiable,
    ArityMismatch,
    /// A parameter or parent list entry that is not an identifier. These
    /// lists are produced by the parser, so hitting this is an interpreter
    /// bug rather than a user error.
    NotAnIdentifier,
    NotAClass,
    IllegalClassBody,
    NotImplemented,
    UnexpectedNode,
    PreludeMissing,
}

/// A runtime error carrying the offending location, the source path, and a
/// snapshot of the call stack taken when the error was raised.
#[derive(Debug)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: CodeLoc,
    pub path: String,
    pub trace: Vec<TraceEntry>,
}

impl RuntimeError {
    /// Builds an error inside an active evaluation, snapshotting the
    /// context's call stack for rendering.
    pub fn new(kind: ErrorKind, message: impl Into<String>, location: CodeLoc, ctx: &Context) -> Self {
        Self {
            kind,
            message: message.into(),
            location,
            path: ctx.path.to_string(),
            trace: ctx.trace.snapshot(),
        }
    }

    /// Builds an error outside any evaluation (e.g. during prelude
    /// resolution, before a program context exists).
    pub fn bare(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: CodeLoc::default(),
            path: String::new(),
            trace: Vec::new(),
        }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if !self.path.is_empty() {
            write!(f, "\n  --> {}:{}", self.path, self.location)?;
        }
        // most recent call first
        for frame in self.trace.iter().rev() {
            write!(f, "\n  {frame}")?;
        }
        Ok(())
    }
}

impl std::error::Error for RuntimeError {}

/// A non-local exit propagating up the evaluation stack.
///
/// `Return` unwinds to the nearest function frame, `Break` to the nearest
/// loop, and `Error` all the way to `exec_program`.
#[derive(Debug)]
pub enum Unwind {
    Return(Value),
    Break,
    Error(Box<RuntimeError>),
}

impl From<RuntimeError> for Unwind {
    fn from(error: RuntimeError) -> Self {
        Self::Error(Box::new(error))
    }
}

/// Result alias used throughout the evaluator.
pub type EvalResult<T = Value> = Result<T, Unwind>;

/// Maps a scope-level failure onto a located runtime error.
pub(crate) fn scope_error(
    error: ScopeError,
    name: &str,
    location: CodeLoc,
    ctx: &Context,
) -> Unwind {
    let runtime = match error {
        ScopeError::NotDefined => RuntimeError::new(
            ErrorKind::NotDefined,
            format!("{name} is not defined"),
            location,
            ctx,
        ),
        ScopeError::ConstantAssignment => RuntimeError::new(
            ErrorKind::ConstantAssignment,
            format!("cannot assign to the constant {name}"),
            location,
            ctx,
        ),
    };
    runtime.into()
}
