//! Per-program execution context and call-stack tracing.
//!
//! A [`Context`] travels through every evaluation step: it names the source
//! file being executed and shares the interpreter's call stack, so errors
//! raised deep inside nested calls can render the frames that were active
//! when they happened.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::CodeLoc;
use crate::scope::Scope;

/// One frame of the call stack: who was called, from where, and with which
/// local scope.
#[derive(Debug, Clone)]
pub struct TraceEntry {
    /// The call-site name: the identifier or member name the call was made
    /// through.
    pub name: String,
    pub location: CodeLoc,
    pub path: Rc<str>,
    /// The scope the call executes in. Kept for introspection; rendering
    /// only uses the name and position.
    pub scope: Scope,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {} ({}:{})", self.name, self.path, self.location)
    }
}

/// The shared call stack. Frames are pushed on call entry and popped on every
/// exit path; errors snapshot the stack at construction time instead of
/// relying on frames surviving the unwind.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    frames: Rc<RefCell<Vec<TraceEntry>>>,
}

impl CallStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: TraceEntry) {
        self.frames.borrow_mut().push(entry);
    }

    pub fn pop(&self) -> Option<TraceEntry> {
        self.frames.borrow_mut().pop()
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Copies the live frames, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TraceEntry> {
        self.frames.borrow().clone()
    }
}

/// Execution context for one program: its source path plus the shared call
/// stack. Cheap to clone; cloned per call frame.
#[derive(Debug, Clone)]
pub struct Context {
    pub path: Rc<str>,
    pub trace: CallStack,
}

impl Context {
    #[must_use]
    pub fn new(path: &str, trace: CallStack) -> Self {
        Self {
            path: Rc::from(path),
            trace,
        }
    }
}
