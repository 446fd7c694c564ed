//! Interface to the parser collaborator.
//!
//! The evaluator never tokenizes source text itself. The only moment it needs
//! a parser is prelude loading, so the parser arrives as an injected
//! dependency of [`crate::Interpreter::new`]. Closures with the right shape
//! implement [`Parse`] directly, which keeps test stubs one line long.

use std::fmt;

use crate::ast::{CodeLoc, Program};

/// A syntax error reported by the parser collaborator.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub location: CodeLoc,
}

impl ParseError {
    pub fn new(message: impl Into<String>, location: CodeLoc) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "syntax error at {}: {}", self.location, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Anything that can turn Charly source text into a parsed program.
pub trait Parse {
    fn parse(&self, path: &str, source: &str) -> Result<Program, ParseError>;
}

impl<F> Parse for F
where
    F: Fn(&str, &str) -> Result<Program, ParseError>,
{
    fn parse(&self, path: &str, source: &str) -> Result<Program, ParseError> {
        self(path, source)
    }
}
