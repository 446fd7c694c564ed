//! Prelude loading lifecycle.
//!
//! The prelude is ordinary Charly source executed against the top scope when
//! an interpreter is constructed. It installs the primitive method tables and
//! whatever else the standard library seeds. Its location is resolved from
//! the `CHARLYDIR` environment variable; any failure along the way aborts
//! interpreter construction.

use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::error::{ErrorKind, RuntimeError};
use crate::interpreter::Interpreter;
use crate::parse::{Parse, ParseError};
use crate::value::Value;

/// Environment variable naming the Charly installation directory.
pub const CHARLYDIR: &str = "CHARLYDIR";

/// Prelude location relative to `$CHARLYDIR`.
const PRELUDE_RELATIVE_PATH: &str = "src/std/prelude.charly";

/// Why prelude loading failed.
#[derive(Debug)]
pub enum PreludeError {
    /// The prelude file could not be resolved or read.
    Io(io::Error),
    /// The prelude source did not parse.
    Parse(ParseError),
    /// `CHARLYDIR` was unset, or executing the prelude failed.
    Runtime(Box<RuntimeError>),
}

impl fmt::Display for PreludeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot read prelude: {e}"),
            Self::Parse(e) => write!(f, "cannot parse prelude: {e}"),
            Self::Runtime(e) => write!(f, "prelude failed: {e}"),
        }
    }
}

impl std::error::Error for PreludeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Runtime(e) => Some(e.as_ref()),
        }
    }
}

impl From<io::Error> for PreludeError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<ParseError> for PreludeError {
    fn from(error: ParseError) -> Self {
        Self::Parse(error)
    }
}

impl From<Box<RuntimeError>> for PreludeError {
    fn from(error: Box<RuntimeError>) -> Self {
        Self::Runtime(error)
    }
}

/// Resolves the canonical prelude path from `$CHARLYDIR`.
pub fn prelude_path() -> Result<PathBuf, PreludeError> {
    let base = std::env::var(CHARLYDIR).map_err(|_| {
        PreludeError::Runtime(Box::new(RuntimeError::bare(
            ErrorKind::PreludeMissing,
            format!("{CHARLYDIR} is not set, cannot locate the prelude"),
        )))
    })?;
    let path = PathBuf::from(base).join(PRELUDE_RELATIVE_PATH);
    Ok(path.canonicalize()?)
}

/// Reads, parses and executes the prelude against the interpreter's top
/// scope. Returns the prelude program's result value.
pub fn load_prelude(interpreter: &mut Interpreter, parser: &dyn Parse) -> Result<Value, PreludeError> {
    let path = prelude_path()?;
    let source = fs::read_to_string(&path)?;
    let program = parser.parse(&path.to_string_lossy(), &source)?;
    let top = interpreter.top_scope().clone();
    Ok(interpreter.exec_program(&program, &top)?)
}
