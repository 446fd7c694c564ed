#![doc = include_str!("../../../README.md")]
mod ast;
mod classes;
mod context;
mod error;
mod interpreter;
mod operators;
mod parse;
mod prelude;
mod scope;
mod value;

pub use crate::{
    ast::{Block, CodeLoc, Node, NodeKind, Program},
    context::{CallStack, Context, TraceEntry},
    error::{ErrorKind, EvalResult, RuntimeError, Unwind},
    interpreter::{Interpreter, RESERVED_NAMES},
    operators::{CmpOperator, Operator, UnaryOperator},
    parse::{Parse, ParseError},
    prelude::{load_prelude, prelude_path, PreludeError, CHARLYDIR},
    scope::{Scope, ScopeError, Slot, SlotFlags},
    value::{Class, Function, MethodDef, PrimitiveClass, Value, ValueKind},
};
