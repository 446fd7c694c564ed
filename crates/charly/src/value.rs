//! Runtime values.
//!
//! [`Value`] pairs a tagged payload with a member scope. The member scope is
//! what makes Charly values prototype-ish: user code can attach members to
//! anything, including numbers, and the prelude installs primitive method
//! tables the same way. Cloning a value copies the payload tag and shares the
//! member scope, which gives the language its reference semantics.

use std::cell::RefCell;
use std::fmt::{self, Write};
use std::rc::Rc;

use ahash::AHashSet;

use crate::ast::Block;
use crate::scope::Scope;

/// A runtime value: a payload plus its member scope.
#[derive(Clone)]
pub struct Value {
    pub kind: ValueKind,
    /// The value's own members. Never detached; every value owns one.
    pub data: Scope,
}

impl PartialEq for Value {
    /// Rust-level identity check used by test assertions; this is distinct
    /// from Charly's own `==` semantics, which live in `operators::builtin_equal`.
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.data == other.data
    }
}

impl PartialEq for ValueKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Numeric(a), Self::Numeric(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b),
            (Self::Function(a), Self::Function(b)) => Rc::ptr_eq(a, b),
            (Self::Class(a), Self::Class(b)) => Rc::ptr_eq(a, b),
            (Self::PrimitiveClass(a), Self::PrimitiveClass(b)) => Rc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// The payload of a value.
#[derive(Clone)]
pub enum ValueKind {
    Null,
    Boolean(bool),
    Numeric(f64),
    String(String),
    Array(Rc<RefCell<Vec<Value>>>),
    Function(Rc<Function>),
    Class(Rc<Class>),
    PrimitiveClass(Rc<PrimitiveClass>),
    /// An instance; the payload is the class it was constructed from, the
    /// members live in the value's data scope.
    Object(Rc<Class>),
}

/// A closure: parameter names, a body block, and the scope that was active
/// at definition time. The captured scope is shared, so sibling closures
/// observe each other's writes.
#[derive(Debug)]
pub struct Function {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Rc<Block>,
    pub scope: Scope,
}

/// A user class descriptor. Methods stay unevaluated until an object is
/// constructed from the class; each instantiation closes them over the
/// owning class's captured scope.
#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub properties: Vec<String>,
    pub methods: Vec<MethodDef>,
    /// Parent classes in declaration order. Later parents take method
    /// precedence over earlier ones.
    pub parents: Vec<Rc<Class>>,
    pub scope: Scope,
}

/// An unevaluated method literal collected from a class body.
#[derive(Debug, Clone)]
pub struct MethodDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<Block>,
}

/// A built-in kind's method table. The methods live in the carrying value's
/// data scope; this payload records the name and defining scope.
#[derive(Debug)]
pub struct PrimitiveClass {
    pub name: String,
    pub scope: Scope,
}

impl Value {
    fn with_kind(kind: ValueKind) -> Self {
        Self {
            kind,
            data: Scope::new(),
        }
    }

    #[must_use]
    pub fn null() -> Self {
        Self::with_kind(ValueKind::Null)
    }

    #[must_use]
    pub fn boolean(value: bool) -> Self {
        Self::with_kind(ValueKind::Boolean(value))
    }

    #[must_use]
    pub fn numeric(value: f64) -> Self {
        Self::with_kind(ValueKind::Numeric(value))
    }

    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::with_kind(ValueKind::String(value.into()))
    }

    #[must_use]
    pub fn array(items: Vec<Self>) -> Self {
        Self::with_kind(ValueKind::Array(Rc::new(RefCell::new(items))))
    }

    #[must_use]
    pub fn function(function: Function) -> Self {
        Self::with_kind(ValueKind::Function(Rc::new(function)))
    }

    /// Wraps a class descriptor, attaching `data` as its member scope.
    #[must_use]
    pub fn class(class: Class, data: Scope) -> Self {
        Self {
            kind: ValueKind::Class(Rc::new(class)),
            data,
        }
    }

    /// Wraps a primitive class descriptor, attaching `data` as its method
    /// table.
    #[must_use]
    pub fn primitive_class(primitive: PrimitiveClass, data: Scope) -> Self {
        Self {
            kind: ValueKind::PrimitiveClass(Rc::new(primitive)),
            data,
        }
    }

    /// Creates an instance of `class` whose members live in `data`.
    #[must_use]
    pub fn object(class: Rc<Class>, data: Scope) -> Self {
        Self {
            kind: ValueKind::Object(class),
            data,
        }
    }

    /// Truthiness: false for null and `false`, true for everything else
    /// (including zero and empty strings).
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        !matches!(self.kind, ValueKind::Null | ValueKind::Boolean(false))
    }

    /// The kind name used in diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            ValueKind::Null => "Null",
            ValueKind::Boolean(_) => "Boolean",
            ValueKind::Numeric(_) => "Numeric",
            ValueKind::String(_) => "String",
            ValueKind::Array(_) => "Array",
            ValueKind::Function(_) => "Function",
            ValueKind::Class(_) => "Class",
            ValueKind::PrimitiveClass(_) => "PrimitiveClass",
            ValueKind::Object(_) => "Object",
        }
    }

    /// The scope-visible primitive class name for this value's kind, used as
    /// the fallback lookup for operator and member dispatch. Objects and
    /// primitive classes themselves have no fallback table.
    #[must_use]
    pub fn primitive_class_name(&self) -> Option<&'static str> {
        match &self.kind {
            ValueKind::Null => Some("Null"),
            ValueKind::Boolean(_) => Some("Boolean"),
            ValueKind::Numeric(_) => Some("Numeric"),
            ValueKind::String(_) => Some("String"),
            ValueKind::Array(_) => Some("Array"),
            ValueKind::Function(_) => Some("Function"),
            ValueKind::Class(_) => Some("Class"),
            ValueKind::PrimitiveClass(_) | ValueKind::Object(_) => None,
        }
    }

    /// Identity comparison for the kinds that compare by identity:
    /// functions and classes by descriptor, objects by member scope.
    #[must_use]
    pub fn is(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (ValueKind::Function(a), ValueKind::Function(b)) => Rc::ptr_eq(a, b),
            (ValueKind::Class(a), ValueKind::Class(b)) => Rc::ptr_eq(a, b),
            (ValueKind::Object(_), ValueKind::Object(_)) => self.data.same(&other.data),
            _ => false,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self.kind, ValueKind::Null)
    }

    #[must_use]
    pub fn as_boolean(&self) -> Option<bool> {
        match &self.kind {
            ValueKind::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_numeric(&self) -> Option<f64> {
        match &self.kind {
            ValueKind::Numeric(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_string(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::String(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<Rc<RefCell<Vec<Self>>>> {
        match &self.kind {
            ValueKind::Array(items) => Some(items.clone()),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_function(&self) -> Option<Rc<Function>> {
        match &self.kind {
            ValueKind::Function(f) => Some(f.clone()),
            _ => None,
        }
    }

    fn render(&self, out: &mut String, seen: &mut AHashSet<usize>) -> fmt::Result {
        match &self.kind {
            ValueKind::Null => out.write_str("null"),
            ValueKind::Boolean(true) => out.write_str("true"),
            ValueKind::Boolean(false) => out.write_str("false"),
            ValueKind::Numeric(v) => render_numeric(*v, out),
            ValueKind::String(s) => out.write_str(s),
            ValueKind::Array(items) => {
                let id = Rc::as_ptr(items) as usize;
                if !seen.insert(id) {
                    return out.write_str("[...]");
                }
                out.write_char('[')?;
                for (index, item) in items.borrow().iter().enumerate() {
                    if index > 0 {
                        out.write_str(", ")?;
                    }
                    item.render(out, seen)?;
                }
                seen.remove(&id);
                out.write_char(']')
            }
            ValueKind::Function(f) => match &f.name {
                Some(name) => write!(out, "<function {name}>"),
                None => out.write_str("<function>"),
            },
            ValueKind::Class(c) => write!(out, "<class {}>", c.name),
            ValueKind::PrimitiveClass(p) => write!(out, "<primitive {}>", p.name),
            ValueKind::Object(c) => write!(out, "<object {}>", c.name),
        }
    }
}

/// Integral finite numerics render without a fractional part; NaN renders as
/// `NaN`; everything else uses the default float formatting.
fn render_numeric(value: f64, out: &mut String) -> fmt::Result {
    if value.is_nan() {
        out.write_str("NaN")
    } else if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e15 {
        write!(out, "{}", value as i64)
    } else {
        write!(out, "{value}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        let mut seen = AHashSet::new();
        self.render(&mut out, &mut seen)?;
        f.write_str(&out)
    }
}

// Values can reach themselves through member scopes and captured closures,
// so Debug stays shallow: payload only, no data scope.
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ValueKind::Null => f.write_str("Null"),
            ValueKind::Boolean(v) => write!(f, "Boolean({v})"),
            ValueKind::Numeric(v) => write!(f, "Numeric({v})"),
            ValueKind::String(v) => write!(f, "String({v:?})"),
            ValueKind::Array(items) => write!(f, "Array(len={})", items.borrow().len()),
            ValueKind::Function(func) => write!(f, "Function({:?})", func.name),
            ValueKind::Class(c) => write!(f, "Class({})", c.name),
            ValueKind::PrimitiveClass(p) => write!(f, "PrimitiveClass({})", p.name),
            ValueKind::Object(c) => write!(f, "Object({})", c.name),
        }
    }
}
