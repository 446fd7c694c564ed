//! Operator tokens, their canonical override-method names, and the built-in
//! semantics used when no override method intercepts the operation.
//!
//! Dispatch is left-operand-driven: the interpreter first looks for an
//! override method (e.g. `__plus`) on the operand's own member scope, then in
//! the operand kind's primitive class, and only then falls through to the
//! tables in this module.

use strum::IntoStaticStr;

use crate::value::{Value, ValueKind};

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum Operator {
    #[strum(serialize = "__plus")]
    Plus,
    #[strum(serialize = "__minus")]
    Minus,
    #[strum(serialize = "__mult")]
    Mult,
    #[strum(serialize = "__divd")]
    Divd,
    #[strum(serialize = "__mod")]
    Mod,
    #[strum(serialize = "__pow")]
    Pow,
}

impl Operator {
    /// The override-method name user code may define to intercept this
    /// operator.
    #[must_use]
    pub fn override_name(self) -> &'static str {
        self.into()
    }
}

/// Comparison operators.
///
/// `!=` has no canonical override name: it is always evaluated as the
/// negation of the built-in `==` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum CmpOperator {
    #[strum(serialize = "__less")]
    Less,
    #[strum(serialize = "__greater")]
    Greater,
    #[strum(serialize = "__lessequal")]
    LessEqual,
    #[strum(serialize = "__greaterequal")]
    GreaterEqual,
    #[strum(serialize = "__equal")]
    Equal,
    NotEqual,
}

impl CmpOperator {
    /// The override-method name for this comparison, if it has one.
    #[must_use]
    pub fn override_name(self) -> Option<&'static str> {
        match self {
            Self::NotEqual => None,
            other => Some(other.into()),
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr)]
pub enum UnaryOperator {
    #[strum(serialize = "__minus")]
    Minus,
    #[strum(serialize = "__not")]
    Not,
}

impl UnaryOperator {
    /// The override-method name user code may define to intercept this
    /// operator.
    #[must_use]
    pub fn override_name(self) -> &'static str {
        self.into()
    }
}

/// Built-in binary arithmetic.
///
/// Numeric rules: `*` short-circuits to 0 when either operand is 0, `/`
/// yields null when either operand is 0, `%` truncates both operands to
/// signed 64-bit integers (null on zero divisor). Strings concatenate with
/// anything via stringification and repeat under `*` with an
/// integer-truncated count. Everything else is NaN.
pub(crate) fn builtin_binary(op: Operator, left: &Value, right: &Value) -> Value {
    match op {
        Operator::Plus => match (&left.kind, &right.kind) {
            (ValueKind::Numeric(l), ValueKind::Numeric(r)) => Value::numeric(l + r),
            (ValueKind::String(l), _) => Value::string(format!("{l}{right}")),
            (_, ValueKind::String(r)) => Value::string(format!("{left}{r}")),
            _ => Value::numeric(f64::NAN),
        },
        Operator::Minus => match (&left.kind, &right.kind) {
            (ValueKind::Numeric(l), ValueKind::Numeric(r)) => Value::numeric(l - r),
            _ => Value::numeric(f64::NAN),
        },
        Operator::Mult => match (&left.kind, &right.kind) {
            (ValueKind::Numeric(l), ValueKind::Numeric(r)) => {
                if *l == 0.0 || *r == 0.0 {
                    Value::numeric(0.0)
                } else {
                    Value::numeric(l * r)
                }
            }
            (ValueKind::String(s), ValueKind::Numeric(n))
            | (ValueKind::Numeric(n), ValueKind::String(s)) => Value::string(repeat_string(s, *n)),
            _ => Value::numeric(f64::NAN),
        },
        Operator::Divd => match (&left.kind, &right.kind) {
            (ValueKind::Numeric(l), ValueKind::Numeric(r)) => {
                if *l == 0.0 || *r == 0.0 {
                    Value::null()
                } else {
                    Value::numeric(l / r)
                }
            }
            _ => Value::numeric(f64::NAN),
        },
        Operator::Mod => match (&left.kind, &right.kind) {
            (ValueKind::Numeric(l), ValueKind::Numeric(r)) => {
                let divisor = *r as i64;
                if divisor == 0 {
                    Value::null()
                } else {
                    Value::numeric(((*l as i64) % divisor) as f64)
                }
            }
            _ => Value::numeric(f64::NAN),
        },
        Operator::Pow => match (&left.kind, &right.kind) {
            (ValueKind::Numeric(l), ValueKind::Numeric(r)) => Value::numeric(l.powf(*r)),
            _ => Value::numeric(f64::NAN),
        },
    }
}

/// Built-in unary semantics: minus negates numerics (NaN otherwise), `!`
/// inverts truthiness of any value.
pub(crate) fn builtin_unary(op: UnaryOperator, operand: &Value) -> Value {
    match op {
        UnaryOperator::Minus => match &operand.kind {
            ValueKind::Numeric(v) => Value::numeric(-v),
            _ => Value::numeric(f64::NAN),
        },
        UnaryOperator::Not => Value::boolean(!operand.is_truthy()),
    }
}

/// Built-in comparison semantics. Always yields a boolean.
pub(crate) fn builtin_compare(op: CmpOperator, left: &Value, right: &Value) -> Value {
    let result = match op {
        CmpOperator::Equal => builtin_equal(left, right),
        CmpOperator::NotEqual => !builtin_equal(left, right),
        ordered => builtin_ordered(ordered, left, right),
    };
    Value::boolean(result)
}

/// The `==` table.
///
/// Null/boolean equality is intentionally asymmetric and kept bit-compatible
/// with the reference behavior: `null == b` holds when `b` is false, while
/// `b == null` holds when `b` is true. The null arms therefore run before the
/// boolean-coercion arms.
fn builtin_equal(left: &Value, right: &Value) -> bool {
    match (&left.kind, &right.kind) {
        (ValueKind::Numeric(l), ValueKind::Numeric(r)) => l == r,
        (ValueKind::Boolean(l), ValueKind::Boolean(r)) => l == r,
        (ValueKind::String(l), ValueKind::String(r)) => l == r,
        (ValueKind::Function(_), ValueKind::Function(_))
        | (ValueKind::Class(_), ValueKind::Class(_))
        | (ValueKind::Object(_), ValueKind::Object(_)) => left.is(right),
        (ValueKind::Null, _) => {
            matches!(&right.kind, ValueKind::Null | ValueKind::Boolean(false))
        }
        (_, ValueKind::Null) => matches!(&left.kind, ValueKind::Boolean(true)),
        (ValueKind::Boolean(l), _) => *l == right.is_truthy(),
        (_, ValueKind::Boolean(r)) => left.is_truthy() == *r,
        _ => false,
    }
}

/// The ordered comparison table (`<`, `>`, `<=`, `>=`).
///
/// Numerics compare as floats (NaN compares false against everything).
/// Strings compare by character count, not lexicographically. Everything
/// else is false.
fn builtin_ordered(op: CmpOperator, left: &Value, right: &Value) -> bool {
    match (&left.kind, &right.kind) {
        (ValueKind::Numeric(l), ValueKind::Numeric(r)) => match op {
            CmpOperator::Less => l < r,
            CmpOperator::Greater => l > r,
            CmpOperator::LessEqual => l <= r,
            CmpOperator::GreaterEqual => l >= r,
            CmpOperator::Equal | CmpOperator::NotEqual => unreachable!("handled by builtin_compare"),
        },
        (ValueKind::String(l), ValueKind::String(r)) => {
            let l = l.chars().count();
            let r = r.chars().count();
            match op {
                CmpOperator::Less => l < r,
                CmpOperator::Greater => l > r,
                CmpOperator::LessEqual => l <= r,
                CmpOperator::GreaterEqual => l >= r,
                CmpOperator::Equal | CmpOperator::NotEqual => {
                    unreachable!("handled by builtin_compare")
                }
            }
        }
        _ => false,
    }
}

/// Repeats a string with a float count, truncating toward zero. Negative and
/// NaN counts repeat zero times.
fn repeat_string(s: &str, count: f64) -> String {
    if count.is_nan() || count <= 0.0 {
        return String::new();
    }
    s.repeat(count as usize)
}
