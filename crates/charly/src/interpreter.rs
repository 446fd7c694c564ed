//! The recursive evaluator.
//!
//! One dispatch function walks the AST; statements, operators and calls all
//! funnel through it. Control flow (`return`, `break`, runtime errors) is
//! threaded as the `Err` side of [`EvalResult`], so `?` propagates a
//! non-local exit exactly as far as the construct that catches it: function
//! frames catch `Return`, loops catch `Break`, and [`Interpreter::exec_program`]
//! catches everything else.

use std::rc::Rc;

use crate::ast::{CodeLoc, Node, NodeKind, Program};
use crate::context::{CallStack, Context, TraceEntry};
use crate::error::{scope_error, ErrorKind, EvalResult, RuntimeError, Unwind};
use crate::operators::{self, CmpOperator, Operator, UnaryOperator};
use crate::parse::Parse;
use crate::prelude::{load_prelude, PreludeError};
use crate::scope::{Scope, SlotFlags};
use crate::value::{Function, Value, ValueKind};

/// Names user code may not declare or assign. `self` is bound by the call
/// protocol whenever a function is invoked through a member access.
pub const RESERVED_NAMES: &[&str] = &["self"];

pub(crate) const SELF_NAME: &str = "self";

fn is_reserved(name: &str) -> bool {
    RESERVED_NAMES.contains(&name)
}

/// The tree-walking evaluator. Owns the top scope and the call stack.
pub struct Interpreter {
    pub(crate) top: Scope,
    pub(crate) trace: CallStack,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::without_prelude()
    }
}

impl Interpreter {
    /// Creates an interpreter with an empty top scope and no prelude. The
    /// entry point for tests and for hosts that seed the top scope
    /// themselves.
    #[must_use]
    pub fn without_prelude() -> Self {
        Self {
            top: Scope::new(),
            trace: CallStack::new(),
        }
    }

    /// Creates an interpreter and executes the prelude against its top
    /// scope. The parser is only used for this one load.
    ///
    /// # Errors
    /// Fails if `CHARLYDIR` is unset, the prelude file is unreadable, or the
    /// prelude does not parse or run.
    pub fn new(parser: &dyn Parse) -> Result<Self, PreludeError> {
        let mut interpreter = Self::without_prelude();
        load_prelude(&mut interpreter, parser)?;
        Ok(interpreter)
    }

    #[must_use]
    pub fn top_scope(&self) -> &Scope {
        &self.top
    }

    #[must_use]
    pub fn trace(&self) -> &CallStack {
        &self.trace
    }

    /// Executes a program against the given scope and returns its result
    /// value (the last top-level statement's value).
    ///
    /// A `return` escaping to the top level yields its value as the program
    /// result; a stray `break` yields null.
    pub fn exec_program(&mut self, program: &Program, scope: &Scope) -> Result<Value, Box<RuntimeError>> {
        let ctx = Context::new(&program.path, self.trace.clone());
        match self.exec_block(&program.tree, scope, &ctx) {
            Ok(value) => Ok(value),
            Err(Unwind::Return(value)) => Ok(value),
            Err(Unwind::Break) => Ok(Value::null()),
            Err(Unwind::Error(error)) => Err(error),
        }
    }

    /// Evaluates a single node. Already-evaluated values pass through
    /// unchanged.
    pub fn eval(&mut self, node: &Node, scope: &Scope, ctx: &Context) -> EvalResult {
        match &node.kind {
            NodeKind::Value(value) => Ok(value.clone()),

            NodeKind::NullLiteral => Ok(Value::null()),
            NodeKind::NanLiteral => Ok(Value::numeric(f64::NAN)),
            NodeKind::BooleanLiteral(value) => Ok(Value::boolean(*value)),
            NodeKind::NumericLiteral(raw) => Ok(Value::numeric(raw.parse().unwrap_or(f64::NAN))),
            NodeKind::StringLiteral(value) => Ok(Value::string(value.clone())),
            NodeKind::ArrayLiteral(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item, scope, ctx)?);
                }
                Ok(Value::array(values))
            }

            NodeKind::Identifier(name) => scope
                .get(name, SlotFlags::empty())
                .map_err(|e| scope_error(e, name, node.location, ctx)),

            NodeKind::FunctionLiteral { name, params, body } => {
                let params = self.identifier_names(params, ctx)?;
                Ok(Value::function(Function {
                    name: name.clone(),
                    params,
                    body: Rc::new(body.clone()),
                    scope: scope.clone(),
                }))
            }
            NodeKind::ClassLiteral { name, parents, body } => {
                self.eval_class_literal(name, parents, body, scope, ctx)
            }
            NodeKind::PrimitiveClassLiteral { name, body } => {
                self.eval_primitive_class_literal(name, body, node.location, scope, ctx)
            }

            NodeKind::VariableInitialisation { name, value } => {
                self.exec_initialisation(node, name, value, false, scope, ctx)
            }
            NodeKind::ConstantInitialisation { name, value } => {
                self.exec_initialisation(node, name, value, true, scope, ctx)
            }
            NodeKind::VariableAssignment { target, value } => {
                self.exec_assignment(target, value, scope, ctx)
            }

            NodeKind::UnaryExpression { operator, right } => {
                self.eval_unary(node, *operator, right, scope, ctx)
            }
            NodeKind::BinaryExpression { operator, left, right } => {
                self.eval_binary(node, *operator, left, right, scope, ctx)
            }
            NodeKind::ComparisonExpression { operator, left, right } => {
                self.eval_comparison(node, *operator, left, right, scope, ctx)
            }

            NodeKind::CallExpression { callee, args } => {
                self.exec_call(node, callee, args, scope, ctx)
            }
            NodeKind::MemberExpression { object, member } => {
                let (_, value) = self.eval_member_pair(object, member, scope, ctx)?;
                Ok(value)
            }

            NodeKind::ReturnStatement(expression) => {
                let value = match expression {
                    Some(expression) => self.eval(expression, scope, ctx)?,
                    None => Value::null(),
                };
                Err(Unwind::Return(value))
            }
            NodeKind::BreakStatement => Err(Unwind::Break),

            NodeKind::IfStatement { test, consequent, alternate } => {
                let test = self.eval(test, scope, ctx)?;
                let child = scope.child();
                if test.is_truthy() {
                    self.exec_block(consequent, &child, ctx)
                } else if let Some(alternate) = alternate {
                    self.eval(alternate, &child, ctx)
                } else {
                    Ok(Value::null())
                }
            }
            NodeKind::WhileStatement { test, consequent } => {
                let child = scope.child();
                let mut result = Value::null();
                loop {
                    let test = self.eval(test, &child, ctx)?;
                    if !test.is_truthy() {
                        break;
                    }
                    match self.exec_block(consequent, &child, ctx) {
                        Ok(value) => result = value,
                        Err(Unwind::Break) => break,
                        Err(other) => return Err(other),
                    }
                }
                Ok(result)
            }

            NodeKind::And { left, right } => {
                let left = self.eval(left, scope, ctx)?;
                if !left.is_truthy() {
                    return Ok(Value::boolean(false));
                }
                let right = self.eval(right, scope, ctx)?;
                Ok(Value::boolean(right.is_truthy()))
            }
            NodeKind::Or { left, right } => {
                let left = self.eval(left, scope, ctx)?;
                if left.is_truthy() {
                    return Ok(Value::boolean(true));
                }
                let right = self.eval(right, scope, ctx)?;
                Ok(Value::boolean(right.is_truthy()))
            }

            NodeKind::Block(block) => self.exec_block(block, scope, ctx),

            NodeKind::IndexExpression { .. } | NodeKind::PropertyDeclaration(_) => Err(self.raise(
                ErrorKind::UnexpectedNode,
                node.location,
                ctx,
                "node is not valid in this position",
            )),
        }
    }

    /// Executes statements in order; the result is the last statement's
    /// value, or null for an empty block.
    pub(crate) fn exec_block(&mut self, block: &[Node], scope: &Scope, ctx: &Context) -> EvalResult {
        let mut result = Value::null();
        for node in block {
            result = self.eval(node, scope, ctx)?;
        }
        Ok(result)
    }

    fn exec_initialisation(
        &mut self,
        node: &Node,
        name: &str,
        value_node: &Node,
        constant: bool,
        scope: &Scope,
        ctx: &Context,
    ) -> EvalResult {
        if is_reserved(name) {
            return Err(self.raise(
                ErrorKind::ReservedName,
                node.location,
                ctx,
                format!("{name} is a reserved name"),
            ));
        }
        if scope.contains(name, SlotFlags::IGNORE_PARENT) {
            return Err(self.raise(
                ErrorKind::AlreadyDefined,
                node.location,
                ctx,
                format!("{name} is already defined in this scope"),
            ));
        }
        let value = self.eval(value_node, scope, ctx)?;
        let mut flags = SlotFlags::INIT;
        if constant {
            flags |= SlotFlags::CONSTANT;
        }
        scope
            .write(name, value.clone(), flags)
            .map_err(|e| scope_error(e, name, node.location, ctx))?;
        Ok(value)
    }

    fn exec_assignment(
        &mut self,
        target: &Node,
        value_node: &Node,
        scope: &Scope,
        ctx: &Context,
    ) -> EvalResult {
        match &target.kind {
            NodeKind::Identifier(name) => {
                if is_reserved(name) {
                    return Err(self.raise(
                        ErrorKind::ReservedName,
                        target.location,
                        ctx,
                        format!("{name} is a reserved name"),
                    ));
                }
                if !scope.defined(name) {
                    return Err(self.raise(
                        ErrorKind::NotDefined,
                        target.location,
                        ctx,
                        format!("{name} is not defined"),
                    ));
                }
                let value = self.eval(value_node, scope, ctx)?;
                scope
                    .write(name, value.clone(), SlotFlags::empty())
                    .map_err(|e| scope_error(e, name, target.location, ctx))?;
                Ok(value)
            }
            NodeKind::MemberExpression { object, member } => {
                let base = self.eval(object, scope, ctx)?;
                let value = self.eval(value_node, scope, ctx)?;
                let flags = if base.data.contains(member, SlotFlags::IGNORE_PARENT) {
                    SlotFlags::empty()
                } else {
                    SlotFlags::INIT
                };
                base.data
                    .write(member, value.clone(), flags)
                    .map_err(|e| scope_error(e, member, target.location, ctx))?;
                Ok(value)
            }
            NodeKind::IndexExpression { .. } => Err(self.raise(
                ErrorKind::NotImplemented,
                target.location,
                ctx,
                "index assignment is not implemented",
            )),
            _ => Err(self.raise(
                ErrorKind::UnexpectedNode,
                target.location,
                ctx,
                "unsupported assignment target",
            )),
        }
    }

    fn eval_unary(
        &mut self,
        node: &Node,
        operator: UnaryOperator,
        right: &Node,
        scope: &Scope,
        ctx: &Context,
    ) -> EvalResult {
        let operand = self.eval(right, scope, ctx)?;
        let name = operator.override_name();
        if let Some(method) = self.operator_override(&operand, name, scope) {
            return self.call_function(&method, Some(&operand), &[], name, node.location, ctx);
        }
        Ok(operators::builtin_unary(operator, &operand))
    }

    fn eval_binary(
        &mut self,
        node: &Node,
        operator: Operator,
        left: &Node,
        right: &Node,
        scope: &Scope,
        ctx: &Context,
    ) -> EvalResult {
        let left = self.eval(left, scope, ctx)?;
        let right = self.eval(right, scope, ctx)?;
        let name = operator.override_name();
        if let Some(method) = self.operator_override(&left, name, scope) {
            return self.call_function(
                &method,
                Some(&left),
                std::slice::from_ref(&right),
                name,
                node.location,
                ctx,
            );
        }
        Ok(operators::builtin_binary(operator, &left, &right))
    }

    fn eval_comparison(
        &mut self,
        node: &Node,
        operator: CmpOperator,
        left: &Node,
        right: &Node,
        scope: &Scope,
        ctx: &Context,
    ) -> EvalResult {
        let left = self.eval(left, scope, ctx)?;
        let right = self.eval(right, scope, ctx)?;
        if let Some(name) = operator.override_name() {
            if let Some(method) = self.operator_override(&left, name, scope) {
                return self.call_function(
                    &method,
                    Some(&left),
                    std::slice::from_ref(&right),
                    name,
                    node.location,
                    ctx,
                );
            }
        }
        Ok(operators::builtin_compare(operator, &left, &right))
    }

    /// Looks up an operator override for `operand`: first on its own member
    /// scope, then in its kind's primitive class. Only functions count.
    fn operator_override(&self, operand: &Value, name: &str, scope: &Scope) -> Option<Rc<Function>> {
        if let Ok(value) = operand.data.get(name, SlotFlags::IGNORE_PARENT) {
            if let ValueKind::Function(function) = value.kind {
                return Some(function);
            }
        }
        match self.primitive_method(operand, name, scope)?.kind {
            ValueKind::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Resolves a method from the primitive class registered for the value's
    /// kind, if that class is visible from `scope`.
    pub(crate) fn primitive_method(&self, value: &Value, name: &str, scope: &Scope) -> Option<Value> {
        let class_name = value.primitive_class_name()?;
        let class_value = scope.get(class_name, SlotFlags::empty()).ok()?;
        if !matches!(class_value.kind, ValueKind::PrimitiveClass(_)) {
            return None;
        }
        class_value.data.get(name, SlotFlags::IGNORE_PARENT).ok()
    }

    /// Evaluates a member expression to its `(base, value)` pair: the base
    /// value and the resolved member. Missing members resolve to null; for
    /// non-objects, the kind's primitive class is consulted first.
    pub(crate) fn eval_member_pair(
        &mut self,
        object: &Node,
        member: &str,
        scope: &Scope,
        ctx: &Context,
    ) -> EvalResult<(Value, Value)> {
        let base = self.eval(object, scope, ctx)?;
        if let Ok(value) = base.data.get(member, SlotFlags::IGNORE_PARENT) {
            return Ok((base, value));
        }
        if !matches!(base.kind, ValueKind::Object(_)) {
            if let Some(method) = self.primitive_method(&base, member, scope) {
                return Ok((base, method));
            }
        }
        Ok((base, Value::null()))
    }

    fn exec_call(
        &mut self,
        node: &Node,
        callee_node: &Node,
        arg_nodes: &[Node],
        scope: &Scope,
        ctx: &Context,
    ) -> EvalResult {
        let (base, callee) = match &callee_node.kind {
            NodeKind::MemberExpression { object, member } => {
                let (base, value) = self.eval_member_pair(object, member, scope, ctx)?;
                (Some(base), value)
            }
            _ => (None, self.eval(callee_node, scope, ctx)?),
        };
        let name = call_site_name(callee_node, &callee);
        match &callee.kind {
            ValueKind::Function(function) => {
                if arg_nodes.len() < function.params.len() {
                    return Err(self.raise(
                        ErrorKind::ArityMismatch,
                        node.location,
                        ctx,
                        format!(
                            "{name} expects {} arguments, got {}",
                            function.params.len(),
                            arg_nodes.len()
                        ),
                    ));
                }
                let function = function.clone();
                let args = self.eval_arguments(arg_nodes, scope, ctx)?;
                self.call_function(&function, base.as_ref(), &args, &name, node.location, ctx)
            }
            ValueKind::Class(class) => {
                let class = class.clone();
                let args = self.eval_arguments(arg_nodes, scope, ctx)?;
                self.construct_object(&class, &args, node.location, ctx)
            }
            ValueKind::PrimitiveClass(primitive) => Err(self.raise(
                ErrorKind::NotInstantiable,
                node.location,
                ctx,
                format!("primitive class {} cannot be instantiated", primitive.name),
            )),
            _ => Err(self.raise(
                ErrorKind::NotCallable,
                node.location,
                ctx,
                format!("value of type {} is not callable", callee.type_name()),
            )),
        }
    }

    fn eval_arguments(&mut self, nodes: &[Node], scope: &Scope, ctx: &Context) -> EvalResult<Vec<Value>> {
        let mut args = Vec::with_capacity(nodes.len());
        for node in nodes {
            args.push(self.eval(node, scope, ctx)?);
        }
        Ok(args)
    }

    /// Invokes a function value.
    ///
    /// A fresh scope is created as a child of the captured scope, parameters
    /// are bound positionally, and `self` is bound constant when the call
    /// has a target. Extra arguments are discarded; missing ones are an
    /// arity error. A `Return` unwinding to this frame becomes the result; a
    /// `Break` keeps propagating (only a loop may catch it).
    pub(crate) fn call_function(
        &mut self,
        function: &Rc<Function>,
        target: Option<&Value>,
        args: &[Value],
        name: &str,
        location: CodeLoc,
        ctx: &Context,
    ) -> EvalResult {
        if args.len() < function.params.len() {
            return Err(self.raise(
                ErrorKind::ArityMismatch,
                location,
                ctx,
                format!(
                    "{name} expects {} arguments, got {}",
                    function.params.len(),
                    args.len()
                ),
            ));
        }
        let scope = function.scope.child();
        for (param, arg) in function.params.iter().zip(args.iter()) {
            scope
                .write(param, arg.clone(), SlotFlags::INIT)
                .map_err(|e| scope_error(e, param, location, ctx))?;
        }
        if let Some(target) = target {
            scope
                .write(SELF_NAME, target.clone(), SlotFlags::INIT | SlotFlags::CONSTANT)
                .map_err(|e| scope_error(e, SELF_NAME, location, ctx))?;
        }

        ctx.trace.push(TraceEntry {
            name: name.to_owned(),
            location,
            path: ctx.path.clone(),
            scope: scope.clone(),
        });
        let result = self.exec_block(&function.body, &scope, ctx);
        ctx.trace.pop();

        match result {
            Err(Unwind::Return(value)) => Ok(value),
            other => other,
        }
    }

    /// Validates that every node in a parameter or parent list is an
    /// identifier and extracts the names.
    pub(crate) fn identifier_names(&self, nodes: &[Node], ctx: &Context) -> EvalResult<Vec<String>> {
        nodes
            .iter()
            .map(|node| match &node.kind {
                NodeKind::Identifier(name) => Ok(name.clone()),
                _ => Err(self.raise(
                    ErrorKind::NotAnIdentifier,
                    node.location,
                    ctx,
                    "expected an identifier; this is an interpreter bug",
                )),
            })
            .collect()
    }

    pub(crate) fn raise(
        &self,
        kind: ErrorKind,
        location: CodeLoc,
        ctx: &Context,
        message: impl Into<String>,
    ) -> Unwind {
        RuntimeError::new(kind, message, location, ctx).into()
    }
}

/// The name a call is recorded under in the stack trace: the identifier or
/// member it was called through, falling back to the callee's own name.
fn call_site_name(callee_node: &Node, callee: &Value) -> String {
    match &callee_node.kind {
        NodeKind::Identifier(name) => name.clone(),
        NodeKind::MemberExpression { member, .. } => member.clone(),
        _ => match &callee.kind {
            ValueKind::Function(function) => function
                .name
                .clone()
                .unwrap_or_else(|| "<anonymous>".to_owned()),
            ValueKind::Class(class) => class.name.clone(),
            _ => "<anonymous>".to_owned(),
        },
    }
}
