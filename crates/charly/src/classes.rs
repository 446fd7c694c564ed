//! Class construction, object instantiation and primitive classes.
//!
//! Method precedence for multiple inheritance is produced by flattening the
//! class hierarchy depth-first (parents in declaration order, then self),
//! reversing the flattened list, and installing first-wins: the object keeps
//! its own methods, then the latest-declared parent's, and so on down to the
//! earliest parent.

use std::rc::Rc;

use crate::ast::{Block, CodeLoc, Node, NodeKind};
use crate::context::Context;
use crate::error::{scope_error, ErrorKind, EvalResult};
use crate::interpreter::Interpreter;
use crate::scope::{Scope, SlotFlags};
use crate::value::{Class, Function, MethodDef, PrimitiveClass, Value, ValueKind};

const CONSTRUCTOR_NAME: &str = "constructor";

/// The user class whose methods are grafted onto every primitive class.
const OBJECT_CLASS_NAME: &str = "Object";

impl Interpreter {
    /// Evaluates a class literal to a class value.
    ///
    /// Parents must resolve to classes in the current scope; the body may
    /// contain only property declarations and named methods. Methods stay
    /// unevaluated until instantiation.
    pub(crate) fn eval_class_literal(
        &mut self,
        name: &str,
        parent_nodes: &[Node],
        body: &Block,
        scope: &Scope,
        ctx: &Context,
    ) -> EvalResult {
        let mut parents = Vec::with_capacity(parent_nodes.len());
        for parent_node in parent_nodes {
            let parent_name = match &parent_node.kind {
                NodeKind::Identifier(parent_name) => parent_name,
                _ => {
                    return Err(self.raise(
                        ErrorKind::NotAnIdentifier,
                        parent_node.location,
                        ctx,
                        "parent reference is not an identifier; this is an interpreter bug",
                    ));
                }
            };
            let value = scope
                .get(parent_name, SlotFlags::empty())
                .map_err(|e| scope_error(e, parent_name, parent_node.location, ctx))?;
            match &value.kind {
                ValueKind::Class(parent) => parents.push(parent.clone()),
                _ => {
                    return Err(self.raise(
                        ErrorKind::NotAClass,
                        parent_node.location,
                        ctx,
                        format!("{parent_name} is not a class"),
                    ));
                }
            }
        }

        let mut properties = Vec::new();
        let mut methods = Vec::new();
        for statement in body {
            match &statement.kind {
                NodeKind::PropertyDeclaration(property) => properties.push(property.clone()),
                NodeKind::FunctionLiteral {
                    name: Some(method_name),
                    params,
                    body,
                } => {
                    let params = self.identifier_names(params, ctx)?;
                    methods.push(MethodDef {
                        name: method_name.clone(),
                        params,
                        body: Rc::new(body.clone()),
                    });
                }
                _ => {
                    return Err(self.raise(
                        ErrorKind::IllegalClassBody,
                        statement.location,
                        ctx,
                        format!("statement is not allowed in the body of class {name}"),
                    ));
                }
            }
        }

        let class = Class {
            name: name.to_owned(),
            properties,
            methods,
            parents,
            scope: scope.clone(),
        };
        Ok(Value::class(class, scope.child()))
    }

    /// Constructs an object from a class.
    ///
    /// Inherited properties are initialized to null, methods are installed
    /// per the precedence order above, and a `constructor` method (if any)
    /// is stripped from the object and invoked with the call's arguments.
    pub(crate) fn construct_object(
        &mut self,
        class: &Rc<Class>,
        args: &[Value],
        location: CodeLoc,
        ctx: &Context,
    ) -> EvalResult {
        let data = class.scope.child();
        let object = Value::object(class.clone(), data.clone());

        let mut properties = Vec::new();
        collect_properties(class, &mut properties);
        for property in &properties {
            data.write(property, Value::null(), SlotFlags::INIT)
                .map_err(|e| scope_error(e, property, location, ctx))?;
        }

        let mut methods = Vec::new();
        collect_methods(class, &mut methods);
        methods.reverse();
        self.install_methods(&data, methods, location, ctx)?;

        if let Ok(constructor) = data.get(CONSTRUCTOR_NAME, SlotFlags::IGNORE_PARENT) {
            data.delete(CONSTRUCTOR_NAME, SlotFlags::IGNORE_PARENT);
            if let ValueKind::Function(function) = &constructor.kind {
                self.call_function(function, Some(&object), args, CONSTRUCTOR_NAME, location, ctx)?;
            }
        }

        Ok(object)
    }

    /// Evaluates a primitive class literal.
    ///
    /// If a class named `Object` is visible from the current scope, its
    /// flattened methods are grafted in first, so the primitive class's own
    /// methods override them. Primitive classes cannot be instantiated.
    pub(crate) fn eval_primitive_class_literal(
        &mut self,
        name: &str,
        body: &Block,
        location: CodeLoc,
        scope: &Scope,
        ctx: &Context,
    ) -> EvalResult {
        let mut methods: Vec<(MethodDef, Scope)> = Vec::new();
        if let Ok(object_value) = scope.get(OBJECT_CLASS_NAME, SlotFlags::empty()) {
            if let ValueKind::Class(object_class) = &object_value.kind {
                collect_methods(object_class, &mut methods);
            }
        }

        for statement in body {
            match &statement.kind {
                NodeKind::FunctionLiteral {
                    name: Some(method_name),
                    params,
                    body,
                } => {
                    let params = self.identifier_names(params, ctx)?;
                    methods.push((
                        MethodDef {
                            name: method_name.clone(),
                            params,
                            body: Rc::new(body.clone()),
                        },
                        scope.clone(),
                    ));
                }
                _ => {
                    return Err(self.raise(
                        ErrorKind::IllegalClassBody,
                        statement.location,
                        ctx,
                        format!("statement is not allowed in the body of primitive class {name}"),
                    ));
                }
            }
        }

        methods.reverse();
        let data = scope.child();
        self.install_methods(&data, methods, location, ctx)?;

        let primitive = PrimitiveClass {
            name: name.to_owned(),
            scope: scope.clone(),
        };
        Ok(Value::primitive_class(primitive, data))
    }

    /// Installs an already-reversed method list first-wins: a name that is
    /// present in the target scope keeps its earlier (higher-precedence)
    /// binding. Each method closes over its owning class's captured scope.
    fn install_methods(
        &mut self,
        data: &Scope,
        methods: Vec<(MethodDef, Scope)>,
        location: CodeLoc,
        ctx: &Context,
    ) -> EvalResult<()> {
        for (def, owner_scope) in methods {
            if data.contains(&def.name, SlotFlags::IGNORE_PARENT) {
                continue;
            }
            let method = Function {
                name: Some(def.name.clone()),
                params: def.params.clone(),
                body: def.body.clone(),
                scope: owner_scope,
            };
            data.write(
                &def.name,
                Value::function(method),
                SlotFlags::INIT | SlotFlags::CONSTANT,
            )
            .map_err(|e| scope_error(e, &def.name, location, ctx))?;
        }
        Ok(())
    }
}

/// Flattens inherited properties depth-first: parents in declaration order,
/// then self. Duplicates are kept; later writes harmlessly overwrite.
fn collect_properties(class: &Class, into: &mut Vec<String>) {
    for parent in &class.parents {
        collect_properties(parent, into);
    }
    into.extend(class.properties.iter().cloned());
}

/// Flattens inherited methods in the same order, pairing each method with
/// the captured scope of the class that declared it.
fn collect_methods(class: &Rc<Class>, into: &mut Vec<(MethodDef, Scope)>) {
    for parent in &class.parents {
        collect_methods(parent, into);
    }
    for method in &class.methods {
        into.push((method.clone(), class.scope.clone()));
    }
}
