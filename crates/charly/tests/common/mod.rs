//! AST construction helpers shared by the integration tests.
//!
//! The parser is an external collaborator, so tests build the trees it would
//! deliver. Locations are fixed at 1:1; nothing under test depends on them.
#![allow(dead_code)]

use charly::{
    CmpOperator, CodeLoc, Interpreter, Node, NodeKind, Operator, Program, RuntimeError,
    UnaryOperator, Value,
};

pub fn node(kind: NodeKind) -> Node {
    Node::new(CodeLoc::new(1, 1), kind)
}

pub fn num(value: f64) -> Node {
    node(NodeKind::NumericLiteral(value.to_string()))
}

pub fn string(value: &str) -> Node {
    node(NodeKind::StringLiteral(value.to_owned()))
}

pub fn boolean(value: bool) -> Node {
    node(NodeKind::BooleanLiteral(value))
}

pub fn null() -> Node {
    node(NodeKind::NullLiteral)
}

pub fn nan() -> Node {
    node(NodeKind::NanLiteral)
}

pub fn array(items: Vec<Node>) -> Node {
    node(NodeKind::ArrayLiteral(items))
}

pub fn ident(name: &str) -> Node {
    node(NodeKind::Identifier(name.to_owned()))
}

pub fn let_(name: &str, value: Node) -> Node {
    node(NodeKind::VariableInitialisation {
        name: name.to_owned(),
        value: Box::new(value),
    })
}

pub fn const_(name: &str, value: Node) -> Node {
    node(NodeKind::ConstantInitialisation {
        name: name.to_owned(),
        value: Box::new(value),
    })
}

pub fn assign(name: &str, value: Node) -> Node {
    node(NodeKind::VariableAssignment {
        target: Box::new(ident(name)),
        value: Box::new(value),
    })
}

pub fn assign_member(object: Node, member: &str, value: Node) -> Node {
    node(NodeKind::VariableAssignment {
        target: Box::new(member_of(object, member)),
        value: Box::new(value),
    })
}

pub fn member_of(object: Node, member: &str) -> Node {
    node(NodeKind::MemberExpression {
        object: Box::new(object),
        member: member.to_owned(),
    })
}

pub fn index_of(object: Node, index: Node) -> Node {
    node(NodeKind::IndexExpression {
        object: Box::new(object),
        index: Box::new(index),
    })
}

pub fn call(callee: Node, args: Vec<Node>) -> Node {
    node(NodeKind::CallExpression {
        callee: Box::new(callee),
        args,
    })
}

pub fn binary(operator: Operator, left: Node, right: Node) -> Node {
    node(NodeKind::BinaryExpression {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn cmp(operator: CmpOperator, left: Node, right: Node) -> Node {
    node(NodeKind::ComparisonExpression {
        operator,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn unary(operator: UnaryOperator, right: Node) -> Node {
    node(NodeKind::UnaryExpression {
        operator,
        right: Box::new(right),
    })
}

pub fn func(name: Option<&str>, params: &[&str], body: Vec<Node>) -> Node {
    node(NodeKind::FunctionLiteral {
        name: name.map(str::to_owned),
        params: params.iter().map(|p| ident(p)).collect(),
        body,
    })
}

pub fn ret(expression: Option<Node>) -> Node {
    node(NodeKind::ReturnStatement(expression.map(Box::new)))
}

pub fn brk() -> Node {
    node(NodeKind::BreakStatement)
}

pub fn if_(test: Node, consequent: Vec<Node>, alternate: Option<Node>) -> Node {
    node(NodeKind::IfStatement {
        test: Box::new(test),
        consequent,
        alternate: alternate.map(Box::new),
    })
}

pub fn while_(test: Node, consequent: Vec<Node>) -> Node {
    node(NodeKind::WhileStatement {
        test: Box::new(test),
        consequent,
    })
}

pub fn and(left: Node, right: Node) -> Node {
    node(NodeKind::And {
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn or(left: Node, right: Node) -> Node {
    node(NodeKind::Or {
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn block(statements: Vec<Node>) -> Node {
    node(NodeKind::Block(statements))
}

pub fn class(name: &str, parents: &[&str], body: Vec<Node>) -> Node {
    node(NodeKind::ClassLiteral {
        name: name.to_owned(),
        parents: parents.iter().map(|p| ident(p)).collect(),
        body,
    })
}

pub fn property(name: &str) -> Node {
    node(NodeKind::PropertyDeclaration(name.to_owned()))
}

pub fn primitive_class(name: &str, body: Vec<Node>) -> Node {
    node(NodeKind::PrimitiveClassLiteral {
        name: name.to_owned(),
        body,
    })
}

/// Runs a program against a fresh preludeless interpreter.
pub fn run(tree: Vec<Node>) -> Result<Value, Box<RuntimeError>> {
    let mut interpreter = Interpreter::without_prelude();
    let scope = interpreter.top_scope().clone();
    let program = Program {
        path: "test.charly".to_owned(),
        tree,
    };
    interpreter.exec_program(&program, &scope)
}

pub fn eval_ok(tree: Vec<Node>) -> Value {
    run(tree).expect("program should run")
}

pub fn eval_err(tree: Vec<Node>) -> Box<RuntimeError> {
    run(tree).expect_err("program should fail")
}
