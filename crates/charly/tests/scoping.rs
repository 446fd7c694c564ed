//! Declaration, assignment and shadowing semantics.

mod common;

use charly::ErrorKind;
use common::*;
use pretty_assertions::assert_eq;

#[test]
fn initialisation_yields_the_value_and_defines_the_name() {
    let result = eval_ok(vec![let_("a", num(5.0)), ident("a")]);
    assert_eq!(result.as_numeric(), Some(5.0));
}

#[test]
fn initialisation_result_is_the_expression_value() {
    let result = eval_ok(vec![let_("a", string("hi"))]);
    assert_eq!(result.as_string(), Some("hi"));
}

#[test]
fn reading_an_undefined_name_fails() {
    let error = eval_err(vec![ident("ghost")]);
    assert_eq!(error.kind, ErrorKind::NotDefined);
}

#[test]
fn redeclaring_in_the_same_scope_fails() {
    let error = eval_err(vec![let_("a", num(1.0)), let_("a", num(2.0))]);
    assert_eq!(error.kind, ErrorKind::AlreadyDefined);
}

#[test]
fn redeclaring_in_a_child_scope_shadows() {
    // `if` bodies run in a fresh child scope, so the inner `let` shadows
    // instead of clobbering.
    let result = eval_ok(vec![
        let_("a", num(1.0)),
        if_(boolean(true), vec![let_("a", num(2.0))], None),
        ident("a"),
    ]);
    assert_eq!(result.as_numeric(), Some(1.0));
}

#[test]
fn assignment_mutates_the_nearest_slot() {
    let result = eval_ok(vec![
        let_("a", num(1.0)),
        if_(boolean(true), vec![assign("a", num(5.0))], None),
        ident("a"),
    ]);
    assert_eq!(result.as_numeric(), Some(5.0));
}

#[test]
fn assigning_an_undefined_name_fails() {
    let error = eval_err(vec![assign("ghost", num(1.0))]);
    assert_eq!(error.kind, ErrorKind::NotDefined);
}

#[test]
fn constants_cannot_be_reassigned() {
    let error = eval_err(vec![const_("pi", num(3.14)), assign("pi", num(3.0))]);
    assert_eq!(error.kind, ErrorKind::ConstantAssignment);
}

#[test]
fn self_cannot_be_declared() {
    let error = eval_err(vec![let_("self", num(1.0))]);
    assert_eq!(error.kind, ErrorKind::ReservedName);

    let error = eval_err(vec![const_("self", num(1.0))]);
    assert_eq!(error.kind, ErrorKind::ReservedName);
}

#[test]
fn self_cannot_be_assigned() {
    let error = eval_err(vec![assign("self", num(1.0))]);
    assert_eq!(error.kind, ErrorKind::ReservedName);
}

#[test]
fn members_can_be_attached_to_any_value() {
    // members attach to the value's own scope, shared by every handle to it
    let result = eval_ok(vec![
        let_("n", num(2.0)),
        assign_member(ident("n"), "note", string("two")),
        member_of(ident("n"), "note"),
    ]);
    assert_eq!(result.as_string(), Some("two"));
}

#[test]
fn missing_members_resolve_to_null() {
    let result = eval_ok(vec![let_("n", num(2.0)), member_of(ident("n"), "nothing")]);
    assert!(result.is_null());
}

#[test]
fn array_members_are_null_without_a_primitive_class() {
    // with no prelude there is no Array method table to fall back to
    let result = eval_ok(vec![
        let_("a", array(vec![num(1.0), num(2.0), num(3.0)])),
        member_of(ident("a"), "length"),
    ]);
    assert!(result.is_null());
}

#[test]
fn index_assignment_is_not_implemented() {
    let error = eval_err(vec![
        let_("a", array(vec![num(1.0)])),
        node(charly::NodeKind::VariableAssignment {
            target: Box::new(index_of(ident("a"), num(0.0))),
            value: Box::new(num(9.0)),
        }),
    ]);
    assert_eq!(error.kind, ErrorKind::NotImplemented);
}
