//! Prelude loading lifecycle: CHARLYDIR resolution, parse/run failures.

mod common;

use std::fs;

use charly::{ErrorKind, Interpreter, ParseError, PreludeError, Program, CHARLYDIR};
use common::*;

/// A parser stub that ignores the source text and returns a fixed tree.
fn stub_parser(tree: Vec<charly::Node>) -> impl Fn(&str, &str) -> Result<Program, ParseError> {
    move |path: &str, _source: &str| {
        Ok(Program {
            path: path.to_owned(),
            tree: tree.clone(),
        })
    }
}

/// Environment mutation is process-global, so every prelude scenario runs
/// inside this single test, sequentially.
#[test]
fn prelude_lifecycle() {
    // SAFETY: this is the only test in the binary touching the environment,
    // and integration test binaries run their own process.
    unsafe { std::env::remove_var(CHARLYDIR) };

    // missing CHARLYDIR aborts construction
    let parser = stub_parser(vec![]);
    match Interpreter::new(&parser).err() {
        Some(PreludeError::Runtime(error)) => assert_eq!(error.kind, ErrorKind::PreludeMissing),
        other => panic!("expected a PreludeMissing failure, got {other:?}"),
    }

    // set up a fake installation directory
    let base = std::env::temp_dir().join(format!("charly-prelude-test-{}", std::process::id()));
    let std_dir = base.join("src").join("std");
    fs::create_dir_all(&std_dir).expect("create prelude dir");
    fs::write(std_dir.join("prelude.charly"), "let answer = 42\n").expect("write prelude");
    // SAFETY: see above.
    unsafe { std::env::set_var(CHARLYDIR, &base) };

    // a missing prelude file surfaces as an I/O error
    fs::remove_file(std_dir.join("prelude.charly")).expect("remove prelude");
    let parser = stub_parser(vec![]);
    match Interpreter::new(&parser).err() {
        Some(PreludeError::Io(_)) => {}
        other => panic!("expected an I/O failure, got {other:?}"),
    }
    fs::write(std_dir.join("prelude.charly"), "let answer = 42\n").expect("write prelude");

    // the parsed prelude executes against the top scope
    let parser = stub_parser(vec![let_("answer", num(42.0))]);
    let interpreter = Interpreter::new(&parser).expect("prelude should load");
    let answer = interpreter
        .top_scope()
        .get("answer", charly::SlotFlags::empty())
        .expect("prelude binding");
    assert_eq!(answer.as_numeric(), Some(42.0));

    // parse failures abort construction
    let failing = |_: &str, _: &str| -> Result<Program, ParseError> {
        Err(ParseError::new("unexpected token", charly::CodeLoc::new(1, 1)))
    };
    match Interpreter::new(&failing).err() {
        Some(PreludeError::Parse(_)) => {}
        other => panic!("expected a parse failure, got {other:?}"),
    }

    // runtime failures inside the prelude abort construction too
    let parser = stub_parser(vec![ident("ghost")]);
    match Interpreter::new(&parser).err() {
        Some(PreludeError::Runtime(error)) => assert_eq!(error.kind, ErrorKind::NotDefined),
        other => panic!("expected a runtime failure, got {other:?}"),
    }

    let _ = fs::remove_dir_all(&base);
}
