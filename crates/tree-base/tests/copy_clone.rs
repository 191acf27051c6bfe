// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shallow copies share children; deep clones own theirs.
#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use tree_base::{Arena, Completable};
use tree_dry_tests::{sample_program, AstNode};

#[test]
fn copy_shares_children() {
    common::init_tracing();
    let mut arena: Arena<AstNode> = Arena::new();
    let program = sample_program(&mut arena).expect("sample");
    let main = program.deref(&arena).expect("program").functions.front();

    let copy = main.copy(&mut arena).expect("copy");
    assert_ne!(copy.id(), main.id());
    assert!(main.value_eq(&arena, &copy.as_maybe(), &arena));
    assert_eq!(
        copy.deref(&arena).expect("copy").body.front().id(),
        main.deref(&arena).expect("main").body.front().id()
    );

    // Owning the copy next to the source aliases the shared call.
    program
        .deref_mut(&mut arena)
        .expect("program")
        .functions
        .add(copy);
    let err = program.check_well_formed(&arena).expect_err("shared child");
    assert!(err.to_string().contains("more than one edge"), "{err}");
}

#[test]
fn deep_clone_is_independent_and_keeps_links() {
    let mut arena: Arena<AstNode> = Arena::new();
    let program = sample_program(&mut arena).expect("sample");
    let main = program.deref(&arena).expect("program").functions.front();
    let helper = program.deref(&arena).expect("program").functions.back();

    let clone = main.deep_clone(&mut arena).expect("clone");
    assert!(main.value_eq(&arena, &clone.as_maybe(), &arena));

    let original_call = main.deref(&arena).expect("main").body.front();
    let cloned_call = clone.deref(&arena).expect("clone").body.front();
    assert_ne!(original_call.id(), cloned_call.id());

    // Links inside the clone still target the original nodes.
    let callee = cloned_call.deref(&arena).expect("call").callee;
    assert!(callee.links_to(&arena, helper));
    assert_eq!(
        clone.deref(&arena).expect("clone").parent.resolve(&arena),
        program.id()
    );

    program
        .deref_mut(&mut arena)
        .expect("program")
        .functions
        .add(clone);
    assert!(program.is_well_formed(&arena));

    // Mutating the clone leaves the source alone.
    let cloned_arg = cloned_call.deref(&arena).expect("call").arg;
    cloned_arg.deref_mut(&mut arena).expect("arg").value = 99;
    let original_arg = original_call.deref(&arena).expect("call").arg;
    assert_eq!(original_arg.deref(&arena).expect("arg").value, 7);
    assert!(!main.value_eq(&arena, &clone.as_maybe(), &arena));
}

#[test]
fn sequence_copies_keep_order() {
    let mut arena: Arena<AstNode> = Arena::new();
    let program = sample_program(&mut arena).expect("sample");
    let functions = program.deref(&arena).expect("program").functions.clone();

    let copied = functions.copy(&mut arena).expect("copy");
    let cloned = functions.deep_clone(&mut arena).expect("clone");
    for seq in [&copied, &cloned] {
        assert_eq!(seq.len(), 2);
        assert!(functions.value_eq(&arena, seq, &arena));
        let names: Vec<_> = seq.nodes(&arena).map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["main", "helper"]);
    }
    assert_ne!(copied.front().id(), functions.front().id());
}

#[test]
fn copying_an_empty_edge_yields_an_empty_edge() {
    let mut arena: Arena<AstNode> = Arena::new();
    let program = sample_program(&mut arena).expect("sample");
    let main = program.deref(&arena).expect("program").functions.front();
    let result = main.deref(&arena).expect("main").result;
    assert!(result.is_empty());
    assert!(result.copy(&mut arena).expect("copy").is_empty());
    assert!(result.deep_clone(&mut arena).expect("clone").is_empty());
}
