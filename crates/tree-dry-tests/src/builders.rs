// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Ready-made trees for integration tests.

use tree_base::{make, Arena, Maybe, One, Result};

use crate::nodes::{AstNode, Call, Function, Literal, Program};

/// Root program `R` owning functions `[A, B]`, where `A` links back to `R`.
///
/// Serialized, the owning pre-order numbers the nodes `R=0, A=1, B=2`.
#[derive(Debug, Clone, Copy)]
pub struct BackLinkScenario {
    /// Program `R`.
    pub root: One<Program>,
    /// Function `A`, whose `parent` links to `R`.
    pub a: One<Function>,
    /// Function `B`, with no links.
    pub b: One<Function>,
}

/// Builds the [`BackLinkScenario`] in `arena`.
pub fn back_link_scenario(arena: &mut Arena<AstNode>) -> Result<BackLinkScenario> {
    let root = make(arena, Program::new("R"));
    let a = make(arena, Function::new("A"));
    let b = make(arena, Function::new("B"));
    a.deref_mut(arena)?.parent.set(root);
    let program = root.deref_mut(arena)?;
    program.functions.add(a);
    program.functions.add(b);
    Ok(BackLinkScenario { root, a, b })
}

/// A program exercising every edge kind.
///
/// `main` calls `helper(7)` and `helper` returns `42`. Both functions link
/// back to the program, and `main` is the entry point.
pub fn sample_program(arena: &mut Arena<AstNode>) -> Result<One<Program>> {
    let program = make(arena, Program::new("demo"));
    let main = make(arena, Function::new("main"));
    let helper = make(arena, Function::new("helper"));

    let answer = make(arena, Literal::new(42));
    helper.deref_mut(arena)?.result.set(answer);
    for function in [main, helper] {
        function.deref_mut(arena)?.parent.set(program);
    }

    let arg = make(arena, Literal::new(7));
    let call = make(arena, Call::new(helper, arg));
    main.deref_mut(arena)?.body.add(call);

    let root = program.deref_mut(arena)?;
    root.functions.add(main);
    root.functions.add(helper);
    root.entry.set(main);
    Ok(program)
}

/// A program whose two functions share one result literal through two
/// separate optional-one edges. Not well-formed.
pub fn aliased_result_program(arena: &mut Arena<AstNode>) -> Result<Maybe<Program>> {
    let shared = make(arena, Literal::new(1));
    let program = make(arena, Program::new("aliased"));
    for name in ["left", "right"] {
        let function = make(arena, Function::new(name));
        function.deref_mut(arena)?.result.set(shared);
        program.deref_mut(arena)?.functions.add(function);
    }
    Ok(program.into())
}

/// Blueprint for a generated program; indices wrap around the function list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramShape {
    /// Program name.
    pub name: String,
    /// Functions in order. A well-formed program needs at least one.
    pub functions: Vec<FunctionShape>,
    /// Index of the entry function, if any.
    pub entry: Option<usize>,
}

/// Blueprint for one function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionShape {
    /// Function name.
    pub name: String,
    /// Whether `parent` links back to the program.
    pub links_parent: bool,
    /// Calls in the body.
    pub calls: Vec<CallShape>,
    /// Constant result, if any.
    pub result: Option<i64>,
}

/// Blueprint for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallShape {
    /// Index of the called function.
    pub callee: usize,
    /// Argument value.
    pub arg: i64,
}

/// Builds the program described by `shape`.
pub fn build_program(arena: &mut Arena<AstNode>, shape: &ProgramShape) -> Result<One<Program>> {
    let program = make(arena, Program::new(&shape.name));
    let functions: Vec<One<Function>> = shape
        .functions
        .iter()
        .map(|f| make(arena, Function::new(&f.name)))
        .collect();
    let pick = |index: usize| functions.get(index % functions.len().max(1)).copied();

    for (function, blueprint) in functions.iter().zip(&shape.functions) {
        for call in &blueprint.calls {
            let arg = make(arena, Literal::new(call.arg));
            let call = make(arena, Call::new(pick(call.callee).unwrap_or_default(), arg));
            function.deref_mut(arena)?.body.add(call);
        }
        if let Some(value) = blueprint.result {
            let result = make(arena, Literal::new(value));
            function.deref_mut(arena)?.result.set(result);
        }
        if blueprint.links_parent {
            function.deref_mut(arena)?.parent.set(program);
        }
        program.deref_mut(arena)?.functions.add(*function);
    }

    if let Some(entry) = shape.entry.and_then(pick) {
        program.deref_mut(arena)?.entry.set(entry);
    }
    Ok(program)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use tree_base::Completable;

    #[test]
    fn fixtures_are_well_formed_where_intended() {
        let mut arena = Arena::new();
        let scenario = back_link_scenario(&mut arena).expect("scenario");
        assert!(scenario.root.is_well_formed(&arena));

        let sample = sample_program(&mut arena).expect("sample");
        assert!(sample.is_well_formed(&arena));

        let aliased = aliased_result_program(&mut arena).expect("aliased");
        assert!(!aliased.is_well_formed(&arena));
    }

    #[test]
    fn shape_indices_wrap() {
        let shape = ProgramShape {
            name: "p".into(),
            functions: vec![FunctionShape {
                name: "f".into(),
                links_parent: true,
                calls: vec![CallShape { callee: 5, arg: 1 }],
                result: Some(2),
            }],
            entry: Some(3),
        };
        let mut arena = Arena::new();
        let program = build_program(&mut arena, &shape).expect("build");
        assert!(program.is_well_formed(&arena));
        let root = program.deref(&arena).expect("program");
        assert_eq!(root.entry.resolve(&arena), root.functions.front().id());
    }
}
