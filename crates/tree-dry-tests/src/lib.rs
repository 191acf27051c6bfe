// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared node set and tree builders for tree-base tests.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`nodes`] - A hand-written program node set in the shape generated code takes
//! - [`builders`] - Named scenarios and a shape-driven program builder

pub mod builders;
pub mod nodes;

pub use builders::{
    aliased_result_program, back_link_scenario, build_program, sample_program, BackLinkScenario,
    CallShape, FunctionShape, ProgramShape,
};
pub use nodes::{AstNode, Call, Function, Literal, Program};
