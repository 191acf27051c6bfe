// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! tree-base: runtime support for generated typed trees.
//!
//! A tree is a set of nodes in an [`Arena`] joined by two kinds of edges:
//!
//! - owning edges ([`Maybe`], [`One`], [`Any`], [`Many`]): every node has at
//!   most one owning edge pointing at it, so the owning edges form a tree;
//! - links ([`OptLink`], [`Link`]): non-owning references anywhere in the
//!   same tree, including back to ancestors.
//!
//! Construction never validates. [`Completable::check_well_formed`] runs the
//! two-phase check (ownership is a tree, mandatory edges are filled, every
//! link lands inside the tree), and [`serialize`] / [`deserialize`] persist a
//! tree losslessly as canonical CBOR, restoring links by sequence id.
//!
//! Node types implement [`Node`] (usually generated); views of a node enum
//! implement [`Kind`].
#![forbid(unsafe_code)]

mod any;
mod arena;
mod edge;
mod equivalence;
mod error;
mod identifier_map;
mod link;
mod maybe;
mod node;
mod pointer_map;
mod serdes;

#[cfg(test)]
mod fixture;

pub use any::{Any, Many};
pub use arena::{Arena, NodeId};
pub use equivalence::Equivalence;
pub use error::{Result, TreeError};
pub use identifier_map::IdentifierMap;
pub use link::{Link, LinkBase, OptLink};
pub use maybe::{make, Maybe, One};
pub use node::{Kind, Node, Target};
pub use pointer_map::{Completable, PointerMap};
pub use serdes::{
    deserialize, deserialize_file, deserialize_file_with, deserialize_from_reader,
    deserialize_from_reader_with, deserialize_with, serialize, serialize_file,
    serialize_to_writer, Tree,
};
pub use tree_cbor::{CodecConfig, MapReader, MapWriter};
