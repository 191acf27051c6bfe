// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Capabilities a generated node type provides to the edge containers.
//!
//! A graph stores one closed node type `N` (usually an enum with a variant per
//! node kind). Edges are parameterised by a *kind view* `T`: either `N` itself
//! or one variant's payload. [`Kind`] narrows an `N` to a view.

use tree_cbor::{MapReader, MapWriter};

use crate::arena::{Arena, NodeId};
use crate::equivalence::Equivalence;
use crate::error::Result;
use crate::identifier_map::IdentifierMap;
use crate::link::LinkBase;
use crate::pointer_map::{Completable, PointerMap};

/// A node type that owns its edge fields.
///
/// Implementations forward every structural operation to their edge fields in
/// declaration order. The order matters in two places: [`Node::serialize`] and
/// [`Node::deserialize`] must agree on field names, and [`Node::links_mut`]
/// must visit link fields in the same order [`Node::deserialize`] decodes them,
/// because restored links are matched to their slot by position.
pub trait Node: Clone + Sized + Completable<Self> {
    /// Kind name written to the wire as `@t`.
    fn kind_name(&self) -> &'static str;

    /// Recursive value equality.
    ///
    /// Scalar fields compare by value and edges by their own `equivalent`.
    /// `self` lives in `eq.left()`, `other` in `eq.right()`.
    fn value_eq(&self, other: &Self, eq: &Equivalence<'_, Self>) -> bool;

    /// Forwards `visit` to every owning edge field in declaration order.
    ///
    /// Since each edge visits its node and then that node's children, this
    /// walks the owned subtree below `self` in pre-order. Link fields are
    /// skipped.
    fn visit_children(&self, arena: &Arena<Self>, visit: &mut dyn FnMut(NodeId, &Self));

    /// Replaces every owning edge with a deep clone of its subtree.
    ///
    /// Called on a fresh shallow copy by `deep_clone`. Links are left alone.
    fn clone_children(&mut self, arena: &mut Arena<Self>) -> Result<()>;

    /// Visits every link field in declaration order.
    fn links_mut(&mut self, visit: &mut dyn FnMut(&mut dyn LinkBase));

    /// Writes this node's fields (everything except the `@`-prefixed edge keys).
    fn serialize(&self, arena: &Arena<Self>, map: &mut MapWriter, ids: &PointerMap) -> Result<()>;

    /// Reads a node of the kind named by the map's `@t` entry.
    ///
    /// An unknown kind name is a [`crate::TreeError::Schema`] error. Child
    /// edges are decoded (and inserted into `arena`) before the node itself.
    fn deserialize(
        map: &MapReader<'_>,
        arena: &mut Arena<Self>,
        ids: &mut IdentifierMap,
    ) -> Result<Self>;
}

/// A view of the node type `N`.
///
/// Narrowing never fails loudly: a node of another kind yields `None`.
pub trait Kind<N>: Sized {
    /// Borrows `node` as this view.
    fn narrow(node: &N) -> Option<&Self>;

    /// Mutably borrows `node` as this view.
    fn narrow_mut(node: &mut N) -> Option<&mut Self>;
}

impl<N: Node> Kind<N> for N {
    fn narrow(node: &N) -> Option<&Self> {
        Some(node)
    }

    fn narrow_mut(node: &mut N) -> Option<&mut Self> {
        Some(node)
    }
}

/// Anything an edge can be pointed at: a raw handle or another edge.
pub trait Target {
    /// The handle to point at, or `None` for "empty".
    fn target(&self) -> Option<NodeId>;
}

impl Target for NodeId {
    fn target(&self) -> Option<NodeId> {
        Some(*self)
    }
}

impl Target for Option<NodeId> {
    fn target(&self) -> Option<NodeId> {
        *self
    }
}

impl<X: Target + ?Sized> Target for &X {
    fn target(&self) -> Option<NodeId> {
        (**self).target()
    }
}

/// Element type name used in error messages.
pub(crate) fn element_type<T>() -> &'static str {
    std::any::type_name::<T>()
}
