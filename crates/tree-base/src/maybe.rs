// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Optional-one and exactly-one owning edges.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use tracing::trace;
use tree_cbor::{MapReader, MapWriter};

use crate::arena::{Arena, NodeId};
use crate::edge::{
    check_tag, seq_to_wire, wire_to_seq, KEY_ID, KEY_KIND, KEY_TAG, TAG_MAYBE, TAG_ONE,
};
use crate::equivalence::Equivalence;
use crate::error::{Result, TreeError};
use crate::identifier_map::IdentifierMap;
use crate::node::{element_type, Kind, Node, Target};
use crate::pointer_map::{Completable, PointerMap};

/// Owning edge to zero or one node of kind `T`.
///
/// The edge is a handle; the node lives in an [`Arena`]. `==`, ordering and
/// hashing compare handles. Use [`Maybe::value_eq`] to compare contents.
pub struct Maybe<T> {
    id: Option<NodeId>,
    _kind: PhantomData<fn() -> T>,
}

impl<T> Maybe<T> {
    /// An empty edge.
    pub const fn new() -> Self {
        Self {
            id: None,
            _kind: PhantomData,
        }
    }

    /// An edge owning the node behind `id`.
    pub const fn from_id(id: NodeId) -> Self {
        Self {
            id: Some(id),
            _kind: PhantomData,
        }
    }

    /// Raw handle, if set.
    pub fn id(&self) -> Option<NodeId> {
        self.id
    }

    /// Returns whether the edge is unset.
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
    }

    /// Number of nodes owned: 0 or 1.
    pub fn len(&self) -> usize {
        usize::from(self.id.is_some())
    }

    /// Points the edge at `target`'s node, or clears it if `target` is empty.
    pub fn set(&mut self, target: impl Target) {
        self.id = target.target();
    }

    /// Clears the edge. The node stays in the arena until it is swept.
    pub fn reset(&mut self) {
        self.id = None;
    }

    /// The node as kind `T`, or `None` if empty, stale, or another kind.
    pub fn get<'a, N>(&self, arena: &'a Arena<N>) -> Option<&'a T>
    where
        T: Kind<N>,
    {
        self.id.and_then(|id| arena.get(id)).and_then(T::narrow)
    }

    /// Mutable counterpart of [`Maybe::get`].
    pub fn get_mut<'a, N>(&self, arena: &'a mut Arena<N>) -> Option<&'a mut T>
    where
        T: Kind<N>,
    {
        self.id.and_then(|id| arena.get_mut(id)).and_then(T::narrow_mut)
    }

    /// The node as kind `T`.
    ///
    /// Fails with [`TreeError::OutOfRange`] if the edge is empty, the handle
    /// is stale, or the node is of another kind.
    pub fn deref<'a, N>(&self, arena: &'a Arena<N>) -> Result<&'a T>
    where
        T: Kind<N>,
    {
        self.get(arena).ok_or_else(|| self.deref_error())
    }

    /// Mutable counterpart of [`Maybe::deref`].
    pub fn deref_mut<'a, N>(&self, arena: &'a mut Arena<N>) -> Result<&'a mut T>
    where
        T: Kind<N>,
    {
        self.get_mut(arena).ok_or_else(|| self.deref_error())
    }

    fn deref_error(&self) -> TreeError {
        match self.id {
            None => TreeError::OutOfRange(format!(
                "dereferencing empty edge of type {}",
                element_type::<T>()
            )),
            Some(id) => TreeError::OutOfRange(format!(
                "node {id} behind edge of type {} is gone or of another kind",
                element_type::<T>()
            )),
        }
    }

    /// Re-types the edge as kind `S`; empty if the node is not an `S`.
    pub fn cast<S, N>(&self, arena: &Arena<N>) -> Maybe<S>
    where
        S: Kind<N>,
    {
        match self.id {
            Some(id) if arena.get(id).and_then(S::narrow).is_some() => Maybe::from_id(id),
            _ => Maybe::new(),
        }
    }

    /// Structural equality.
    ///
    /// Two empty edges are equal. In the same arena, equal handles are
    /// equal without looking at the nodes. Otherwise the nodes are compared
    /// with [`Node::value_eq`], and links inside them by the position of
    /// their targets in each tree.
    pub fn value_eq<N: Node>(&self, arena: &Arena<N>, other: &Self, other_arena: &Arena<N>) -> bool
    where
        T: Kind<N>,
    {
        self.equivalent(other, &Equivalence::new(arena, self, other_arena, other))
    }

    /// [`Maybe::value_eq`] inside an existing comparison.
    pub fn equivalent<N: Node>(&self, other: &Self, eq: &Equivalence<'_, N>) -> bool {
        match (self.id, other.id) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                if eq.same_arena() && a == b {
                    return true;
                }
                match (eq.left().get(a), eq.right().get(b)) {
                    (Some(lhs), Some(rhs)) => lhs.value_eq(rhs, eq),
                    _ => false,
                }
            }
            _ => false,
        }
    }

    /// Calls `visit` on the node, then on everything it owns, in pre-order.
    /// An empty edge or a node of another kind visits nothing.
    pub fn visit<N>(&self, arena: &Arena<N>, visit: &mut dyn FnMut(NodeId, &N))
    where
        N: Node,
        T: Kind<N>,
    {
        let Some((id, node)) = self.id.and_then(|id| arena.get(id).map(|node| (id, node))) else {
            return;
        };
        if T::narrow(node).is_none() {
            return;
        }
        visit(id, node);
        node.visit_children(arena, visit);
    }

    /// Shallow copy: a new node with the same scalar fields and the same
    /// child handles. The result shares its children with the source.
    pub fn copy<N: Node>(&self, arena: &mut Arena<N>) -> Result<One<T>> {
        let Some(id) = self.id else {
            return Ok(One::new());
        };
        let node = arena.get(id).cloned().ok_or_else(|| self.deref_error())?;
        Ok(One::from_id(arena.try_insert(node)?))
    }

    /// Deep copy of the whole owned subtree. Links inside the copy keep
    /// pointing at their original targets.
    pub fn deep_clone<N: Node>(&self, arena: &mut Arena<N>) -> Result<One<T>> {
        let Some(id) = self.id else {
            return Ok(One::new());
        };
        let mut node = arena.get(id).cloned().ok_or_else(|| self.deref_error())?;
        node.clone_children(arena)?;
        Ok(One::from_id(arena.try_insert(node)?))
    }

    /// Writes this edge into `map`.
    pub fn serialize<N>(&self, arena: &Arena<N>, map: &mut MapWriter, ids: &PointerMap) -> Result<()>
    where
        N: Node,
        T: Kind<N>,
    {
        self.serialize_tagged(TAG_MAYBE, arena, map, ids)
    }

    /// Reads an edge written by [`Maybe::serialize`].
    pub fn deserialize<N>(
        map: &MapReader<'_>,
        arena: &mut Arena<N>,
        ids: &mut IdentifierMap,
    ) -> Result<Self>
    where
        N: Node,
        T: Kind<N>,
    {
        Self::deserialize_tagged(TAG_MAYBE, map, arena, ids)
    }

    fn serialize_tagged<N>(
        &self,
        tag: &str,
        arena: &Arena<N>,
        map: &mut MapWriter,
        ids: &PointerMap,
    ) -> Result<()>
    where
        N: Node,
        T: Kind<N>,
    {
        map.append_string(KEY_TAG, tag);
        let Some(id) = self.id else {
            map.append_null(KEY_KIND);
            return Ok(());
        };
        let node = arena.get(id).ok_or_else(|| self.deref_error())?;
        map.append_int(KEY_ID, seq_to_wire(ids.get(id, element_type::<T>())?)?);
        map.append_string(KEY_KIND, node.kind_name());
        node.serialize(arena, map, ids)
    }

    fn deserialize_tagged<N>(
        tag: &str,
        map: &MapReader<'_>,
        arena: &mut Arena<N>,
        ids: &mut IdentifierMap,
    ) -> Result<Self>
    where
        N: Node,
        T: Kind<N>,
    {
        check_tag(map, tag)?;
        if map.at(KEY_KIND)?.is_null() {
            return Ok(Self::new());
        }
        let seq = wire_to_seq(map.at(KEY_ID)?.as_int()?)?;
        ids.begin_node();
        let node = N::deserialize(map, arena, ids)?;
        if T::narrow(&node).is_none() {
            return Err(TreeError::Schema(format!(
                "node of kind '{}' cannot be stored in an edge of type {}",
                node.kind_name(),
                element_type::<T>()
            )));
        }
        let kind = node.kind_name();
        let id = arena.try_insert(node)?;
        trace!(seq, %id, kind, "decoded node");
        ids.end_node(id, seq)?;
        Ok(Self::from_id(id))
    }
}

impl<N, T> Completable<N> for Maybe<T>
where
    N: Node,
    T: Kind<N>,
{
    fn find_reachable(&self, arena: &Arena<N>, map: &mut PointerMap) -> Result<()> {
        let Some(id) = self.id else {
            return Ok(());
        };
        map.add(id, element_type::<T>())?;
        let node = arena.get(id).ok_or_else(|| {
            TreeError::NotWellFormed(format!(
                "owning edge of type {} refers to reclaimed node {id}",
                element_type::<T>()
            ))
        })?;
        if T::narrow(node).is_none() {
            return Err(TreeError::NotWellFormed(format!(
                "owning edge of type {} holds a node of kind '{}'",
                element_type::<T>(),
                node.kind_name()
            )));
        }
        node.find_reachable(arena, map)
    }

    fn check_complete(&self, arena: &Arena<N>, map: &PointerMap) -> Result<()> {
        match self.id.and_then(|id| arena.get(id)) {
            Some(node) => node.check_complete(arena, map),
            None => Ok(()),
        }
    }
}

impl<T> Clone for Maybe<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Maybe<T> {}

impl<T> Default for Maybe<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Maybe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "Maybe({id})"),
            None => f.write_str("Maybe(-)"),
        }
    }
}

impl<T> PartialEq for Maybe<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Maybe<T> {}

impl<T> PartialOrd for Maybe<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Maybe<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl<T> Hash for Maybe<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> Target for Maybe<T> {
    fn target(&self) -> Option<NodeId> {
        self.id
    }
}

/// Owning edge to exactly one node of kind `T`.
///
/// Behaves like [`Maybe`] (and dereferences to it) but an empty `One` fails
/// the completeness check, and it is tagged `1` on the wire.
pub struct One<T>(Maybe<T>);

impl<T> One<T> {
    /// An edge that is not filled in yet.
    pub const fn new() -> Self {
        Self(Maybe::new())
    }

    /// An edge owning the node behind `id`.
    pub const fn from_id(id: NodeId) -> Self {
        Self(Maybe::from_id(id))
    }

    /// The underlying optional edge.
    pub fn as_maybe(&self) -> Maybe<T> {
        self.0
    }

    /// Writes this edge into `map`.
    pub fn serialize<N>(&self, arena: &Arena<N>, map: &mut MapWriter, ids: &PointerMap) -> Result<()>
    where
        N: Node,
        T: Kind<N>,
    {
        self.0.serialize_tagged(TAG_ONE, arena, map, ids)
    }

    /// Reads an edge written by [`One::serialize`].
    pub fn deserialize<N>(
        map: &MapReader<'_>,
        arena: &mut Arena<N>,
        ids: &mut IdentifierMap,
    ) -> Result<Self>
    where
        N: Node,
        T: Kind<N>,
    {
        Maybe::deserialize_tagged(TAG_ONE, map, arena, ids).map(Self)
    }
}

impl<T> std::ops::Deref for One<T> {
    type Target = Maybe<T>;

    fn deref(&self) -> &Maybe<T> {
        &self.0
    }
}

impl<T> std::ops::DerefMut for One<T> {
    fn deref_mut(&mut self) -> &mut Maybe<T> {
        &mut self.0
    }
}

impl<N, T> Completable<N> for One<T>
where
    N: Node,
    T: Kind<N>,
{
    fn find_reachable(&self, arena: &Arena<N>, map: &mut PointerMap) -> Result<()> {
        self.0.find_reachable(arena, map)
    }

    fn check_complete(&self, arena: &Arena<N>, map: &PointerMap) -> Result<()> {
        if self.0.is_empty() {
            return Err(TreeError::NotWellFormed(format!(
                "'One' edge of type {} is empty",
                element_type::<T>()
            )));
        }
        self.0.check_complete(arena, map)
    }
}

impl<T> Clone for One<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for One<T> {}

impl<T> Default for One<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for One<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.id {
            Some(id) => write!(f, "One({id})"),
            None => f.write_str("One(-)"),
        }
    }
}

impl<T> PartialEq for One<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for One<T> {}

impl<T> PartialOrd for One<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for One<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> Hash for One<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> Target for One<T> {
    fn target(&self) -> Option<NodeId> {
        self.0.id
    }
}

impl<T> From<One<T>> for Maybe<T> {
    fn from(one: One<T>) -> Self {
        one.0
    }
}

impl<T> From<Maybe<T>> for One<T> {
    fn from(maybe: Maybe<T>) -> Self {
        Self(maybe)
    }
}

/// Moves `node` into `arena` and returns an owning edge to it.
pub fn make<N, T>(arena: &mut Arena<N>, node: T) -> One<T>
where
    T: Into<N> + Kind<N>,
{
    One::from_id(arena.insert(node.into()))
}
