// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Non-owning link edges.
//!
//! A link stores a handle and nothing else. It never keeps its target alive:
//! once the target is removed from the arena the handle goes stale and the
//! link reads as empty.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use tree_cbor::{MapReader, MapWriter};

use crate::arena::{Arena, NodeId};
use crate::edge::{check_tag, seq_to_wire, wire_to_seq, KEY_LINK, KEY_TAG, TAG_LINK, TAG_OPT_LINK};
use crate::equivalence::Equivalence;
use crate::error::{Result, TreeError};
use crate::identifier_map::IdentifierMap;
use crate::maybe::Maybe;
use crate::node::{element_type, Kind, Node, Target};
use crate::pointer_map::{Completable, PointerMap};

/// Type-erased access to a link field, used to restore links after decoding.
pub trait LinkBase {
    /// Points the link at `target`.
    fn restore(&mut self, target: NodeId);

    /// Declared element type, for error messages.
    fn element_type(&self) -> &'static str;
}

/// Optional non-owning reference to a node of kind `T`.
pub struct OptLink<T> {
    id: Option<NodeId>,
    _kind: PhantomData<fn() -> T>,
}

impl<T> OptLink<T> {
    /// An unset link.
    pub const fn new() -> Self {
        Self {
            id: None,
            _kind: PhantomData,
        }
    }

    /// A link to the node behind `id`.
    pub const fn from_id(id: NodeId) -> Self {
        Self {
            id: Some(id),
            _kind: PhantomData,
        }
    }

    /// Raw handle, which may be stale.
    pub fn id(&self) -> Option<NodeId> {
        self.id
    }

    /// Points the link at `target`'s node, or clears it.
    pub fn set(&mut self, target: impl Target) {
        self.id = target.target();
    }

    /// Clears the link.
    pub fn reset(&mut self) {
        self.id = None;
    }

    /// The handle, only while the target is live and of kind `T`.
    pub fn resolve<N>(&self, arena: &Arena<N>) -> Option<NodeId>
    where
        T: Kind<N>,
    {
        self.id
            .filter(|id| arena.get(*id).and_then(T::narrow).is_some())
    }

    /// Returns whether the link is unset, expired, or points at another kind.
    pub fn is_empty<N>(&self, arena: &Arena<N>) -> bool
    where
        T: Kind<N>,
    {
        self.resolve(arena).is_none()
    }

    /// The target as kind `T`, if the link resolves.
    pub fn get<'a, N>(&self, arena: &'a Arena<N>) -> Option<&'a T>
    where
        T: Kind<N>,
    {
        self.id.and_then(|id| arena.get(id)).and_then(T::narrow)
    }

    /// The target as kind `T`.
    ///
    /// Fails with [`TreeError::OutOfRange`] if the link is unset or expired.
    pub fn deref<'a, N>(&self, arena: &'a Arena<N>) -> Result<&'a T>
    where
        T: Kind<N>,
    {
        self.get(arena).ok_or_else(|| self.deref_error())
    }

    /// Mutable counterpart of [`OptLink::deref`].
    pub fn deref_mut<'a, N>(&self, arena: &'a mut Arena<N>) -> Result<&'a mut T>
    where
        T: Kind<N>,
    {
        self.id
            .and_then(|id| arena.get_mut(id))
            .and_then(T::narrow_mut)
            .ok_or_else(|| self.deref_error())
    }

    fn deref_error(&self) -> TreeError {
        match self.id {
            None => TreeError::OutOfRange(format!(
                "dereferencing empty link of type {}",
                element_type::<T>()
            )),
            Some(id) => TreeError::OutOfRange(format!(
                "link of type {} to node {id} has expired",
                element_type::<T>()
            )),
        }
    }

    /// Returns whether this link resolves to `candidate`'s node.
    pub fn links_to<N>(&self, arena: &Arena<N>, candidate: impl Target) -> bool
    where
        T: Kind<N>,
    {
        match (self.resolve(arena), candidate.target()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Re-types the target as an owning-edge view of kind `S`.
    ///
    /// Empty if the link does not resolve or the target is not an `S`.
    pub fn cast<S, N>(&self, arena: &Arena<N>) -> Maybe<S>
    where
        T: Kind<N>,
        S: Kind<N>,
    {
        match self.resolve(arena) {
            Some(id) if arena.get(id).and_then(S::narrow).is_some() => Maybe::from_id(id),
            _ => Maybe::new(),
        }
    }

    /// Link equality.
    ///
    /// Both links must be empty or both must resolve. Within one arena the
    /// targets must be the same node. Across arenas, with no tree to locate
    /// the targets in, they only need to share a kind. Links compared as
    /// part of a tree through [`Maybe::value_eq`] match by target position
    /// instead, see [`Equivalence::targets_eq`].
    pub fn value_eq<N: Node>(&self, arena: &Arena<N>, other: &Self, other_arena: &Arena<N>) -> bool
    where
        T: Kind<N>,
    {
        self.equivalent(other, &Equivalence::unnumbered(arena, other_arena))
    }

    /// [`OptLink::value_eq`] inside an existing comparison.
    pub fn equivalent<N: Node>(&self, other: &Self, eq: &Equivalence<'_, N>) -> bool
    where
        T: Kind<N>,
    {
        eq.targets_eq(self.resolve(eq.left()), other.resolve(eq.right()))
    }

    /// Calls `visit` on the target if the link resolves. The target's
    /// children are not visited; the owning edges reach those.
    pub fn visit<N>(&self, arena: &Arena<N>, visit: &mut dyn FnMut(NodeId, &N))
    where
        T: Kind<N>,
    {
        if let Some((id, node)) = self.resolve(arena).and_then(|id| arena.get(id).map(|node| (id, node))) {
            visit(id, node);
        }
    }

    /// Writes this link into `map`.
    pub fn serialize<N>(&self, arena: &Arena<N>, map: &mut MapWriter, ids: &PointerMap) -> Result<()>
    where
        T: Kind<N>,
    {
        self.serialize_tagged(TAG_OPT_LINK, arena, map, ids)
    }

    /// Reads a link written by [`OptLink::serialize`].
    ///
    /// The returned link is unset. Its target id is queued in `ids` and filled
    /// in by [`IdentifierMap::restore_links`] once every node is decoded.
    pub fn deserialize(map: &MapReader<'_>, ids: &mut IdentifierMap) -> Result<Self> {
        Self::deserialize_tagged(TAG_OPT_LINK, map, ids)
    }

    fn serialize_tagged<N>(
        &self,
        tag: &str,
        arena: &Arena<N>,
        map: &mut MapWriter,
        ids: &PointerMap,
    ) -> Result<()>
    where
        T: Kind<N>,
    {
        map.append_string(KEY_TAG, tag);
        if let Some(id) = self.resolve(arena) {
            map.append_int(KEY_LINK, seq_to_wire(ids.get(id, element_type::<T>())?)?);
        }
        Ok(())
    }

    fn deserialize_tagged(tag: &str, map: &MapReader<'_>, ids: &mut IdentifierMap) -> Result<Self> {
        check_tag(map, tag)?;
        let target = match map.get(KEY_LINK) {
            Some(raw) => Some(wire_to_seq(raw.as_int()?)?),
            None => None,
        };
        ids.register_link(target)?;
        Ok(Self::new())
    }

    /// Phase-2 check shared with [`Link`]; `true` when the link resolved.
    fn check_target<N: Node>(&self, arena: &Arena<N>, map: &PointerMap) -> Result<bool>
    where
        T: Kind<N>,
    {
        let Some((id, node)) = self.id.and_then(|id| arena.get(id).map(|node| (id, node))) else {
            return Ok(false);
        };
        if T::narrow(node).is_none() {
            return Err(TreeError::NotWellFormed(format!(
                "link of type {} points at a node of kind '{}'",
                element_type::<T>(),
                node.kind_name()
            )));
        }
        map.get(id, element_type::<T>())?;
        Ok(true)
    }
}

impl<T> LinkBase for OptLink<T> {
    fn restore(&mut self, target: NodeId) {
        self.id = Some(target);
    }

    fn element_type(&self) -> &'static str {
        element_type::<T>()
    }
}

impl<N, T> Completable<N> for OptLink<T>
where
    N: Node,
    T: Kind<N>,
{
    fn find_reachable(&self, _arena: &Arena<N>, _map: &mut PointerMap) -> Result<()> {
        Ok(())
    }

    fn check_complete(&self, arena: &Arena<N>, map: &PointerMap) -> Result<()> {
        self.check_target(arena, map).map(|_| ())
    }
}

impl<T> Clone for OptLink<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for OptLink<T> {}

impl<T> Default for OptLink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for OptLink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "OptLink({id})"),
            None => f.write_str("OptLink(-)"),
        }
    }
}

impl<T> PartialEq for OptLink<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for OptLink<T> {}

impl<T> PartialOrd for OptLink<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for OptLink<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl<T> Hash for OptLink<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> Target for OptLink<T> {
    fn target(&self) -> Option<NodeId> {
        self.id
    }
}

/// Mandatory non-owning reference to a node of kind `T`.
///
/// Dereferences to [`OptLink`]; an unset or expired `Link` fails the
/// completeness check. Tagged `$` on the wire.
pub struct Link<T>(OptLink<T>);

impl<T> Link<T> {
    /// A link that is not filled in yet.
    pub const fn new() -> Self {
        Self(OptLink::new())
    }

    /// A link to the node behind `id`.
    pub const fn from_id(id: NodeId) -> Self {
        Self(OptLink::from_id(id))
    }

    /// Writes this link into `map`.
    pub fn serialize<N>(&self, arena: &Arena<N>, map: &mut MapWriter, ids: &PointerMap) -> Result<()>
    where
        T: Kind<N>,
    {
        self.0.serialize_tagged(TAG_LINK, arena, map, ids)
    }

    /// Reads a link written by [`Link::serialize`]; see [`OptLink::deserialize`].
    pub fn deserialize(map: &MapReader<'_>, ids: &mut IdentifierMap) -> Result<Self> {
        OptLink::deserialize_tagged(TAG_LINK, map, ids).map(Self)
    }
}

impl<T> std::ops::Deref for Link<T> {
    type Target = OptLink<T>;

    fn deref(&self) -> &OptLink<T> {
        &self.0
    }
}

impl<T> std::ops::DerefMut for Link<T> {
    fn deref_mut(&mut self) -> &mut OptLink<T> {
        &mut self.0
    }
}

impl<T> LinkBase for Link<T> {
    fn restore(&mut self, target: NodeId) {
        self.0.restore(target);
    }

    fn element_type(&self) -> &'static str {
        element_type::<T>()
    }
}

impl<N, T> Completable<N> for Link<T>
where
    N: Node,
    T: Kind<N>,
{
    fn find_reachable(&self, _arena: &Arena<N>, _map: &mut PointerMap) -> Result<()> {
        Ok(())
    }

    fn check_complete(&self, arena: &Arena<N>, map: &PointerMap) -> Result<()> {
        if self.0.check_target(arena, map)? {
            Ok(())
        } else {
            Err(TreeError::NotWellFormed(format!(
                "'Link' edge of type {} is empty",
                element_type::<T>()
            )))
        }
    }
}

impl<T> Clone for Link<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Link<T> {}

impl<T> Default for Link<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Link<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.id {
            Some(id) => write!(f, "Link({id})"),
            None => f.write_str("Link(-)"),
        }
    }
}

impl<T> PartialEq for Link<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for Link<T> {}

impl<T> PartialOrd for Link<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Link<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> Hash for Link<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T> Target for Link<T> {
    fn target(&self) -> Option<NodeId> {
        self.0.id
    }
}

impl<T> From<Link<T>> for OptLink<T> {
    fn from(link: Link<T>) -> Self {
        link.0
    }
}

impl<T> From<OptLink<T>> for Link<T> {
    fn from(link: OptLink<T>) -> Self {
        Self(link)
    }
}
