// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identity map and the two-phase well-formedness check.
//!
//! Phase 1 ([`Completable::find_reachable`]) walks owning edges only and
//! numbers every node it meets in DFS pre-order. Seeing a node twice means two
//! owning edges share it, which breaks the tree shape, so the walk stops there.
//!
//! Phase 2 ([`Completable::check_complete`]) checks that mandatory edges are
//! filled and that every link resolves to a node numbered in phase 1. A link
//! whose target is missing from the map is dangling or points into another
//! graph; the lookup failure is the only way either is detected.
//!
//! The numbering from phase 1 doubles as the sequence ids written on the wire.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::arena::{Arena, NodeId};
use crate::error::{Result, TreeError};

/// Sequence numbers for every node reachable from one root.
///
/// Built fresh for each validation or serialization pass.
#[derive(Debug, Clone, Default)]
pub struct PointerMap {
    map: FxHashMap<NodeId, usize>,
}

impl PointerMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id` under the next sequence number.
    ///
    /// Fails with [`TreeError::NotWellFormed`] if `id` was already registered;
    /// `element_type` names the owning edge's element type in the message.
    pub fn add(&mut self, id: NodeId, element_type: &str) -> Result<usize> {
        let seq = self.map.len();
        if self.map.insert(id, seq).is_some() {
            return Err(TreeError::NotWellFormed(format!(
                "duplicate node {id} of type {element_type} is owned by more than one edge"
            )));
        }
        Ok(seq)
    }

    /// Sequence number of a previously registered node.
    ///
    /// Fails with [`TreeError::NotWellFormed`] if `id` is not reachable from
    /// the root this map was built for.
    pub fn get(&self, id: NodeId, element_type: &str) -> Result<usize> {
        self.map.get(&id).copied().ok_or_else(|| {
            TreeError::NotWellFormed(format!(
                "link to node {id} of type {element_type} does not resolve to a node reachable from the root"
            ))
        })
    }

    /// Sequence number of `id`, if it was registered.
    pub fn seq(&self, id: NodeId) -> Option<usize> {
        self.map.get(&id).copied()
    }

    /// Returns whether `id` was registered.
    pub fn contains(&self, id: NodeId) -> bool {
        self.map.contains_key(&id)
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns whether nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Structural traversal shared by nodes and edges.
///
/// Generated node types implement both methods by forwarding to each of
/// their edge fields in declaration order.
pub trait Completable<N> {
    /// Phase 1: registers every node reachable through owning edges.
    fn find_reachable(&self, arena: &Arena<N>, map: &mut PointerMap) -> Result<()>;

    /// Phase 2: checks mandatory edges and link targets against `map`.
    fn check_complete(&self, arena: &Arena<N>, map: &PointerMap) -> Result<()>;

    /// Runs both phases with this value as the root.
    fn check_well_formed(&self, arena: &Arena<N>) -> Result<()> {
        let mut map = PointerMap::new();
        self.find_reachable(arena, &mut map)?;
        self.check_complete(arena, &map)
    }

    /// Like [`Completable::check_well_formed`], but reports failure as `false`.
    fn is_well_formed(&self, arena: &Arena<N>) -> bool {
        match self.check_well_formed(arena) {
            Ok(()) => true,
            Err(err) => {
                debug!(%err, "tree is not well-formed");
                false
            }
        }
    }
}
