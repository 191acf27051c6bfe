// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Generational node arena.
//!
//! The arena owns every node of a graph. Edges hold [`NodeId`] handles into
//! it. A handle stays valid until its node is removed; the slot's generation
//! is then bumped, so stale handles (and the links holding them) stop
//! resolving instead of aliasing whatever reuses the slot.

use std::fmt;

use tracing::debug;

use crate::error::{Result, TreeError};
use crate::pointer_map::{Completable, PointerMap};

/// Stable handle to a node in an [`Arena`].
///
/// Ordering and hashing follow `(index, generation)`. The order is arbitrary
/// but stable for the life of the arena and is never persisted.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Slot index inside the arena.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation of the slot when this handle was issued.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}v{}", self.index, self.generation)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone)]
struct Slot<N> {
    generation: u32,
    node: Option<N>,
}

/// Storage for the nodes of one or more trees.
#[derive(Debug, Clone)]
pub struct Arena<N> {
    slots: Vec<Slot<N>>,
    free: Vec<u32>,
    len: usize,
    slot_limit: u32,
}

impl<N> Default for Arena<N> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<N> Arena<N> {
    /// Creates an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty arena with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
            slot_limit: u32::MAX,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_slot_limit(slot_limit: u32) -> Self {
        Self {
            slot_limit,
            ..Self::default()
        }
    }

    fn has_room(&self) -> bool {
        !self.free.is_empty() || self.slots.len() < self.slot_limit as usize
    }

    /// Moves `node` into the arena and returns its handle.
    ///
    /// # Panics
    ///
    /// Panics if every slot index is in use. Paths fed by untrusted input
    /// use [`Arena::try_insert`] instead.
    pub fn insert(&mut self, node: N) -> NodeId {
        assert!(self.has_room(), "arena slot space exhausted");
        self.insert_unchecked(node)
    }

    /// Fallible [`Arena::insert`].
    ///
    /// Fails with [`TreeError::OutOfRange`] if every slot index is in use.
    pub fn try_insert(&mut self, node: N) -> Result<NodeId> {
        if !self.has_room() {
            return Err(TreeError::OutOfRange(format!(
                "arena slot space exhausted at {} slots",
                self.slots.len()
            )));
        }
        Ok(self.insert_unchecked(node))
    }

    fn insert_unchecked(&mut self, node: N) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            self.len += 1;
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        #[allow(clippy::cast_possible_truncation)]
        let index = self.slots.len() as u32;
        self.len += 1;
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    fn slot(&self, id: NodeId) -> Option<&Slot<N>> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
    }

    /// Returns the node behind `id`, or `None` if it was removed.
    pub fn get(&self, id: NodeId) -> Option<&N> {
        self.slot(id).and_then(|slot| slot.node.as_ref())
    }

    /// Mutable access to the node behind `id`.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut N> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Returns whether `id` still refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Removes and returns the node behind `id`. Every handle to it expires.
    pub fn remove(&mut self, id: NodeId) -> Option<N> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(node)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the arena holds no live nodes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over live nodes in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &N)> {
        self.slots.iter().zip(0u32..).filter_map(|(slot, index)| {
            slot.node.as_ref().map(|node| {
                (
                    NodeId {
                        index,
                        generation: slot.generation,
                    },
                    node,
                )
            })
        })
    }

    /// Handles of all live nodes in slot order.
    pub fn ids(&self) -> Vec<NodeId> {
        self.iter().map(|(id, _)| id).collect()
    }

    /// Reclaims every node not reachable through owning edges from `roots`.
    ///
    /// This is the arena's notion of "the last owner went away": links into
    /// swept nodes expire. Fails without removing anything if a root's owning
    /// edges alias a node. Returns the number of nodes removed.
    pub fn retain_reachable(&mut self, roots: &[&dyn Completable<N>]) -> Result<usize> {
        let mut reachable = PointerMap::new();
        for root in roots {
            root.find_reachable(self, &mut reachable)?;
        }
        let dead: Vec<NodeId> = self
            .iter()
            .map(|(id, _)| id)
            .filter(|id| !reachable.contains(*id))
            .collect();
        for id in &dead {
            self.remove(*id);
        }
        debug!(
            removed = dead.len(),
            live = self.len,
            "swept unreachable nodes"
        );
        Ok(dead.len())
    }
}
