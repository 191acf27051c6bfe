// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Sequence ids seen while decoding, and the links waiting on them.
//!
//! A link can point at a node that is decoded later (a back-link to an
//! ancestor, or a cross-link to a later sibling), so links are not resolved
//! while decoding. Each decoded link instead reserves a slot: the position of
//! the link among its owner's link fields. Once the whole tree is decoded,
//! [`IdentifierMap::restore_links`] walks [`Node::links_mut`] of each owner
//! and fills in the reserved slots.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::arena::{Arena, NodeId};
use crate::error::{Result, TreeError};
use crate::node::Node;

#[derive(Debug, Clone, Copy)]
struct PendingLink {
    owner: NodeId,
    slot: usize,
    target: usize,
}

/// Decoding state: sequence id to node, plus unresolved links.
#[derive(Debug, Default)]
pub struct IdentifierMap {
    nodes: FxHashMap<usize, NodeId>,
    /// One frame per node currently being decoded; each holds the link
    /// targets read so far for that node, in slot order.
    frames: Vec<Vec<Option<usize>>>,
    pending: Vec<PendingLink>,
}

impl IdentifierMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a frame for a node whose fields are about to be decoded.
    pub(crate) fn begin_node(&mut self) {
        self.frames.push(Vec::new());
    }

    /// Closes the innermost frame: records `owner` under `seq` and queues
    /// the frame's links against it.
    pub(crate) fn end_node(&mut self, owner: NodeId, seq: usize) -> Result<()> {
        let links = self.frames.pop().unwrap_or_default();
        if self.nodes.insert(seq, owner).is_some() {
            return Err(TreeError::NotWellFormed(format!(
                "sequence id {seq} appears more than once"
            )));
        }
        self.pending.extend(
            links
                .into_iter()
                .enumerate()
                .filter_map(|(slot, target)| {
                    target.map(|target| PendingLink {
                        owner,
                        slot,
                        target,
                    })
                }),
        );
        Ok(())
    }

    /// Reserves the next link slot of the node being decoded. `None` keeps
    /// the slot empty.
    pub(crate) fn register_link(&mut self, target: Option<usize>) -> Result<()> {
        let frame = self.frames.last_mut().ok_or_else(|| {
            TreeError::NotWellFormed("link decoded outside of any node".into())
        })?;
        frame.push(target);
        Ok(())
    }

    /// Node decoded under sequence id `seq`.
    pub fn get(&self, seq: usize) -> Option<NodeId> {
        self.nodes.get(&seq).copied()
    }

    /// Number of nodes decoded so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether no node has been decoded.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of links waiting for [`IdentifierMap::restore_links`].
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Points every queued link at its decoded target.
    ///
    /// Fails with [`TreeError::NotWellFormed`] if a link names a sequence id
    /// that was never decoded. Returns the number of links restored.
    pub fn restore_links<N: Node>(&mut self, arena: &mut Arena<N>) -> Result<usize> {
        let pending = std::mem::take(&mut self.pending);
        for link in &pending {
            let target = self.get(link.target).ok_or_else(|| {
                TreeError::NotWellFormed(format!(
                    "link refers to unknown sequence id {}",
                    link.target
                ))
            })?;
            let owner = arena.get_mut(link.owner).ok_or_else(|| {
                TreeError::NotWellFormed(format!("link owner {} is gone", link.owner))
            })?;
            let mut slot = 0;
            let mut restored = false;
            owner.links_mut(&mut |field| {
                if slot == link.slot {
                    trace!(
                        owner = %link.owner,
                        slot,
                        %target,
                        element_type = field.element_type(),
                        "restored link"
                    );
                    field.restore(target);
                    restored = true;
                }
                slot += 1;
            });
            if !restored {
                return Err(TreeError::NotWellFormed(format!(
                    "node {} has no link slot {}",
                    link.owner, link.slot
                )));
            }
        }
        Ok(pending.len())
    }
}
