// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Context for structural equality between two trees.
//!
//! Owning edges compare their nodes field by field. Links cannot, since a
//! link may point back at an ancestor. Instead each side is numbered the way
//! phase 1 of the well-formedness check numbers it, and two links are equal
//! when their targets carry the same sequence number. A link target in the
//! same arena under the same handle is always equal to itself.

use tracing::trace;

use crate::arena::{Arena, NodeId};
use crate::node::Node;
use crate::pointer_map::{Completable, PointerMap};

/// Both arenas of a comparison plus the node numbering of each compared root.
#[derive(Debug)]
pub struct Equivalence<'a, N> {
    left: &'a Arena<N>,
    right: &'a Arena<N>,
    left_ids: PointerMap,
    right_ids: PointerMap,
}

impl<'a, N: Node> Equivalence<'a, N> {
    /// Numbers the nodes under `left_root` and `right_root`.
    ///
    /// Numbering stops at the first node owned twice. Nodes past that point
    /// compare as if they were outside the tree.
    pub fn new(
        left: &'a Arena<N>,
        left_root: &dyn Completable<N>,
        right: &'a Arena<N>,
        right_root: &dyn Completable<N>,
    ) -> Self {
        Self {
            left,
            right,
            left_ids: number(left, left_root),
            right_ids: number(right, right_root),
        }
    }

    /// A context with no numbering, for comparing edges on their own.
    pub fn unnumbered(left: &'a Arena<N>, right: &'a Arena<N>) -> Self {
        Self {
            left,
            right,
            left_ids: PointerMap::new(),
            right_ids: PointerMap::new(),
        }
    }

    /// Arena holding the left-hand nodes.
    pub fn left(&self) -> &'a Arena<N> {
        self.left
    }

    /// Arena holding the right-hand nodes.
    pub fn right(&self) -> &'a Arena<N> {
        self.right
    }

    /// Returns whether both sides share one arena.
    pub fn same_arena(&self) -> bool {
        std::ptr::eq(self.left, self.right)
    }

    /// Compares two resolved link targets.
    ///
    /// Numbered targets match by sequence number. A target numbered on one
    /// side only never matches. Targets outside both numberings match by
    /// handle within one arena and by kind name across arenas.
    pub fn targets_eq(&self, lhs: Option<NodeId>, rhs: Option<NodeId>) -> bool {
        let (lhs, rhs) = match (lhs, rhs) {
            (None, None) => return true,
            (Some(lhs), Some(rhs)) => (lhs, rhs),
            _ => return false,
        };
        if self.same_arena() && lhs == rhs {
            return true;
        }
        match (self.left_ids.seq(lhs), self.right_ids.seq(rhs)) {
            (Some(a), Some(b)) => a == b,
            (None, None) if !self.same_arena() => {
                match (self.left.get(lhs), self.right.get(rhs)) {
                    (Some(a), Some(b)) => a.kind_name() == b.kind_name(),
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

fn number<N>(arena: &Arena<N>, root: &dyn Completable<N>) -> PointerMap {
    let mut ids = PointerMap::new();
    if let Err(err) = root.find_reachable(arena, &mut ids) {
        trace!(%err, numbered = ids.len(), "numbering stopped early");
    }
    ids
}
