// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Zero-or-more and one-or-more owning sequence edges.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use tree_cbor::{MapReader, MapWriter};

use crate::arena::{Arena, NodeId};
use crate::edge::{check_tag, KEY_DATA, KEY_TAG, TAG_ANY, TAG_MANY};
use crate::equivalence::Equivalence;
use crate::error::{Result, TreeError};
use crate::identifier_map::IdentifierMap;
use crate::maybe::{Maybe, One};
use crate::node::{element_type, Kind, Node, Target};
use crate::pointer_map::{Completable, PointerMap};

/// Ordered owning edge to any number of nodes of kind `T`.
///
/// Elements are [`One`] edges and keep insertion order.
pub struct Any<T> {
    items: Vec<One<T>>,
}

/// Maps a caller position onto `0..len`; negative or out-of-range means "last".
fn position(pos: isize, len: usize) -> Option<usize> {
    usize::try_from(pos).ok().filter(|p| *p < len)
}

impl<T> Any<T> {
    /// An empty sequence.
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Returns whether the sequence has no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Appends `target`. An empty target is ignored.
    pub fn add(&mut self, target: impl Target) {
        if let Some(id) = target.target() {
            self.items.push(One::from_id(id));
        }
    }

    /// Inserts `target` before `pos`. A negative or out-of-range `pos`
    /// appends. An empty target is ignored.
    pub fn add_at(&mut self, target: impl Target, pos: isize) {
        let Some(id) = target.target() else {
            return;
        };
        match position(pos, self.items.len()) {
            Some(at) => self.items.insert(at, One::from_id(id)),
            None => self.items.push(One::from_id(id)),
        }
    }

    /// Moves `node` into `arena` and appends an edge to it.
    pub fn emplace<N>(&mut self, arena: &mut Arena<N>, node: T) -> One<T>
    where
        T: Into<N> + Kind<N>,
    {
        let one = One::from_id(arena.insert(node.into()));
        self.items.push(one);
        one
    }

    /// Appends every element of `other`. The same nodes are referenced, so
    /// keeping both sequences in one tree aliases them.
    pub fn extend(&mut self, other: &Self) {
        self.items.extend(other.items.iter().copied());
    }

    /// Removes and returns the element at `pos`. A negative or out-of-range
    /// `pos` removes the last element; an empty sequence is left alone.
    pub fn remove(&mut self, pos: isize) -> Option<One<T>> {
        match position(pos, self.items.len()) {
            Some(at) => Some(self.items.remove(at)),
            None => self.items.pop(),
        }
    }

    /// Removes every element.
    pub fn reset(&mut self) {
        self.items.clear();
    }

    /// Element at `index`; fails with [`TreeError::OutOfRange`] past the end.
    pub fn at(&self, index: usize) -> Result<&One<T>> {
        let len = self.items.len();
        self.items
            .get(index)
            .ok_or_else(|| index_error(index, len))
    }

    /// Mutable element at `index`; fails with [`TreeError::OutOfRange`] past the end.
    pub fn at_mut(&mut self, index: usize) -> Result<&mut One<T>> {
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or_else(|| index_error(index, len))
    }

    /// First element, or an empty edge.
    pub fn front(&self) -> Maybe<T> {
        self.items.first().map_or_else(Maybe::new, One::as_maybe)
    }

    /// Last element, or an empty edge.
    pub fn back(&self) -> Maybe<T> {
        self.items.last().map_or_else(Maybe::new, One::as_maybe)
    }

    /// Iterates over the element edges in order.
    pub fn iter(&self) -> std::slice::Iter<'_, One<T>> {
        self.items.iter()
    }

    /// Iterates mutably over the element edges in order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, One<T>> {
        self.items.iter_mut()
    }

    /// The nodes of the sequence as kind `T`, skipping stale handles.
    pub fn nodes<'a, N>(&'a self, arena: &'a Arena<N>) -> impl Iterator<Item = &'a T> + 'a
    where
        T: Kind<N>,
    {
        self.items.iter().filter_map(move |one| one.get(arena))
    }

    /// Element-wise [`Maybe::value_eq`]; lengths must match.
    pub fn value_eq<N: Node>(&self, arena: &Arena<N>, other: &Self, other_arena: &Arena<N>) -> bool
    where
        T: Kind<N>,
    {
        self.equivalent(other, &Equivalence::new(arena, self, other_arena, other))
    }

    /// [`Any::value_eq`] inside an existing comparison.
    pub fn equivalent<N: Node>(&self, other: &Self, eq: &Equivalence<'_, N>) -> bool {
        self.items.len() == other.items.len()
            && self
                .items
                .iter()
                .zip(&other.items)
                .all(|(a, b)| a.as_maybe().equivalent(&b.as_maybe(), eq))
    }

    /// [`Maybe::visit`] on every element, in order.
    pub fn visit<N>(&self, arena: &Arena<N>, visit: &mut dyn FnMut(NodeId, &N))
    where
        N: Node,
        T: Kind<N>,
    {
        for one in &self.items {
            one.as_maybe().visit(arena, visit);
        }
    }

    /// Shallow copy of every element, in order.
    pub fn copy<N: Node>(&self, arena: &mut Arena<N>) -> Result<Self> {
        let items = self
            .items
            .iter()
            .map(|one| one.copy(arena))
            .collect::<Result<_>>()?;
        Ok(Self { items })
    }

    /// Deep clone of every element subtree, in order.
    pub fn deep_clone<N: Node>(&self, arena: &mut Arena<N>) -> Result<Self> {
        let items = self
            .items
            .iter()
            .map(|one| one.deep_clone(arena))
            .collect::<Result<_>>()?;
        Ok(Self { items })
    }

    /// Writes this edge into `map`.
    pub fn serialize<N>(&self, arena: &Arena<N>, map: &mut MapWriter, ids: &PointerMap) -> Result<()>
    where
        N: Node,
        T: Kind<N>,
    {
        self.serialize_tagged(TAG_ANY, arena, map, ids)
    }

    /// Reads an edge written by [`Any::serialize`].
    pub fn deserialize<N>(
        map: &MapReader<'_>,
        arena: &mut Arena<N>,
        ids: &mut IdentifierMap,
    ) -> Result<Self>
    where
        N: Node,
        T: Kind<N>,
    {
        Self::deserialize_tagged(TAG_ANY, map, arena, ids)
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
        map.append_array(KEY_DATA, |array| {
            for one in &self.items {
                array.append_map(|item| one.serialize(arena, item, ids))?;
            }
            Ok(())
        })
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
        let data = map.at(KEY_DATA)?.as_array()?;
        let mut items = Vec::with_capacity(data.len());
        for item in data.iter() {
            items.push(One::deserialize(&item.as_map()?, arena, ids)?);
        }
        Ok(Self { items })
    }
}

fn index_error(index: usize, len: usize) -> TreeError {
    TreeError::OutOfRange(format!("index {index} out of range for sequence of length {len}"))
}

impl<N, T> Completable<N> for Any<T>
where
    N: Node,
    T: Kind<N>,
{
    fn find_reachable(&self, arena: &Arena<N>, map: &mut PointerMap) -> Result<()> {
        self.items
            .iter()
            .try_for_each(|one| one.find_reachable(arena, map))
    }

    fn check_complete(&self, arena: &Arena<N>, map: &PointerMap) -> Result<()> {
        self.items
            .iter()
            .try_for_each(|one| one.check_complete(arena, map))
    }
}

impl<T> Clone for Any<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

impl<T> Default for Any<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Any<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.items.iter().filter_map(|one| one.id()))
            .finish()
    }
}

impl<T> PartialEq for Any<T> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<T> Eq for Any<T> {}

impl<T> PartialOrd for Any<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Any<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.items.cmp(&other.items)
    }
}

impl<T> Hash for Any<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.items.hash(state);
    }
}

impl<'a, T> IntoIterator for &'a Any<T> {
    type Item = &'a One<T>;
    type IntoIter = std::slice::Iter<'a, One<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Any<T> {
    type Item = &'a mut One<T>;
    type IntoIter = std::slice::IterMut<'a, One<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter_mut()
    }
}

impl<T> FromIterator<NodeId> for Any<T> {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(One::from_id).collect(),
        }
    }
}

/// Ordered owning edge to at least one node of kind `T`.
///
/// Behaves like [`Any`] (and dereferences to it); an empty `Many` fails the
/// completeness check. Tagged `+` on the wire.
pub struct Many<T>(Any<T>);

impl<T> Many<T> {
    /// A sequence that is not filled in yet.
    pub const fn new() -> Self {
        Self(Any::new())
    }

    /// Writes this edge into `map`.
    pub fn serialize<N>(&self, arena: &Arena<N>, map: &mut MapWriter, ids: &PointerMap) -> Result<()>
    where
        N: Node,
        T: Kind<N>,
    {
        self.0.serialize_tagged(TAG_MANY, arena, map, ids)
    }

    /// Reads an edge written by [`Many::serialize`].
    pub fn deserialize<N>(
        map: &MapReader<'_>,
        arena: &mut Arena<N>,
        ids: &mut IdentifierMap,
    ) -> Result<Self>
    where
        N: Node,
        T: Kind<N>,
    {
        Any::deserialize_tagged(TAG_MANY, map, arena, ids).map(Self)
    }

    /// Shallow copy of every element, in order.
    pub fn copy<N: Node>(&self, arena: &mut Arena<N>) -> Result<Self> {
        self.0.copy(arena).map(Self)
    }

    /// Deep clone of every element subtree, in order.
    pub fn deep_clone<N: Node>(&self, arena: &mut Arena<N>) -> Result<Self> {
        self.0.deep_clone(arena).map(Self)
    }
}

impl<T> std::ops::Deref for Many<T> {
    type Target = Any<T>;

    fn deref(&self) -> &Any<T> {
        &self.0
    }
}

impl<T> std::ops::DerefMut for Many<T> {
    fn deref_mut(&mut self) -> &mut Any<T> {
        &mut self.0
    }
}

impl<N, T> Completable<N> for Many<T>
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
                "'Many' edge of type {} is empty",
                element_type::<T>()
            )));
        }
        self.0.check_complete(arena, map)
    }
}

impl<T> Clone for Many<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Default for Many<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Many<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Many").field(&self.0).finish()
    }
}

impl<T> PartialEq for Many<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T> Eq for Many<T> {}

impl<T> PartialOrd for Many<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Many<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> Hash for Many<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<'a, T> IntoIterator for &'a Many<T> {
    type Item = &'a One<T>;
    type IntoIter = std::slice::Iter<'a, One<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.items.iter()
    }
}

impl<T> FromIterator<NodeId> for Many<T> {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T> From<Many<T>> for Any<T> {
    fn from(many: Many<T>) -> Self {
        many.0
    }
}

impl<T> From<Any<T>> for Many<T> {
    fn from(any: Any<T>) -> Self {
        Self(any)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::fixture::{tn, Tn};

    fn values(seq: &Any<Tn>, arena: &Arena<Tn>) -> Vec<i64> {
        seq.nodes(arena).map(|n| n.value).collect()
    }

    #[test]
    fn positions_clamp_to_append_and_remove_last() {
        let mut arena: Arena<Tn> = Arena::new();
        let mut seq: Any<Tn> = Any::new();
        seq.add(tn(&mut arena, 1));
        seq.add(tn(&mut arena, 3));
        seq.add_at(tn(&mut arena, 2), 1);
        seq.add_at(tn(&mut arena, 4), -1);
        seq.add_at(tn(&mut arena, 5), 99);
        assert_eq!(values(&seq, &arena), vec![1, 2, 3, 4, 5]);

        seq.remove(-1);
        seq.remove(0);
        seq.remove(42);
        assert_eq!(values(&seq, &arena), vec![2, 3]);

        let mut empty: Any<Tn> = Any::new();
        assert!(empty.remove(0).is_none());
        assert!(empty.remove(-1).is_none());
    }

    #[test]
    fn empty_targets_are_ignored() {
        let mut seq: Any<Tn> = Any::new();
        seq.add(Maybe::<Tn>::new());
        seq.add_at(None::<NodeId>, 0);
        assert!(seq.is_empty());
    }

    #[test]
    fn at_is_bounds_checked_and_front_back_are_soft() {
        let mut arena: Arena<Tn> = Arena::new();
        let mut seq: Any<Tn> = Any::new();
        assert!(seq.front().is_empty());
        assert!(seq.back().is_empty());
        assert!(seq.at(0).expect_err("empty").is_out_of_range());

        let first = seq.emplace(&mut arena, Tn::new(10));
        seq.emplace(&mut arena, Tn::new(20));
        assert_eq!(seq.at(0).ok().copied(), Some(first));
        assert!(seq.at(2).expect_err("past end").is_out_of_range());
        assert_eq!(seq.front().id(), first.id());
        assert_eq!(seq.back().deref(&arena).map(|n| n.value).ok(), Some(20));
    }

    #[test]
    fn extend_shares_elements() {
        let mut arena: Arena<Tn> = Arena::new();
        let mut a: Any<Tn> = Any::new();
        a.emplace(&mut arena, Tn::new(1));
        let mut b: Any<Tn> = Any::new();
        b.extend(&a);
        assert_eq!(a.front(), b.front());
    }

    #[test]
    fn empty_many_is_not_well_formed() {
        let mut arena: Arena<Tn> = Arena::new();
        let mut many: Many<Tn> = Many::new();
        let err = many.check_well_formed(&arena).expect_err("empty");
        assert!(err.to_string().contains("'Many' edge of type"), "{err}");

        many.emplace(&mut arena, Tn::new(1));
        assert!(many.check_well_formed(&arena).is_ok());
        many.reset();
        assert!(!many.is_well_formed(&arena));
    }

    #[test]
    fn value_eq_is_elementwise() {
        let mut arena: Arena<Tn> = Arena::new();
        let a: Any<Tn> = [tn(&mut arena, 1), tn(&mut arena, 2)].into_iter().collect();
        let b: Any<Tn> = [tn(&mut arena, 1), tn(&mut arena, 2)].into_iter().collect();
        let c: Any<Tn> = [tn(&mut arena, 1)].into_iter().collect();
        assert_ne!(a, b);
        assert!(a.value_eq(&arena, &b, &arena));
        assert!(!a.value_eq(&arena, &c, &arena));
    }

    #[test]
    fn copy_and_deep_clone_keep_order() {
        let mut arena: Arena<Tn> = Arena::new();
        let mut seq: Any<Tn> = Any::new();
        for v in 1..=3 {
            seq.emplace(&mut arena, Tn::new(v));
        }
        let shallow = seq.copy(&mut arena).expect("copy");
        let deep = seq.deep_clone(&mut arena).expect("clone");
        assert_eq!(values(&shallow, &arena), vec![1, 2, 3]);
        assert_eq!(values(&deep, &arena), vec![1, 2, 3]);
        assert_eq!(arena.len(), 9);
        for (a, b) in seq.iter().zip(&deep) {
            assert_ne!(a.id(), b.id());
        }
    }
}
