// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Serialize and deserialize entry points.
//!
//! Serialization validates first (both phases) and only then emits, so a
//! tree that is not well-formed never reaches the wire. Deserialization
//! decodes, restores links, and validates; there is no partial result.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::debug;
use tree_cbor::{CodecConfig, Document, MapWriter};

use crate::arena::Arena;
use crate::error::Result;
use crate::identifier_map::IdentifierMap;
use crate::maybe::Maybe;
use crate::node::{Kind, Node};
use crate::pointer_map::{Completable, PointerMap};

/// A decoded (or assembled) tree: its arena plus the root edge.
#[derive(Debug, Clone)]
pub struct Tree<N, T = N> {
    arena: Arena<N>,
    root: Maybe<T>,
}

impl<N, T> Tree<N, T>
where
    N: Node,
    T: Kind<N>,
{
    /// Bundles an arena with a root edge. Nothing is validated.
    pub fn new(arena: Arena<N>, root: impl Into<Maybe<T>>) -> Self {
        Self {
            arena,
            root: root.into(),
        }
    }

    /// The arena holding every node.
    pub fn arena(&self) -> &Arena<N> {
        &self.arena
    }

    /// Mutable access to the arena.
    pub fn arena_mut(&mut self) -> &mut Arena<N> {
        &mut self.arena
    }

    /// The root edge.
    pub fn root(&self) -> Maybe<T> {
        self.root
    }

    /// The root node, if the tree is not empty.
    pub fn root_node(&self) -> Option<&T> {
        self.root.get(&self.arena)
    }

    /// Splits the tree into its arena and root edge.
    pub fn into_parts(self) -> (Arena<N>, Maybe<T>) {
        (self.arena, self.root)
    }

    /// Runs both validation phases from the root.
    pub fn check_well_formed(&self) -> Result<()> {
        self.root.check_well_formed(&self.arena)
    }

    /// Like [`Tree::check_well_formed`], reporting failure as `false`.
    pub fn is_well_formed(&self) -> bool {
        self.root.is_well_formed(&self.arena)
    }

    /// Encodes the tree; see [`serialize`].
    pub fn serialize(&self) -> Result<Vec<u8>> {
        serialize(&self.root, &self.arena)
    }
}

/// Validates the tree under `root` and encodes it as canonical CBOR.
pub fn serialize<N, T>(root: &Maybe<T>, arena: &Arena<N>) -> Result<Vec<u8>>
where
    N: Node,
    T: Kind<N>,
{
    let mut ids = PointerMap::new();
    root.find_reachable(arena, &mut ids)?;
    root.check_complete(arena, &ids)?;
    let mut map = MapWriter::new();
    root.serialize(arena, &mut map, &ids)?;
    let bytes = map.encode()?;
    debug!(nodes = ids.len(), bytes = bytes.len(), "serialized tree");
    Ok(bytes)
}

/// [`serialize`], then writes the bytes to `writer`.
pub fn serialize_to_writer<N, T, W>(root: &Maybe<T>, arena: &Arena<N>, mut writer: W) -> Result<()>
where
    N: Node,
    T: Kind<N>,
    W: Write,
{
    let bytes = serialize(root, arena)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// [`serialize`], then writes the bytes to the file at `path`, replacing it.
pub fn serialize_file<N, T>(root: &Maybe<T>, arena: &Arena<N>, path: impl AsRef<Path>) -> Result<()>
where
    N: Node,
    T: Kind<N>,
{
    let file = File::create(path.as_ref())?;
    serialize_to_writer(root, arena, BufWriter::new(file))
}

/// Decodes a tree with the default [`CodecConfig`].
pub fn deserialize<N, T>(bytes: &[u8]) -> Result<Tree<N, T>>
where
    N: Node,
    T: Kind<N>,
{
    deserialize_with(bytes, &CodecConfig::default())
}

/// Decodes a tree, restores its links, and validates it.
pub fn deserialize_with<N, T>(bytes: &[u8], config: &CodecConfig) -> Result<Tree<N, T>>
where
    N: Node,
    T: Kind<N>,
{
    let doc = Document::decode_with(bytes, config)?;
    let map = doc.as_map()?;
    let mut arena = Arena::new();
    let mut ids = IdentifierMap::new();
    let root = Maybe::deserialize(&map, &mut arena, &mut ids)?;
    let links = ids.restore_links(&mut arena)?;
    root.check_well_formed(&arena)?;
    debug!(nodes = arena.len(), links, "deserialized tree");
    Ok(Tree { arena, root })
}

/// Reads `reader` to the end and decodes it with the default [`CodecConfig`].
pub fn deserialize_from_reader<N, T, R>(reader: R) -> Result<Tree<N, T>>
where
    N: Node,
    T: Kind<N>,
    R: Read,
{
    deserialize_from_reader_with(reader, &CodecConfig::default())
}

/// Reads `reader` to the end and decodes it.
///
/// At most `config.max_input_len + 1` bytes are buffered; a longer stream
/// fails as too large without being drained.
pub fn deserialize_from_reader_with<N, T, R>(reader: R, config: &CodecConfig) -> Result<Tree<N, T>>
where
    N: Node,
    T: Kind<N>,
    R: Read,
{
    let bytes = config.read_input(reader)?;
    deserialize_with(&bytes, config)
}

/// Decodes the file at `path` with the default [`CodecConfig`].
pub fn deserialize_file<N, T>(path: impl AsRef<Path>) -> Result<Tree<N, T>>
where
    N: Node,
    T: Kind<N>,
{
    deserialize_file_with(path, &CodecConfig::default())
}

/// Decodes the file at `path`.
pub fn deserialize_file_with<N, T>(path: impl AsRef<Path>, config: &CodecConfig) -> Result<Tree<N, T>>
where
    N: Node,
    T: Kind<N>,
{
    let file = File::open(path.as_ref())?;
    deserialize_from_reader_with(BufReader::new(file), config)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::TreeError;
    use crate::fixture::{tn, Tn};
    use crate::OptLink;
    use tree_cbor::DEFAULT_MAX_DEPTH;

    fn sample(arena: &mut Arena<Tn>) -> Maybe<Tn> {
        let leaf = tn(arena, 3);
        let mut mid = Tn::new(2);
        mid.child.set(leaf);
        let mid = arena.insert(mid);
        let mut root = Tn::new(1);
        root.kids.add(mid);
        root.kids.add(tn(arena, 4));
        let root = arena.insert(root);
        // Back-link from the leaf to the root, forward link from root to leaf.
        if let Some(n) = arena.get_mut(leaf) {
            n.peer = OptLink::from_id(root);
        }
        if let Some(n) = arena.get_mut(root) {
            n.peer = OptLink::from_id(leaf);
        }
        Maybe::from_id(root)
    }

    #[test]
    fn round_trip_preserves_values_and_links() {
        let mut arena = Arena::new();
        let root = sample(&mut arena);
        let bytes = serialize(&root, &arena).expect("serialize");
        let tree: Tree<Tn> = deserialize(&bytes).expect("deserialize");

        assert!(tree.is_well_formed());
        assert!(root.value_eq(&arena, &tree.root(), tree.arena()));
        let new_root = tree.root().deref(tree.arena()).expect("root");
        let leaf = new_root.peer.deref(tree.arena()).expect("leaf");
        assert_eq!(leaf.value, 3);
        assert_eq!(leaf.peer.resolve(tree.arena()), tree.root().id());
        assert_eq!(tree.serialize().expect("reserialize"), bytes);
    }

    #[test]
    fn empty_root_round_trips() {
        let arena: Arena<Tn> = Arena::new();
        let bytes = serialize(&Maybe::<Tn>::new(), &arena).expect("serialize");
        let tree: Tree<Tn> = deserialize(&bytes).expect("deserialize");
        assert!(tree.root().is_empty());
        assert!(tree.arena().is_empty());
        assert!(tree.root_node().is_none());
    }

    #[test]
    fn serialize_refuses_foreign_link() {
        let mut arena = Arena::new();
        let stranger = tn(&mut arena, 8);
        let mut node = Tn::new(1);
        node.peer = OptLink::from_id(stranger);
        let root: Maybe<Tn> = Maybe::from_id(arena.insert(node));
        let err = serialize(&root, &arena).expect_err("foreign link");
        assert!(err.is_not_well_formed(), "{err}");
    }

    fn chain(arena: &mut Arena<Tn>, len: usize) -> Maybe<Tn> {
        let mut edge: Maybe<Tn> = Maybe::new();
        for v in 0..len {
            let mut node = Tn::new(i64::try_from(v).expect("small"));
            node.child = edge;
            edge = Maybe::from_id(arena.insert(node));
        }
        edge
    }

    #[test]
    fn depth_limit_applies() {
        let mut arena = Arena::new();
        let edge = chain(&mut arena, 8);
        let bytes = serialize(&edge, &arena).expect("serialize");
        let tight = CodecConfig {
            max_depth: 4,
            ..CodecConfig::default()
        };
        let err = deserialize_with::<Tn, Tn>(&bytes, &tight).expect_err("too deep");
        assert!(matches!(err, TreeError::Codec(_)), "{err}");
        assert!(deserialize::<Tn, Tn>(&bytes).is_ok());
    }

    #[test]
    fn default_depth_limit_bounds_node_chains() {
        let mut arena = Arena::new();
        let longest = chain(&mut arena, DEFAULT_MAX_DEPTH - 1);
        let bytes = serialize(&longest, &arena).expect("serialize");
        let tree: Tree<Tn> = deserialize(&bytes).expect("chain under the limit");
        assert_eq!(tree.arena().len(), DEFAULT_MAX_DEPTH - 1);
        assert!(longest.value_eq(&arena, &tree.root(), tree.arena()));

        let mut arena = Arena::new();
        let too_long = chain(&mut arena, DEFAULT_MAX_DEPTH);
        let bytes = serialize(&too_long, &arena).expect("serialize");
        let err = deserialize::<Tn, Tn>(&bytes).expect_err("chain over the limit");
        assert!(matches!(err, TreeError::Codec(_)), "{err}");
    }

    #[test]
    fn thousand_level_document_is_rejected_without_recursing() {
        // {"child": {"child": ... {}}} nested 1000 times.
        let mut bytes = Vec::new();
        for _ in 0..1000 {
            bytes.push(0xa1);
            bytes.push(0x65);
            bytes.extend_from_slice(b"child");
        }
        bytes.push(0xa0);
        let err = deserialize::<Tn, Tn>(&bytes).expect_err("too deep");
        assert!(matches!(err, TreeError::Codec(_)), "{err}");
        assert!(err.to_string().contains("depth"), "{err}");
    }

    #[test]
    fn reader_rejects_oversized_stream() {
        let mut arena = Arena::new();
        let root = sample(&mut arena);
        let bytes = serialize(&root, &arena).expect("serialize");
        let tight = CodecConfig {
            max_input_len: bytes.len() - 1,
            ..CodecConfig::default()
        };
        let err = deserialize_from_reader_with::<Tn, Tn, _>(&bytes[..], &tight)
            .expect_err("too large");
        assert!(matches!(err, TreeError::Codec(_)), "{err}");
        assert!(deserialize_from_reader::<Tn, Tn, _>(&bytes[..]).is_ok());
    }
}
