// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Minimal self-referential node used by unit tests.

use tree_cbor::{MapReader, MapWriter};

use crate::error::{Result, TreeError};
use crate::{
    Any, Arena, Completable, Equivalence, IdentifierMap, LinkBase, Maybe, Node, NodeId, OptLink,
    PointerMap,
};

#[derive(Debug, Clone, Default)]
pub(crate) struct Tn {
    pub(crate) value: i64,
    pub(crate) child: Maybe<Tn>,
    pub(crate) kids: Any<Tn>,
    pub(crate) peer: OptLink<Tn>,
}

impl Tn {
    pub(crate) fn new(value: i64) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }
}

pub(crate) fn tn(arena: &mut Arena<Tn>, value: i64) -> NodeId {
    arena.insert(Tn::new(value))
}

impl Completable<Tn> for Tn {
    fn find_reachable(&self, arena: &Arena<Tn>, map: &mut PointerMap) -> Result<()> {
        self.child.find_reachable(arena, map)?;
        self.kids.find_reachable(arena, map)
    }

    fn check_complete(&self, arena: &Arena<Tn>, map: &PointerMap) -> Result<()> {
        self.child.check_complete(arena, map)?;
        self.kids.check_complete(arena, map)?;
        self.peer.check_complete(arena, map)
    }
}

impl Node for Tn {
    fn kind_name(&self) -> &'static str {
        "Tn"
    }

    fn value_eq(&self, other: &Self, eq: &Equivalence<'_, Tn>) -> bool {
        self.value == other.value
            && self.child.equivalent(&other.child, eq)
            && self.kids.equivalent(&other.kids, eq)
            && self.peer.equivalent(&other.peer, eq)
    }

    fn visit_children(&self, arena: &Arena<Tn>, visit: &mut dyn FnMut(NodeId, &Tn)) {
        self.child.visit(arena, visit);
        self.kids.visit(arena, visit);
    }

    fn clone_children(&mut self, arena: &mut Arena<Tn>) -> Result<()> {
        self.child = self.child.deep_clone(arena)?.into();
        self.kids = self.kids.deep_clone(arena)?;
        Ok(())
    }

    fn links_mut(&mut self, visit: &mut dyn FnMut(&mut dyn LinkBase)) {
        visit(&mut self.peer);
    }

    fn serialize(&self, arena: &Arena<Tn>, map: &mut MapWriter, ids: &PointerMap) -> Result<()> {
        map.append_int("value", self.value);
        map.append_map("child", |m| self.child.serialize(arena, m, ids))?;
        map.append_map("kids", |m| self.kids.serialize(arena, m, ids))?;
        map.append_map("peer", |m| self.peer.serialize(arena, m, ids))
    }

    fn deserialize(
        map: &MapReader<'_>,
        arena: &mut Arena<Tn>,
        ids: &mut IdentifierMap,
    ) -> Result<Self> {
        let kind = map.at("@t")?.as_string()?;
        if kind != "Tn" {
            return Err(TreeError::Schema(format!("unknown node kind '{kind}'")));
        }
        Ok(Self {
            value: map.at("value")?.as_int()?,
            child: Maybe::deserialize(&map.at("child")?.as_map()?, arena, ids)?,
            kids: Any::deserialize(&map.at("kids")?.as_map()?, arena, ids)?,
            peer: OptLink::deserialize(&map.at("peer")?.as_map()?, ids)?,
        })
    }
}
