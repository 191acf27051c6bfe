// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! A small program-shaped node set, written the way generated code looks.
//!
//! ```text
//! Program  { name, functions: Many<Function>, entry: OptLink<Function> }
//! Function { name, parent: OptLink<Program>, body: Any<Call>, result: Maybe<Literal> }
//! Call     { callee: Link<Function>, arg: One<Literal> }
//! Literal  { value }
//! ```

use tree_base::{
    Any, Arena, Completable, Equivalence, IdentifierMap, Kind, Link, LinkBase, MapReader,
    MapWriter, Many, Maybe, Node, NodeId, One, OptLink, PointerMap, Result, Target, TreeError,
};

/// Every node kind of the program tree.
#[derive(Debug, Clone)]
pub enum AstNode {
    /// Root of a program.
    Program(Program),
    /// A named function.
    Function(Function),
    /// A call statement inside a function body.
    Call(Call),
    /// An integer constant.
    Literal(Literal),
}

macro_rules! node_kind {
    ($($kind:ident),* $(,)?) => {
        $(
            impl From<$kind> for AstNode {
                fn from(node: $kind) -> Self {
                    Self::$kind(node)
                }
            }

            impl Kind<AstNode> for $kind {
                fn narrow(node: &AstNode) -> Option<&Self> {
                    match node {
                        AstNode::$kind(inner) => Some(inner),
                        _ => None,
                    }
                }

                fn narrow_mut(node: &mut AstNode) -> Option<&mut Self> {
                    match node {
                        AstNode::$kind(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )*
    };
}

node_kind!(Program, Function, Call, Literal);

/// Root of a program.
#[derive(Debug, Clone, Default)]
pub struct Program {
    /// Program name.
    pub name: String,
    /// Functions, in declaration order.
    pub functions: Many<Function>,
    /// Function to run first, if any.
    pub entry: OptLink<Function>,
}

/// A named function.
#[derive(Debug, Clone, Default)]
pub struct Function {
    /// Function name.
    pub name: String,
    /// Back-link to the owning program.
    pub parent: OptLink<Program>,
    /// Calls, in execution order.
    pub body: Any<Call>,
    /// Constant result, if any.
    pub result: Maybe<Literal>,
}

/// A call statement.
#[derive(Debug, Clone, Default)]
pub struct Call {
    /// Function being called; anywhere in the program.
    pub callee: Link<Function>,
    /// Single argument.
    pub arg: One<Literal>,
}

/// An integer constant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Literal {
    /// The value.
    pub value: i64,
}

impl Program {
    /// A program with no functions yet.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }
}

impl Function {
    /// A function with an empty body.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }
}

impl Call {
    /// A call of `callee` with `arg`.
    pub fn new(callee: impl Target, arg: One<Literal>) -> Self {
        let mut call = Self {
            arg,
            ..Self::default()
        };
        call.callee.set(callee);
        call
    }
}

impl Literal {
    /// A literal holding `value`.
    pub const fn new(value: i64) -> Self {
        Self { value }
    }
}

impl Completable<AstNode> for Program {
    fn find_reachable(&self, arena: &Arena<AstNode>, map: &mut PointerMap) -> Result<()> {
        self.functions.find_reachable(arena, map)
    }

    fn check_complete(&self, arena: &Arena<AstNode>, map: &PointerMap) -> Result<()> {
        self.functions.check_complete(arena, map)?;
        self.entry.check_complete(arena, map)
    }
}

impl Completable<AstNode> for Function {
    fn find_reachable(&self, arena: &Arena<AstNode>, map: &mut PointerMap) -> Result<()> {
        self.body.find_reachable(arena, map)?;
        self.result.find_reachable(arena, map)
    }

    fn check_complete(&self, arena: &Arena<AstNode>, map: &PointerMap) -> Result<()> {
        self.parent.check_complete(arena, map)?;
        self.body.check_complete(arena, map)?;
        self.result.check_complete(arena, map)
    }
}

impl Completable<AstNode> for Call {
    fn find_reachable(&self, arena: &Arena<AstNode>, map: &mut PointerMap) -> Result<()> {
        self.arg.find_reachable(arena, map)
    }

    fn check_complete(&self, arena: &Arena<AstNode>, map: &PointerMap) -> Result<()> {
        self.callee.check_complete(arena, map)?;
        self.arg.check_complete(arena, map)
    }
}

impl Completable<AstNode> for Literal {
    fn find_reachable(&self, _arena: &Arena<AstNode>, _map: &mut PointerMap) -> Result<()> {
        Ok(())
    }

    fn check_complete(&self, _arena: &Arena<AstNode>, _map: &PointerMap) -> Result<()> {
        Ok(())
    }
}

impl Completable<AstNode> for AstNode {
    fn find_reachable(&self, arena: &Arena<AstNode>, map: &mut PointerMap) -> Result<()> {
        match self {
            Self::Program(n) => n.find_reachable(arena, map),
            Self::Function(n) => n.find_reachable(arena, map),
            Self::Call(n) => n.find_reachable(arena, map),
            Self::Literal(n) => n.find_reachable(arena, map),
        }
    }

    fn check_complete(&self, arena: &Arena<AstNode>, map: &PointerMap) -> Result<()> {
        match self {
            Self::Program(n) => n.check_complete(arena, map),
            Self::Function(n) => n.check_complete(arena, map),
            Self::Call(n) => n.check_complete(arena, map),
            Self::Literal(n) => n.check_complete(arena, map),
        }
    }
}

fn sub_map<'a>(map: &MapReader<'a>, key: &str) -> Result<MapReader<'a>> {
    Ok(map.at(key)?.as_map()?)
}

impl Node for AstNode {
    fn kind_name(&self) -> &'static str {
        match self {
            Self::Program(_) => "Program",
            Self::Function(_) => "Function",
            Self::Call(_) => "Call",
            Self::Literal(_) => "Literal",
        }
    }

    fn value_eq(&self, other: &Self, eq: &Equivalence<'_, Self>) -> bool {
        match (self, other) {
            (Self::Program(a), Self::Program(b)) => {
                a.name == b.name
                    && a.functions.equivalent(&b.functions, eq)
                    && a.entry.equivalent(&b.entry, eq)
            }
            (Self::Function(a), Self::Function(b)) => {
                a.name == b.name
                    && a.parent.equivalent(&b.parent, eq)
                    && a.body.equivalent(&b.body, eq)
                    && a.result.equivalent(&b.result, eq)
            }
            (Self::Call(a), Self::Call(b)) => {
                a.callee.equivalent(&b.callee, eq) && a.arg.equivalent(&b.arg, eq)
            }
            (Self::Literal(a), Self::Literal(b)) => a == b,
            _ => false,
        }
    }

    fn visit_children(&self, arena: &Arena<Self>, visit: &mut dyn FnMut(NodeId, &Self)) {
        match self {
            Self::Program(n) => n.functions.visit(arena, visit),
            Self::Function(n) => {
                n.body.visit(arena, visit);
                n.result.visit(arena, visit);
            }
            Self::Call(n) => n.arg.visit(arena, visit),
            Self::Literal(_) => {}
        }
    }

    fn clone_children(&mut self, arena: &mut Arena<Self>) -> Result<()> {
        match self {
            Self::Program(n) => n.functions = n.functions.deep_clone(arena)?,
            Self::Function(n) => {
                n.body = n.body.deep_clone(arena)?;
                n.result = n.result.deep_clone(arena)?.into();
            }
            Self::Call(n) => n.arg = n.arg.deep_clone(arena)?,
            Self::Literal(_) => {}
        }
        Ok(())
    }

    fn links_mut(&mut self, visit: &mut dyn FnMut(&mut dyn LinkBase)) {
        match self {
            Self::Program(n) => visit(&mut n.entry),
            Self::Function(n) => visit(&mut n.parent),
            Self::Call(n) => visit(&mut n.callee),
            Self::Literal(_) => {}
        }
    }

    fn serialize(&self, arena: &Arena<Self>, map: &mut MapWriter, ids: &PointerMap) -> Result<()> {
        match self {
            Self::Program(n) => {
                map.append_string("name", &n.name);
                map.append_map("functions", |m| n.functions.serialize(arena, m, ids))?;
                map.append_map("entry", |m| n.entry.serialize(arena, m, ids))
            }
            Self::Function(n) => {
                map.append_string("name", &n.name);
                map.append_map("parent", |m| n.parent.serialize(arena, m, ids))?;
                map.append_map("body", |m| n.body.serialize(arena, m, ids))?;
                map.append_map("result", |m| n.result.serialize(arena, m, ids))
            }
            Self::Call(n) => {
                map.append_map("callee", |m| n.callee.serialize(arena, m, ids))?;
                map.append_map("arg", |m| n.arg.serialize(arena, m, ids))
            }
            Self::Literal(n) => {
                map.append_int("value", n.value);
                Ok(())
            }
        }
    }

    fn deserialize(
        map: &MapReader<'_>,
        arena: &mut Arena<Self>,
        ids: &mut IdentifierMap,
    ) -> Result<Self> {
        let kind = map.at("@t")?.as_string()?;
        let node = match kind {
            "Program" => Self::Program(Program {
                name: map.at("name")?.as_string()?.to_owned(),
                functions: Many::deserialize(&sub_map(map, "functions")?, arena, ids)?,
                entry: OptLink::deserialize(&sub_map(map, "entry")?, ids)?,
            }),
            "Function" => Self::Function(Function {
                name: map.at("name")?.as_string()?.to_owned(),
                parent: OptLink::deserialize(&sub_map(map, "parent")?, ids)?,
                body: Any::deserialize(&sub_map(map, "body")?, arena, ids)?,
                result: Maybe::deserialize(&sub_map(map, "result")?, arena, ids)?,
            }),
            "Call" => Self::Call(Call {
                callee: Link::deserialize(&sub_map(map, "callee")?, ids)?,
                arg: One::deserialize(&sub_map(map, "arg")?, arena, ids)?,
            }),
            "Literal" => Self::Literal(Literal {
                value: map.at("value")?.as_int()?,
            }),
            other => {
                return Err(TreeError::Schema(format!("unknown node kind '{other}'")));
            }
        };
        Ok(node)
    }
}
