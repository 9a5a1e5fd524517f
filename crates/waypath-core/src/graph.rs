//! Arena implementation of the shape graph.

use indexmap::IndexMap;

use crate::{Member, NumberKind, ShapeId, ShapeKind, ShapeQuery};

/// Owned, append-only shape arena.
///
/// Hosts and tests describe their data model through the `add_*` builders.
/// Mutually recursive shapes are built with [`ShapeGraph::reserve`] followed
/// by [`ShapeGraph::define`].
#[derive(Debug, Default)]
pub struct ShapeGraph {
    shapes: Vec<Option<ShapeKind>>,
}

impl ShapeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fully-formed shape.
    pub fn add(&mut self, kind: ShapeKind) -> ShapeId {
        let id = ShapeId::new(self.shapes.len() as u32);
        self.shapes.push(Some(kind));
        id
    }

    /// Reserve an id for a shape defined later, for cycles.
    pub fn reserve(&mut self) -> ShapeId {
        let id = ShapeId::new(self.shapes.len() as u32);
        self.shapes.push(None);
        id
    }

    /// Fill in a previously reserved shape.
    pub fn define(&mut self, id: ShapeId, kind: ShapeKind) {
        self.shapes[id.index()] = Some(kind);
    }

    /// Add a structure from `(member name, target, required)` triples.
    pub fn add_structure<'n>(
        &mut self,
        name: &str,
        members: impl IntoIterator<Item = (&'n str, ShapeId, bool)>,
    ) -> ShapeId {
        let id = self.reserve();
        self.define_structure(id, name, members);
        id
    }

    /// Define a reserved id as a structure; pairs with [`ShapeGraph::reserve`].
    pub fn define_structure<'n>(
        &mut self,
        id: ShapeId,
        name: &str,
        members: impl IntoIterator<Item = (&'n str, ShapeId, bool)>,
    ) {
        self.define(
            id,
            ShapeKind::Structure {
                name: name.to_string(),
                members: collect_members(members),
            },
        );
    }

    /// Add a union from `(member name, target)` pairs; union members carry
    /// no meaningful required flag.
    pub fn add_union<'n>(
        &mut self,
        name: &str,
        members: impl IntoIterator<Item = (&'n str, ShapeId)>,
    ) -> ShapeId {
        self.add(ShapeKind::Union {
            name: name.to_string(),
            members: collect_members(members.into_iter().map(|(n, t)| (n, t, false))),
        })
    }

    pub fn add_list(&mut self, element: ShapeId) -> ShapeId {
        self.add(ShapeKind::List { element })
    }

    pub fn add_map(&mut self, key: ShapeId, value: ShapeId) -> ShapeId {
        self.add(ShapeKind::Map {
            key,
            value,
            sparse: false,
        })
    }

    pub fn add_sparse_map(&mut self, key: ShapeId, value: ShapeId) -> ShapeId {
        self.add(ShapeKind::Map {
            key,
            value,
            sparse: true,
        })
    }

    pub fn add_enum<'n>(
        &mut self,
        name: &str,
        variants: impl IntoIterator<Item = &'n str>,
    ) -> ShapeId {
        self.add(ShapeKind::Enum {
            name: name.to_string(),
            variants: variants.into_iter().map(str::to_string).collect(),
        })
    }

    pub fn add_int_enum(&mut self, name: &str) -> ShapeId {
        self.add(ShapeKind::IntEnum {
            name: name.to_string(),
        })
    }

    pub fn add_boolean(&mut self) -> ShapeId {
        self.add(ShapeKind::Boolean)
    }

    pub fn add_number(&mut self, kind: NumberKind) -> ShapeId {
        self.add(ShapeKind::Number(kind))
    }

    pub fn add_string(&mut self) -> ShapeId {
        self.add(ShapeKind::String)
    }

    pub fn add_document(&mut self) -> ShapeId {
        self.add(ShapeKind::Document)
    }
}

impl ShapeQuery for ShapeGraph {
    fn kind(&self, shape: ShapeId) -> &ShapeKind {
        self.shapes[shape.index()]
            .as_ref()
            .expect("shape must be defined before it is queried")
    }
}

fn collect_members<'n>(
    members: impl IntoIterator<Item = (&'n str, ShapeId, bool)>,
) -> IndexMap<String, Member> {
    members
        .into_iter()
        .map(|(name, target, required)| (name.to_string(), Member { target, required }))
        .collect()
}
