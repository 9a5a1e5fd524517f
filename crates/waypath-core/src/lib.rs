//! Core data structures for the waypath shape graph.
//!
//! A shape graph is the read view over a service's data model that the
//! expression compiler types traversals against. Shapes are stored in an
//! id-indexed arena ([`ShapeGraph`]) and queried through the [`ShapeQuery`]
//! capability trait, so hosts with their own model representation can adapt
//! it without copying. Recursion is expressed by ids referring to each
//! other; consumers resolve one traversal step at a time and never walk the
//! whole graph.
//!
//! ## Generated-code conventions
//!
//! Emitted traversal fragments assume the host's generated model types obey
//! these conventions:
//! - structure members are public fields; optional members are `Option<T>`
//! - lists are `Vec<T>`, maps are `std::collections::HashMap<K, V>`
//!   (`Option<V>` values when the map is sparse)
//! - union variants are accessed via `as_<member>(&self) -> Option<&T>`
//! - string enums expose `as_str(&self) -> &str`
//! - int enums expose `as_i32(&self) -> i32`

use indexmap::IndexMap;

mod graph;

pub use graph::ShapeGraph;

/// Index of a shape in its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(u32);

impl ShapeId {
    pub(crate) fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Width and family of a numeric shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl NumberKind {
    /// Whether values of this kind are floating point.
    pub fn is_float(self) -> bool {
        matches!(self, NumberKind::F32 | NumberKind::F64)
    }

    /// The Rust scalar type values of this kind are stored as.
    pub fn rust_type(self) -> &'static str {
        match self {
            NumberKind::I8 => "i8",
            NumberKind::I16 => "i16",
            NumberKind::I32 => "i32",
            NumberKind::I64 => "i64",
            NumberKind::F32 => "f32",
            NumberKind::F64 => "f64",
        }
    }
}

/// A structure or union member: target shape plus required/optional flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    pub target: ShapeId,
    pub required: bool,
}

/// One shape in the graph.
///
/// Member tables preserve declaration order so everything derived from them
/// is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeKind {
    Structure {
        name: String,
        members: IndexMap<String, Member>,
    },
    Union {
        name: String,
        members: IndexMap<String, Member>,
    },
    List {
        element: ShapeId,
    },
    Map {
        key: ShapeId,
        value: ShapeId,
        /// Sparse maps may omit values; stored as `Option<V>`.
        sparse: bool,
    },
    Enum {
        name: String,
        variants: Vec<String>,
    },
    IntEnum {
        name: String,
    },
    Boolean,
    Number(NumberKind),
    String,
    Document,
}

impl ShapeKind {
    /// Whether fields can be looked up in this shape.
    pub fn is_record(&self) -> bool {
        matches!(self, ShapeKind::Structure { .. } | ShapeKind::Union { .. })
    }

    /// Declared type name, for shapes that have one.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            ShapeKind::Structure { name, .. }
            | ShapeKind::Union { name, .. }
            | ShapeKind::Enum { name, .. }
            | ShapeKind::IntEnum { name } => Some(name),
            _ => None,
        }
    }
}

/// Read-only query interface over a shape graph.
///
/// Implementors only need [`ShapeQuery::kind`]; the traversal-step queries
/// are derived from it. Nothing here mutates the schema.
pub trait ShapeQuery {
    /// The kind of `shape`.
    fn kind(&self, shape: ShapeId) -> &ShapeKind;

    /// Target shape and required flag of member `name`, if `shape` is a
    /// record kind and declares it.
    fn member(&self, shape: ShapeId, name: &str) -> Option<(ShapeId, bool)> {
        match self.kind(shape) {
            ShapeKind::Structure { members, .. } | ShapeKind::Union { members, .. } => {
                members.get(name).map(|m| (m.target, m.required))
            }
            _ => None,
        }
    }

    /// Element shape of a list.
    fn element(&self, shape: ShapeId) -> Option<ShapeId> {
        match self.kind(shape) {
            ShapeKind::List { element } => Some(*element),
            _ => None,
        }
    }

    /// Key and value shapes of a map.
    fn entry(&self, shape: ShapeId) -> Option<(ShapeId, ShapeId)> {
        match self.kind(shape) {
            ShapeKind::Map { key, value, .. } => Some((*key, *value)),
            _ => None,
        }
    }

    /// The declared Rust type values of `shape` are stored as.
    ///
    /// Named shapes render as their declared type name, so recursive shapes
    /// terminate after one hop.
    fn rust_type(&self, shape: ShapeId) -> String {
        match self.kind(shape) {
            ShapeKind::Structure { name, .. }
            | ShapeKind::Union { name, .. }
            | ShapeKind::Enum { name, .. }
            | ShapeKind::IntEnum { name } => name.clone(),
            ShapeKind::List { element } => format!("Vec<{}>", self.rust_type(*element)),
            ShapeKind::Map { key, value, sparse } => {
                let value = self.rust_type(*value);
                let value = if *sparse {
                    format!("Option<{value}>")
                } else {
                    value
                };
                format!(
                    "std::collections::HashMap<{}, {}>",
                    self.rust_type(*key),
                    value
                )
            }
            ShapeKind::Boolean => "bool".to_string(),
            ShapeKind::Number(kind) => kind.rust_type().to_string(),
            ShapeKind::String => "String".to_string(),
            ShapeKind::Document => "Document".to_string(),
        }
    }
}
