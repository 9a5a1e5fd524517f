//! Root bindings available to an expression.

use waypath_core::ShapeId;

use super::value::GeneratedTraversal;

/// One root available to an expression, bound to a concrete storage
/// identifier in the embedding function. Roots are assumed always present,
/// so resolved bindings are never optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalBinding {
    /// The single implicit root most expressions traverse from.
    Global { ident: String, shape: ShapeId },
    /// One of several disambiguated roots, looked up by the identifier the
    /// expression uses (e.g. `input` and `output`).
    Named {
        name: String,
        ident: String,
        shape: ShapeId,
    },
}

/// The set of roots an expression compiles against.
///
/// Named bindings are consulted only at the root of the expression; inside
/// sub-expression and projection scopes field names always resolve against
/// the current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversalBindings {
    bindings: Vec<TraversalBinding>,
}

impl TraversalBindings {
    pub fn new(bindings: Vec<TraversalBinding>) -> Self {
        Self { bindings }
    }

    /// The common single-root case.
    pub fn global(ident: impl Into<String>, shape: ShapeId) -> Self {
        Self::new(vec![TraversalBinding::Global {
            ident: ident.into(),
            shape,
        }])
    }

    /// Resolve a root identifier against the named bindings.
    pub(super) fn resolve_named(&self, name: &str) -> Option<GeneratedTraversal> {
        self.bindings.iter().find_map(|binding| match binding {
            TraversalBinding::Named {
                name: bound,
                ident,
                shape,
            } if bound == name => Some(GeneratedTraversal::root(ident.clone(), *shape)),
            _ => None,
        })
    }

    /// The implicit root, if one was supplied.
    pub(super) fn global_root(&self) -> Option<GeneratedTraversal> {
        self.bindings.iter().find_map(|binding| match binding {
            TraversalBinding::Global { ident, shape } => {
                Some(GeneratedTraversal::root(ident.clone(), *shape))
            }
            _ => None,
        })
    }
}
