//! Compile-time descriptions of traversal results.

use waypath_core::{ShapeId, ShapeQuery};

/// How a compiled result is held: a borrow into existing storage, or a
/// freshly computed value. `Value` whenever the fragment computes something
/// new (literals, function results, projection results); `Reference` for
/// direct access into existing storage. Governs whether later steps
/// dereference, and whether comparisons allocate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Reference,
    Value,
}

/// One entry of a tuple-typed multi-select result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleEntry {
    pub ty: TraversalType,
    pub by_ref: bool,
}

/// The static type of a sub-expression result.
///
/// `Shape` is a value typed exactly as a declared shape from the graph;
/// everything else is computed and has no declared shape, which is exactly
/// the distinction object projection relies on to reject computed maps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraversalType {
    /// Typed exactly as a declared shape.
    Shape(ShapeId),
    /// Computed sequence; elements are borrowed unless `owned`.
    Sequence {
        element: Box<TraversalType>,
        owned: bool,
    },
    /// Heterogeneous multi-select result.
    Tuple(Vec<TupleEntry>),
    /// Computed boolean: comparisons, boolean operators, `contains`.
    Bool,
    /// Number literal; literals are double-precision at the type level.
    Float,
    /// A `length` count.
    Count,
    /// String literal.
    Str,
}

impl TraversalType {
    pub(super) fn sequence(element: TraversalType, owned: bool) -> Self {
        TraversalType::Sequence {
            element: Box::new(element),
            owned,
        }
    }

    /// Render the Rust type for a value of this type. `by_ref` wraps the
    /// rendering in a reference; `lifetime` names borrows when given and
    /// elides them otherwise (turbofish and diagnostic positions).
    pub(super) fn render<Q: ShapeQuery + ?Sized>(
        &self,
        by_ref: bool,
        lifetime: Option<&str>,
        shapes: &Q,
    ) -> String {
        let base = match self {
            TraversalType::Shape(id) => shapes.rust_type(*id),
            TraversalType::Sequence { element, owned } => {
                format!("Vec<{}>", element.render(!owned, lifetime, shapes))
            }
            TraversalType::Tuple(entries) => {
                let entries: Vec<String> = entries
                    .iter()
                    .map(|e| e.ty.render(e.by_ref, lifetime, shapes))
                    .collect();
                format!("({})", entries.join(", "))
            }
            TraversalType::Bool => "bool".to_string(),
            TraversalType::Float => "f64".to_string(),
            TraversalType::Count => "usize".to_string(),
            TraversalType::Str => {
                // String literals live in the generated code itself.
                let rendered = match lifetime {
                    Some(_) => "&'static str",
                    None => "&str",
                };
                return reference(rendered.to_string(), by_ref, lifetime);
            }
        };
        reference(base, by_ref, lifetime)
    }
}

fn reference(base: String, by_ref: bool, lifetime: Option<&str>) -> String {
    if !by_ref {
        return base;
    }
    match lifetime {
        Some(lifetime) => format!("&{lifetime} {base}"),
        None => format!("&{base}"),
    }
}

/// The static type of a sub-expression result plus whether the value may be
/// absent. A result is optional when the step that produced it crossed an
/// optional member (or union variant); consumers unwrap before descending,
/// so optionality never silently propagates through a binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraversedShape {
    pub ty: TraversalType,
    pub optional: bool,
}

impl TraversedShape {
    pub(super) fn required(ty: TraversalType) -> Self {
        TraversedShape {
            ty,
            optional: false,
        }
    }

    pub(super) fn optional(ty: TraversalType) -> Self {
        TraversedShape { ty, optional: true }
    }
}

/// A compiled traversal: a straight-line code fragment, the identifier the
/// fragment leaves the result in, and the result's declared type and
/// ownership. Fragments compose by concatenation inside a generated
/// function returning `Option<T>`; absent optionals short-circuit with `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedTraversal {
    pub code: String,
    pub ident: String,
    pub output: TraversedShape,
    pub ownership: Ownership,
}

impl GeneratedTraversal {
    /// A root value: a named, never-optional reference with no code.
    pub(super) fn root(ident: impl Into<String>, shape: ShapeId) -> Self {
        GeneratedTraversal {
            code: String::new(),
            ident: ident.into(),
            output: TraversedShape::required(TraversalType::Shape(shape)),
            ownership: Ownership::Reference,
        }
    }

    /// The same value with no code attached, for use as a compilation scope.
    pub(super) fn rebind(&self) -> Self {
        GeneratedTraversal {
            code: String::new(),
            ident: self.ident.clone(),
            output: self.output.clone(),
            ownership: self.ownership,
        }
    }

    /// The declared Rust type of the result, with `'a` naming the borrow of
    /// the traversal roots, suitable for embedding in a generated function
    /// signature. The embedder wraps it in `Option`, both because the
    /// result may be declared optional and because reaching it may cross
    /// optional members at runtime.
    pub fn rust_output_type<Q: ShapeQuery + ?Sized>(&self, shapes: &Q) -> String {
        self.output
            .ty
            .render(self.ownership == Ownership::Reference, Some("'a"), shapes)
    }
}
