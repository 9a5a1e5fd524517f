//! Waypath compiler: JMESPath-style state queries compiled, ahead of time,
//! into typed Rust traversal code over a known shape graph.
//!
//! This crate provides the compilation pipeline:
//! - `parser` - lexer and Pratt parser producing the query AST
//! - `ast` - the node kinds the compiler dispatches on
//! - `traverse` - bindings, the expression compiler, and its diagnostics
//!
//! An expression such as `lists.structs[?name=='ready'].integer` is checked
//! against the service's data model at generation time (unknown members,
//! mismatched comparisons, and unsupported constructs are compile-time
//! diagnostics, never runtime failures) and lowered to a code fragment the
//! surrounding generator embeds in an accessor function.

pub mod ast;
pub mod parser;
pub mod traverse;

#[cfg(test)]
pub mod test_utils;

pub use parser::{ParseError, parse};
pub use traverse::{
    GeneratedTraversal, Ownership, TraversalBinding, TraversalBindings, TraversalError,
    TraversalResult, TraversalType, TraversedShape, compile_traversal,
};

use waypath_core::ShapeQuery;

/// Errors from the end-to-end [`compile`] facade.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Traversal(#[from] TraversalError),
}

/// Result type for end-to-end compilation.
pub type Result<T> = std::result::Result<T, Error>;

/// Parse `source` and compile it against `bindings` and `shapes`.
pub fn compile<Q: ShapeQuery + ?Sized>(
    source: &str,
    bindings: &TraversalBindings,
    shapes: &Q,
) -> Result<GeneratedTraversal> {
    let expr = parse(source)?;
    Ok(compile_traversal(shapes, &expr, bindings)?)
}
