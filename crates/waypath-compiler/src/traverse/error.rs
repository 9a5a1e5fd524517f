//! Compile-time diagnostics.

/// Errors raised while compiling an expression against a shape graph.
///
/// Two user-facing families, kept as distinct variants because callers
/// legitimately want to tell "this expression is wrong" apart from "this
/// compiler doesn't support that": [`TraversalError::Invalid`] means the
/// expression is inconsistent with the concrete shape graph, while
/// [`TraversalError::Unsupported`] means it uses a feature the compiler
/// does not implement (or combines valid types in an unsupported way).
/// Either one aborts the enclosing expression's compilation: there is no
/// partial output and no retry; compilation is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TraversalError {
    /// The expression is inconsistent with the shape graph (unknown member,
    /// wrong function arity or argument type, non-boolean filter predicate).
    #[error("invalid traversal: {0}")]
    Invalid(String),

    /// The expression uses a feature this compiler does not implement.
    #[error("unsupported expression: {0}")]
    Unsupported(String),

    /// A root name had no corresponding binding. This is caller misuse
    /// (the binding set didn't cover the expression's roots), not a
    /// user-facing diagnostic about the expression itself.
    #[error("no traversal binding for root `{0}`")]
    UnboundRoot(String),
}

pub type TraversalResult<T> = Result<T, TraversalError>;

pub(super) fn invalid(message: impl Into<String>) -> TraversalError {
    TraversalError::Invalid(message.into())
}

pub(super) fn unsupported(message: impl Into<String>) -> TraversalError {
    TraversalError::Unsupported(message.into())
}
