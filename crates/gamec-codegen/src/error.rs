//! Codegen error types.

use thiserror::Error;

/// Errors that can occur during C code generation.
///
/// The generator runs only on a validated game, so every variant here is a
/// programmer or integration error, never a user-facing diagnostic.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// An IR feature is not yet supported by the code generator.
    #[error("unsupported feature: {0}")]
    Unsupported(String),

    /// An internal consistency check failed.
    #[error("internal codegen error: {0}")]
    Internal(String),

    /// A symbol could not be resolved during codegen. Validation should have
    /// caught this; reaching it means the game was not validated first.
    #[error("unresolved symbol: {0}")]
    UnresolvedSymbol(String),

    /// A fixed-capacity structure of the generated runtime was exceeded.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
}

/// Codegen result type alias.
pub type CodegenResult<T> = Result<T, CodegenError>;
