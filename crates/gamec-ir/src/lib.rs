//! Shared types for the gamec compiler.
//!
//! This crate defines the immutable [`game::Game`] aggregate, the statement
//! and expression IR, source origins, diagnostics, and the hardware boundary
//! constants shared by the validator and the code generator.

mod diag;
mod origin;
pub mod game;
pub mod ir;
pub mod limits;

pub use diag::{
    Diagnostic, DiagnosticCategory, DiagnosticCode, Diagnostics, InvalidGameError, Severity,
};
pub use origin::Origin;
