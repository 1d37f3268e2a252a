//! gamec semantic analysis and pipeline.
//!
//! The compiler half of gamec: a fixed battery of validation passes over an
//! immutable [`Game`](gamec_ir::game::Game) snapshot, then C code
//! generation, strictly gated on a clean error list. One call transforms
//! one input into one output pair; there is no shared state across
//! invocations.
//!
//! ```no_run
//! use gamec_ir::game::GameBuilder;
//!
//! let game = GameBuilder::new().build();
//! match gamec_compiler::compile(&game) {
//!     Ok(compiled) => println!("{}", compiled.c_source),
//!     Err(err) => eprintln!("{err}"),
//! }
//! ```

pub mod bounds;
pub mod memory;
pub mod suggest;
pub mod validator;

use gamec_codegen::{CodegenError, SourceMap};
use gamec_ir::game::Game;
use gamec_ir::{Diagnostic, Diagnostics, InvalidGameError};
use thiserror::Error;

pub use validator::validate;

/// A successful compilation: the C text, its source map, and any advisory
/// warnings the validator collected.
#[derive(Debug)]
pub struct CompiledGame {
    pub c_source: String,
    pub source_map: SourceMap,
    pub warnings: Vec<Diagnostic>,
}

/// Why a compilation did not produce output.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Validation found errors; the report carries all of them.
    #[error(transparent)]
    Validation(#[from] InvalidGameError),

    /// A codegen precondition was violated. With a validated game this
    /// indicates an integration bug, not bad input.
    #[error(transparent)]
    Codegen(#[from] CodegenError),
}

/// Validate, then generate. Code generation never runs when the validator
/// reports any error; warnings alone do not block it.
pub fn compile(game: &Game) -> Result<CompiledGame, CompileError> {
    let report = validator::validate(game);
    let report = report.into_result()?;
    let generated = gamec_codegen::generate(game)?;
    Ok(CompiledGame {
        c_source: generated.c_source,
        source_map: generated.source_map,
        warnings: report.warnings,
    })
}

/// Validate only, returning the full accumulated report.
pub fn check(game: &Game) -> Diagnostics {
    validator::validate(game)
}
