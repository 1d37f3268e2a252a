//! gamec C code generator: compiles a validated game to one C translation
//! unit for the 8-bit target.
//!
//! # Architecture
//!
//! The generator takes a validated [`gamec_ir::game::Game`] and produces a
//! self-contained C file plus a source map. The output follows the target
//! platform contract:
//!
//! ## Layout
//! Fixed section order: constants/enums → static storage → lookup tables →
//! forward declarations → support functions → dispatch functions → frame
//! entry. Subsystem sections are emitted if and only if the corresponding
//! declarations exist.
//!
//! ## Entry points
//! - `game_init()` — initialise state to declared defaults and enter the
//!   start scene
//! - `game_frame()` — one frame: scene dispatch, state machines, pools,
//!   animation, tweens, camera, fades
//!
//! ## Determinism
//! Emission is purely a function of the game's content, iterating every
//! collection in declaration order; the same game always produces
//! byte-identical C text and source-map JSON.
//!
//! ## Value representation
//! World magnitudes with fractional precision are signed 8.8 fixed point
//! (scale 256); all float configuration is converted once, at generation
//! time. See [`fixed`].

pub mod error;
pub mod expr;
pub mod fixed;
pub mod generator;
pub mod machine;
pub mod names;
pub mod pathfind;
pub mod pool;
pub mod scene;
pub mod source_map;
pub mod stmt;
pub mod support;
pub mod tween;
pub mod writer;

pub use error::{CodegenError, CodegenResult};
pub use generator::{generate, GeneratedC};
pub use source_map::{SourceMap, SourceMapEntry};
