//! Integration tests for the compile pipeline.
//!
//! Tests exercise:
//! - Validation gating: errors block generation entirely
//! - Warning pass-through on successful compiles
//! - Byte-for-byte determinism of the C output and the source map

use gamec_compiler::{check, compile, CompileError};
use gamec_ir::game::{ArrayDecl, GameBuilder, Scene};
use gamec_ir::ir::{Expr, Stmt, StmtKind, VarType};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn scene(name: &str) -> Scene {
    Scene {
        name: name.into(),
        on_enter: Vec::new(),
        on_frame: Vec::new(),
        on_exit: Vec::new(),
    }
}

/// A small but non-trivial game, rebuilt from scratch on every call so
/// determinism tests compare two independent constructions.
fn sample_game() -> gamec_ir::game::Game {
    let mut b = GameBuilder::new();
    b.variable(gamec_ir::game::Variable {
        name: "score".into(),
        ty: VarType::U16,
        initial: Some(0),
    });
    b.array(ArrayDecl {
        name: "inventory".into(),
        ty: VarType::U8,
        len: 8,
        initial: Vec::new(),
    });
    let mut main = scene("main");
    main.on_frame.push(Stmt::new(StmtKind::Assign {
        target: "score".into(),
        value: Expr::binary(
            Expr::var("score"),
            gamec_ir::ir::BinOp::Add,
            Expr::literal(1),
        ),
    }));
    b.scene(main).scene(scene("game_over")).start_scene("main");
    b.build()
}

// ══════════════════════════════════════════════════════════════════════════════
// Gating
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn invalid_game_produces_no_output() {
    // No start scene: a structural error.
    let game = GameBuilder::new().build();
    match compile(&game) {
        Err(CompileError::Validation(err)) => {
            assert!(!err.report.errors.is_empty());
            assert!(err.to_string().contains("validation failed"));
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}

#[test]
fn check_reports_without_compiling() {
    let report = check(&GameBuilder::new().build());
    assert!(!report.is_valid());
}

#[test]
fn warnings_pass_through_on_success() {
    let mut b = GameBuilder::new();
    b.array(ArrayDecl {
        name: "buffer".into(),
        ty: VarType::U8,
        len: 3600,
        initial: Vec::new(),
    });
    b.scene(scene("main")).start_scene("main");
    let compiled = compile(&b.build()).unwrap();
    assert!(compiled
        .warnings
        .iter()
        .any(|w| w.message.contains("approaches")));
    assert!(compiled.c_source.contains("void game_frame(void)"));
}

#[test]
fn valid_game_compiles_with_entry_points() {
    let compiled = compile(&sample_game()).unwrap();
    assert!(compiled.c_source.contains("void game_init(void)"));
    assert!(compiled.c_source.contains("void game_frame(void)"));
    assert!(compiled.c_source.contains("static uint16_t var_score = 0;"));
    assert!(compiled.c_source.contains("static uint8_t arr_inventory[8];"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Determinism
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn identical_games_compile_identically() {
    let first = compile(&sample_game()).unwrap();
    let second = compile(&sample_game()).unwrap();
    assert_eq!(first.c_source, second.c_source);
    assert_eq!(first.source_map.to_json(), second.source_map.to_json());
}
