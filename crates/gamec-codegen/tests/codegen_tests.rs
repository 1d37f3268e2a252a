//! Integration tests for the C code generator.
//!
//! Tests exercise:
//! - Conditional section emission (unused subsystems produce no text)
//! - Dead-table elimination for easing curves
//! - Source map accuracy against the generated text
//! - Pool spawn/overflow shape and particle lifetimes
//! - Pathfinder emission per grid, including heuristics
//! - Scene switching order (exit, swap, enter)
//! - Camera constant scaling against the 8.8 position format

use gamec_codegen::generate;
use gamec_ir::game::{
    Camera, Entity, GameBuilder, Heuristic, NavGrid, Pool, Position, Scene, Sprite, Variable,
};
use gamec_ir::ir::{Easing, Expr, PoolOp, Stmt, StmtKind, Tween, VarType};
use gamec_ir::Origin;

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

fn sprite(name: &str) -> Sprite {
    Sprite {
        name: name.into(),
        asset: format!("{name}.png"),
        width: 8,
        height: 8,
        position: None,
        hitbox: None,
        animations: Vec::new(),
        palette: None,
    }
}

fn pool(name: &str, capacity: u8) -> Pool {
    Pool {
        name: name.into(),
        capacity,
        has_position: false,
        has_velocity: false,
        sprite: None,
        fields: Vec::new(),
        on_spawn: Vec::new(),
        on_frame: Vec::new(),
        on_despawn: Vec::new(),
        despawn_when: Vec::new(),
    }
}

fn assign(target: &str, value: i32) -> Stmt {
    Stmt::new(StmtKind::Assign {
        target: target.into(),
        value: Expr::literal(value),
    })
}

/// A builder pre-seeded with a valid start scene.
fn base() -> GameBuilder {
    let mut b = GameBuilder::new();
    b.scene(scene("main")).start_scene("main");
    b
}

fn generate_text(game: &gamec_ir::game::Game) -> String {
    generate(game).expect("generation failed").c_source
}

// ══════════════════════════════════════════════════════════════════════════════
// Conditional sections
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn minimal_game_emits_only_the_core_skeleton() {
    let text = generate_text(&base().build());
    assert!(text.starts_with("/* generated by gamec; do not edit */"));
    assert!(text.contains("#include <stdint.h>"));
    assert!(text.contains("void game_init(void)"));
    assert!(text.contains("void game_frame(void)"));

    // Unused subsystems leave no trace.
    assert!(!text.contains("tween_update"));
    assert!(!text.contains("camera_update"));
    assert!(!text.contains("fade_update"));
    assert!(!text.contains("astar_"));
    assert!(!text.contains("pool_overflow_flags"));
    assert!(!text.contains("input_update"));
}

#[test]
fn only_referenced_easing_tables_are_emitted() {
    let mut b = GameBuilder::new();
    b.variable(Variable {
        name: "hp".into(),
        ty: VarType::U8,
        initial: None,
    });
    let mut main = scene("main");
    main.on_enter.push(Stmt::new(StmtKind::Tween(Tween {
        target: "hp".into(),
        target_type: VarType::U8,
        from: Expr::literal(0),
        to: Expr::literal(100),
        duration_frames: 30,
        easing: Easing::QuadIn,
    })));
    b.scene(main).start_scene("main");
    let text = generate_text(&b.build());

    assert!(text.contains("#define EASE_QUAD_IN 0"));
    assert!(text.contains("static const uint16_t ease_quad_in[256]"));
    assert!(text.contains("tween_update"));
    assert!(!text.contains("ease_linear"));
    assert!(!text.contains("ease_bounce"));
    // Exactly one table is wired into the dispatch array.
    assert!(text.contains("static const uint16_t *const ease_tables[1] = { ease_quad_in };"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Source map
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn source_map_lines_point_at_the_emitted_statement() {
    let mut b = GameBuilder::new();
    b.variable(Variable {
        name: "score".into(),
        ty: VarType::U16,
        initial: None,
    });
    let mut main = scene("main");
    main.on_enter
        .push(assign("score", 7).tagged(Origin::new("game.src", 12, 5)));
    b.scene(main).start_scene("main");
    let generated = generate(&b.build()).expect("generation failed");

    let entry = generated
        .source_map
        .entries
        .iter()
        .find(|e| e.line == 12)
        .expect("no entry for the tagged statement");
    assert_eq!(entry.file, "game.src");
    assert_eq!(entry.column, 5);
    assert_eq!(entry.symbol.as_deref(), Some("scene_main_enter"));

    let lines: Vec<&str> = generated.c_source.lines().collect();
    let emitted = lines[(entry.generated_line - 1) as usize];
    assert!(emitted.contains("var_score = 7;"), "line was: {emitted}");
}

// ══════════════════════════════════════════════════════════════════════════════
// Pools
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn try_spawn_branches_on_the_slot_sentinel() {
    let mut b = base();
    b.variable(Variable {
        name: "shots".into(),
        ty: VarType::U8,
        initial: None,
    });
    let mut bullets = pool("bullets", 3);
    bullets.fields.push(gamec_ir::game::SlotField {
        name: "dmg".into(),
        ty: VarType::U8,
    });
    bullets.on_spawn.push(assign("dmg", 2));
    b.pool(bullets);
    let mut level = scene("level");
    level.on_frame.push(Stmt::new(StmtKind::Pool(PoolOp::TrySpawn {
        pool: "bullets".into(),
        on_spawned: vec![assign("shots", 1)],
        on_full: Vec::new(),
    })));
    b.scene(level);
    let text = generate_text(&b.build());

    assert!(text.contains("uint8_t slot = pool_bullets_spawn();"));
    assert!(text.contains("if (slot != 0xFF)"));
    assert!(text.contains("static uint8_t pool_overflow_flags[1];"));
    assert!(text.contains("static uint8_t pool_bullets_dmg[3];"));
    assert!(text.contains("pool_bullets_dmg[i] = 2;"));
    assert!(text.contains("pool_overflow_flags[0] |= 1;"));
    assert!(text.contains("var_shots = 1;"));
}

#[test]
fn particles_carry_an_implicit_lifetime() {
    let mut b = base();
    b.particles(gamec_ir::game::ParticleSystem {
        pool: pool("sparks", 6),
        lifetime_frames: 45,
    });
    let text = generate_text(&b.build());

    assert!(text.contains("static uint16_t pool_sparks__lifetime[6];"));
    assert!(text.contains("pool_sparks__lifetime[i] = 45;"));
    // Decrement guarded against wrap, then the implicit despawn predicate.
    assert!(text.contains("pool_sparks__lifetime[i] == 0"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Sprite animations
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn animated_sprites_get_tables_and_a_frame_ticker() {
    let mut b = base();
    let mut hero = sprite("hero");
    hero.animations.push(gamec_ir::game::Animation {
        name: "walk".into(),
        frames: vec![0, 1, 2],
        ticks_per_frame: 8,
    });
    b.sprite(hero);
    let mut level = scene("level");
    level.on_enter.push(Stmt::new(StmtKind::Animation {
        sprite: "hero".into(),
        animation: "walk".into(),
    }));
    b.scene(level);
    let text = generate_text(&b.build());

    assert!(text.contains("#define ANIM_HERO_WALK 0"));
    assert!(text.contains("static const uint8_t anim_hero_walk_frames[3] = { 0, 1, 2 };"));
    assert!(text.contains("void sprite_hero_play(uint8_t anim)"));
    assert!(text.contains("sprite_hero_play(ANIM_HERO_WALK);"));
    // The frame entry point advances the ticker.
    assert!(text.contains("sprite_hero_animate();"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Pathfinding
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn nav_grid_emits_bitmap_scratch_and_search() {
    let mut b = base();
    b.nav_grid(NavGrid {
        name: "field".into(),
        width: 4,
        height: 4,
        walkable: vec![true; 16],
        cost: None,
        heuristic: Heuristic::Manhattan,
    });
    let text = generate_text(&b.build());

    assert!(text.contains("#define NAV_FIELD_W 4"));
    assert!(text.contains("#define NAV_FIELD_H 4"));
    assert!(text.contains("static const uint8_t nav_field_walk["));
    assert!(text.contains("static uint8_t nav_field_h(uint8_t a, uint8_t b)"));
    assert!(text.contains("uint8_t nav_field_find(uint8_t start, uint8_t goal)"));
    // Shared scratch sized for the largest grid.
    assert!(text.contains("static uint16_t astar_node["));
    assert!(text.contains("path_waypoints[32];"));
    // No per-tile cost table was declared.
    assert!(!text.contains("nav_field_cost"));
}

#[test]
fn oversized_nav_grid_is_rejected() {
    let mut b = base();
    b.nav_grid(NavGrid {
        name: "huge".into(),
        width: 20,
        height: 20,
        walkable: vec![true; 400],
        cost: None,
        heuristic: Heuristic::Manhattan,
    });
    assert!(generate(&b.build()).is_err());
}

// ══════════════════════════════════════════════════════════════════════════════
// Scenes
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn scene_goto_runs_exit_then_swap_then_enter() {
    let mut b = GameBuilder::new();
    b.variable(Variable {
        name: "score".into(),
        ty: VarType::U8,
        initial: None,
    });
    let mut main = scene("main");
    main.on_exit.push(assign("score", 0));
    let mut level = scene("level");
    level.on_enter.push(assign("score", 1));
    b.scene(main).scene(level).start_scene("main");
    let text = generate_text(&b.build());

    let goto_at = text.find("void scene_goto(uint8_t next)").expect("no scene_goto");
    let body = &text[goto_at..];
    let exit_at = body.find("scene_main_exit();").expect("no exit call");
    let swap_at = body.find("scene_current = next;").expect("no swap");
    let enter_at = body.find("scene_level_enter();").expect("no enter call");
    assert!(exit_at < swap_at && swap_at < enter_at);
}

#[test]
fn game_init_seeds_the_start_scene_without_running_exit_hooks() {
    let mut b = GameBuilder::new();
    b.variable(Variable {
        name: "score".into(),
        ty: VarType::U8,
        initial: None,
    });
    let mut main = scene("main");
    main.on_enter.push(assign("score", 1));
    main.on_exit.push(assign("score", 0));
    b.scene(main).start_scene("main");
    let text = generate_text(&b.build());

    let init_at = text.find("void game_init(void)").expect("no game_init");
    let init_body = &text[init_at..text[init_at..].find("\n}").unwrap() + init_at];
    assert!(init_body.contains("scene_current = SCENE_MAIN;"));
    assert!(init_body.contains("scene_main_enter();"));
    assert!(!init_body.contains("scene_goto"));
}

// ══════════════════════════════════════════════════════════════════════════════
// Camera
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn camera_constants_are_scaled_to_match_the_position_format() {
    let mut b = base();
    b.entity(Entity {
        name: "hero".into(),
        position: Some(Position { x: 2.0, y: 1.0 }),
        velocity: None,
        sprite: None,
        hitbox: None,
        tags: Vec::new(),
        physics: None,
        state_machine: None,
    });
    b.camera(Camera {
        follow: Some("hero".into()),
        deadzone_w: 16,
        deadzone_h: 12,
        bounds_w: 100,
        bounds_h: 80,
    });
    let text = generate_text(&b.build());

    // Entity positions store at 256 units per pixel; the deadzone and
    // bound comparisons must use the same scale.
    assert!(text.contains("static int16_t ent_hero_x = 512;"));
    assert!(text.contains("if (tx - camera_x > 2048) camera_x = tx - 2048;"));
    assert!(text.contains("if (ty - camera_y > 1536) camera_y = ty - 1536;"));
    assert!(text.contains("if (camera_x > 25600) camera_x = 25600;"));
    assert!(text.contains("if (camera_y > 20480) camera_y = 20480;"));
    assert!(!text.contains("camera_x > 100)"));
}
