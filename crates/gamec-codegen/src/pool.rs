//! Pool and particle emitter.
//!
//! Each pool is a structure-of-arrays: one active byte per slot plus one
//! array per declared field (and x/y/vx/vy when position/velocity are
//! enabled). `spawn` scans for the first inactive slot; on a full pool it
//! sets the pool's sticky bit in `pool_overflow_flags` and returns 0xFF,
//! never overwriting a live slot. A particle system is exactly a pool whose
//! `_lifetime` counter is initialized in spawn, decremented at the top of
//! update, and checked by an implicit despawn predicate appended after the
//! user ones.

use gamec_ir::game::{Game, Pool};

use crate::error::CodegenResult;
use crate::expr::{emit_expr, LowerCtx, SLOT_VAR};
use crate::names;
use crate::stmt::emit_stmts;
use crate::writer::CWriter;

/// The implicit particle lifetime field name.
const LIFETIME_FIELD: &str = "_lifetime";

fn lifetime_array(pool: &Pool) -> String {
    names::pool_field(&pool.name, LIFETIME_FIELD)
}

/// Emit the static slot arrays for one pool.
pub fn emit_storage(pool: &Pool, lifetime: Option<u16>, w: &mut CWriter) {
    let cap = pool.capacity;
    let p = names::c_ident(&pool.name);
    w.line(format!("static uint8_t pool_{p}_active[{cap}];"));
    if pool.has_position {
        w.line(format!("static int16_t {}[{cap}];", names::pool_field(&pool.name, "x")));
        w.line(format!("static int16_t {}[{cap}];", names::pool_field(&pool.name, "y")));
    }
    if pool.has_velocity {
        w.line(format!("static int16_t {}[{cap}];", names::pool_field(&pool.name, "vx")));
        w.line(format!("static int16_t {}[{cap}];", names::pool_field(&pool.name, "vy")));
    }
    if lifetime.is_some() {
        w.line(format!("static uint16_t {}[{cap}];", lifetime_array(pool)));
    }
    for field in &pool.fields {
        w.line(format!(
            "static {} {}[{cap}];",
            field.ty.c_name(),
            names::pool_field(&pool.name, &field.name)
        ));
    }
}

/// Emit the shared sticky overflow bitmap, one bit per pool in declaration
/// order (pools first, then particle systems).
pub fn emit_overflow_flags(pool_count: usize, w: &mut CWriter) {
    w.line(format!(
        "static uint8_t pool_overflow_flags[{}];",
        pool_count.div_ceil(8)
    ));
}

/// Emit spawn/despawn/update for one pool. `index` is the pool's bit in the
/// overflow bitmap; `lifetime` carries the particle lifetime, if any.
pub fn emit_functions(
    game: &Game,
    pool: &Pool,
    index: usize,
    lifetime: Option<u16>,
    w: &mut CWriter,
) -> CodegenResult<()> {
    let p = names::c_ident(&pool.name);
    let cap = pool.capacity;
    let has_lifetime = lifetime.is_some();

    w.set_symbol(format!("pool_{p}_spawn"));
    w.open(format!("uint8_t pool_{p}_spawn(void)"));
    w.line(format!("uint8_t {SLOT_VAR};"));
    w.open(format!("for ({SLOT_VAR} = 0; {SLOT_VAR} < {cap}; {SLOT_VAR}++)"));
    w.open(format!("if (!pool_{p}_active[{SLOT_VAR}])"));
    w.line(format!("pool_{p}_active[{SLOT_VAR}] = 1;"));
    if let Some(frames) = lifetime {
        w.line(format!("{}[{SLOT_VAR}] = {frames};", lifetime_array(pool)));
    }
    let mut ctx = LowerCtx::in_pool(game, pool, has_lifetime);
    emit_stmts(&pool.on_spawn, &mut ctx, w)?;
    w.line(format!("return {SLOT_VAR};"));
    w.close();
    w.close();
    w.line(format!(
        "pool_overflow_flags[{}] |= {};",
        index / 8,
        1u8 << (index % 8)
    ));
    w.line("return 0xFF;");
    w.close();
    w.blank();

    w.set_symbol(format!("pool_{p}_despawn"));
    w.open(format!("static void pool_{p}_despawn(uint8_t {SLOT_VAR})"));
    let mut ctx = LowerCtx::in_pool(game, pool, has_lifetime);
    emit_stmts(&pool.on_despawn, &mut ctx, w)?;
    w.line(format!("pool_{p}_active[{SLOT_VAR}] = 0;"));
    w.close();
    w.blank();

    w.clear_symbol();
    w.open(format!("void pool_{p}_despawn_all(void)"));
    w.line(format!("uint8_t {SLOT_VAR};"));
    w.open(format!("for ({SLOT_VAR} = 0; {SLOT_VAR} < {cap}; {SLOT_VAR}++)"));
    w.open(format!("if (pool_{p}_active[{SLOT_VAR}])"));
    w.line(format!("pool_{p}_despawn({SLOT_VAR});"));
    w.close();
    w.close();
    w.close();
    w.blank();

    w.set_symbol(format!("pool_{p}_update"));
    w.open(format!("void pool_{p}_update(void)"));
    w.line(format!("uint8_t {SLOT_VAR};"));
    w.open(format!("for ({SLOT_VAR} = 0; {SLOT_VAR} < {cap}; {SLOT_VAR}++)"));
    w.open(format!("if (!pool_{p}_active[{SLOT_VAR}])"));
    w.line("continue;");
    w.close();
    if has_lifetime {
        w.open(format!("if ({}[{SLOT_VAR}] > 0)", lifetime_array(pool)));
        w.line(format!("{}[{SLOT_VAR}]--;", lifetime_array(pool)));
        w.close();
    }
    let mut ctx = LowerCtx::in_pool(game, pool, has_lifetime);
    emit_stmts(&pool.on_frame, &mut ctx, w)?;

    // despawnWhen is the logical OR of user predicates, with the lifetime
    // expiry appended for particles.
    let mut predicates: Vec<String> = pool
        .despawn_when
        .iter()
        .map(|e| emit_expr(e, &ctx))
        .collect();
    if has_lifetime {
        predicates.push(format!("({}[{SLOT_VAR}] == 0)", lifetime_array(pool)));
    }
    if !predicates.is_empty() {
        w.open(format!("if ({})", predicates.join(" || ")));
        w.line(format!("pool_{p}_despawn({SLOT_VAR});"));
        w.close();
    }
    w.close();
    w.close();
    w.clear_symbol();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamec_ir::game::{GameBuilder, SlotField};
    use gamec_ir::ir::{Expr, Stmt, StmtKind, VarType};

    fn bullet_pool() -> Pool {
        Pool {
            name: "bullets".into(),
            capacity: 3,
            has_position: true,
            has_velocity: false,
            sprite: None,
            fields: vec![SlotField {
                name: "dmg".into(),
                ty: VarType::U8,
            }],
            on_spawn: vec![Stmt::new(StmtKind::Assign {
                target: "dmg".into(),
                value: Expr::literal(2),
            })],
            on_frame: Vec::new(),
            on_despawn: Vec::new(),
            despawn_when: vec![Expr::binary(
                Expr::var("y"),
                gamec_ir::ir::BinOp::Lt,
                Expr::literal(0),
            )],
        }
    }

    #[test]
    fn test_spawn_scans_and_flags_overflow() {
        let game = GameBuilder::new().build();
        let pool = bullet_pool();
        let mut w = CWriter::new();
        emit_storage(&pool, None, &mut w);
        emit_functions(&game, &pool, 0, None, &mut w).unwrap();
        let (text, _) = w.finish();

        assert!(text.contains("static uint8_t pool_bullets_active[3];"));
        assert!(text.contains("static uint8_t pool_bullets_dmg[3];"));
        assert!(text.contains("pool_bullets_dmg[i] = 2;"));
        assert!(text.contains("pool_overflow_flags[0] |= 1;"));
        assert!(text.contains("return 0xFF;"));
    }

    #[test]
    fn test_particle_lifetime_is_implicit() {
        let game = GameBuilder::new().build();
        let pool = bullet_pool();
        let mut w = CWriter::new();
        emit_storage(&pool, Some(30), &mut w);
        emit_functions(&game, &pool, 0, Some(30), &mut w).unwrap();
        let (text, _) = w.finish();

        assert!(text.contains("pool_bullets__lifetime[i] = 30;"));
        assert!(text.contains("pool_bullets__lifetime[i]--;"));
        // User predicate first, lifetime expiry appended.
        assert!(text.contains("if ((pool_bullets_y[i] < 0) || (pool_bullets__lifetime[i] == 0))"));
    }
}
