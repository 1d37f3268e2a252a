//! State machine and sprite animation emitter.
//!
//! Each machine compiles to one state-index byte, a `goto` function that
//! runs exit/enter hooks around the switch, and an `update` function that
//! runs the current state's tick hook and then its transitions in
//! declaration order (first true condition wins). Sprite animations become
//! frame tables indexed by a per-sprite animation id.

use gamec_ir::game::{Game, Sprite, StateMachine};

use crate::error::CodegenResult;
use crate::expr::{emit_expr, LowerCtx};
use crate::names;
use crate::stmt::emit_stmts;
use crate::writer::CWriter;

/// Emit the `#define` state ids for one machine.
pub fn emit_state_ids(machine: &StateMachine, w: &mut CWriter) {
    for (id, state) in machine.states.iter().enumerate() {
        w.line(format!(
            "#define {} {id}",
            names::state_const(&machine.name, &state.name)
        ));
    }
}

/// Emit goto/update for one machine.
pub fn emit_machine(game: &Game, machine: &StateMachine, w: &mut CWriter) -> CodegenResult<()> {
    let m = names::c_ident(&machine.name);
    let state_var = format!("sm_{m}_state");

    w.set_symbol(format!("sm_{m}_goto"));
    w.open(format!("void sm_{m}_goto(uint8_t next)"));
    if machine.states.iter().any(|s| !s.on_exit.is_empty()) {
        w.open(format!("switch ({state_var})"));
        for state in &machine.states {
            if state.on_exit.is_empty() {
                continue;
            }
            w.open(format!(
                "case {}:",
                names::state_const(&machine.name, &state.name)
            ));
            let mut ctx = LowerCtx::global(game);
            emit_stmts(&state.on_exit, &mut ctx, w)?;
            w.line("break;");
            w.close();
        }
        w.close();
    }
    w.line(format!("{state_var} = next;"));
    if machine.states.iter().any(|s| !s.on_enter.is_empty()) {
        w.open("switch (next)");
        for state in &machine.states {
            if state.on_enter.is_empty() {
                continue;
            }
            w.open(format!(
                "case {}:",
                names::state_const(&machine.name, &state.name)
            ));
            let mut ctx = LowerCtx::global(game);
            emit_stmts(&state.on_enter, &mut ctx, w)?;
            w.line("break;");
            w.close();
        }
        w.close();
    }
    w.close();
    w.blank();

    w.set_symbol(format!("sm_{m}_update"));
    w.open(format!("void sm_{m}_update(void)"));
    w.open(format!("switch ({state_var})"));
    for state in &machine.states {
        w.open(format!(
            "case {}:",
            names::state_const(&machine.name, &state.name)
        ));
        let mut ctx = LowerCtx::global(game);
        emit_stmts(&state.on_tick, &mut ctx, w)?;
        for transition in &state.transitions {
            let ctx = LowerCtx::global(game);
            w.open(format!("if ({})", emit_expr(&transition.condition, &ctx)));
            w.line(format!(
                "sm_{m}_goto({});",
                names::state_const(&machine.name, &transition.target)
            ));
            w.line("break;");
            w.close();
        }
        w.line("break;");
        w.close();
    }
    w.close();
    w.close();
    w.clear_symbol();
    Ok(())
}

/// Emit the animation ids, frame tables, and play/advance functions for one
/// sprite with animations.
pub fn emit_sprite_animations(sprite: &Sprite, w: &mut CWriter) {
    let s = names::c_ident(&sprite.name);
    for (id, anim) in sprite.animations.iter().enumerate() {
        w.line(format!(
            "#define {} {id}",
            names::anim_const(&sprite.name, &anim.name)
        ));
    }
    for anim in &sprite.animations {
        let frames: Vec<String> = anim.frames.iter().map(u8::to_string).collect();
        w.line(format!(
            "static const uint8_t anim_{s}_{}_frames[{}] = {{ {} }};",
            names::c_ident(&anim.name),
            anim.frames.len(),
            frames.join(", ")
        ));
    }
    let table: Vec<String> = sprite
        .animations
        .iter()
        .map(|a| format!("anim_{s}_{}_frames", names::c_ident(&a.name)))
        .collect();
    let lens: Vec<String> = sprite
        .animations
        .iter()
        .map(|a| a.frames.len().to_string())
        .collect();
    let ticks: Vec<String> = sprite
        .animations
        .iter()
        .map(|a| a.ticks_per_frame.to_string())
        .collect();
    w.line(format!(
        "static const uint8_t *const anim_{s}_table[{}] = {{ {} }};",
        sprite.animations.len(),
        table.join(", ")
    ));
    w.line(format!(
        "static const uint8_t anim_{s}_len[{}] = {{ {} }};",
        sprite.animations.len(),
        lens.join(", ")
    ));
    w.line(format!(
        "static const uint8_t anim_{s}_ticks[{}] = {{ {} }};",
        sprite.animations.len(),
        ticks.join(", ")
    ));
    w.line(format!("static uint8_t sprite_{s}_anim;"));
    w.line(format!("static uint8_t sprite_{s}_frame;"));
    w.line(format!("static uint8_t sprite_{s}_tick;"));
    w.blank();

    w.open(format!("void sprite_{s}_play(uint8_t anim)"));
    w.line(format!("sprite_{s}_anim = anim;"));
    w.line(format!("sprite_{s}_frame = 0;"));
    w.line(format!("sprite_{s}_tick = 0;"));
    w.close();
    w.blank();

    w.open(format!("void sprite_{s}_animate(void)"));
    w.line(format!("sprite_{s}_tick++;"));
    w.open(format!(
        "if (sprite_{s}_tick >= anim_{s}_ticks[sprite_{s}_anim])"
    ));
    w.line(format!("sprite_{s}_tick = 0;"));
    w.line(format!("sprite_{s}_frame++;"));
    w.open(format!(
        "if (sprite_{s}_frame >= anim_{s}_len[sprite_{s}_anim])"
    ));
    w.line(format!("sprite_{s}_frame = 0;"));
    w.close();
    w.close();
    w.close();
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamec_ir::game::{GameBuilder, State, Transition};
    use gamec_ir::ir::{BinOp, Expr, Stmt, StmtKind};

    #[test]
    fn test_machine_transitions_in_order() {
        let game = GameBuilder::new().build();
        let machine = StateMachine {
            name: "boss".into(),
            initial: "idle".into(),
            states: vec![
                State {
                    name: "idle".into(),
                    on_enter: Vec::new(),
                    on_tick: vec![Stmt::new(StmtKind::Assign {
                        target: "timer".into(),
                        value: Expr::literal(0),
                    })],
                    on_exit: Vec::new(),
                    transitions: vec![Transition {
                        condition: Expr::binary(Expr::var("hp"), BinOp::Lt, Expr::literal(10)),
                        target: "rage".into(),
                    }],
                },
                State {
                    name: "rage".into(),
                    on_enter: Vec::new(),
                    on_tick: Vec::new(),
                    on_exit: Vec::new(),
                    transitions: Vec::new(),
                },
            ],
        };
        let mut w = CWriter::new();
        emit_state_ids(&machine, &mut w);
        emit_machine(&game, &machine, &mut w).unwrap();
        let (text, _) = w.finish();

        assert!(text.contains("#define SM_BOSS_IDLE 0"));
        assert!(text.contains("#define SM_BOSS_RAGE 1"));
        assert!(text.contains("if ((var_hp < 10))"));
        assert!(text.contains("sm_boss_goto(SM_BOSS_RAGE);"));
        // Tick hook runs before the transition check.
        let tick = text.find("var_timer = 0;").unwrap();
        let transition = text.find("sm_boss_goto(SM_BOSS_RAGE);").unwrap();
        assert!(tick < transition);
    }
}
