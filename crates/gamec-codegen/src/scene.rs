//! Scene and cutscene emitter.
//!
//! Scenes compile to one function per non-empty hook plus `scene_goto`,
//! which runs the current scene's exit hook, switches, then runs the new
//! scene's enter hook. The current scene index is a single byte.

use gamec_ir::game::Game;

use crate::error::CodegenResult;
use crate::expr::LowerCtx;
use crate::names;
use crate::stmt::emit_stmts;
use crate::writer::CWriter;

pub fn emit_scene_ids(game: &Game, w: &mut CWriter) {
    for (id, scene) in game.scenes.iter().enumerate() {
        w.line(format!("#define {} {id}", names::scene_const(&scene.name)));
    }
}

pub fn emit_cutscenes(game: &Game, w: &mut CWriter) -> CodegenResult<()> {
    for cutscene in &game.cutscenes {
        let c = names::c_ident(&cutscene.name);
        w.set_symbol(format!("cutscene_{c}"));
        w.open(format!("void cutscene_{c}(void)"));
        let mut ctx = LowerCtx::global(game);
        emit_stmts(&cutscene.steps, &mut ctx, w)?;
        w.close();
        w.clear_symbol();
        w.blank();
    }
    Ok(())
}

pub fn emit_scene_functions(game: &Game, w: &mut CWriter) -> CodegenResult<()> {
    for scene in &game.scenes {
        let s = names::c_ident(&scene.name);
        for (hook, stmts) in [
            ("enter", &scene.on_enter),
            ("frame", &scene.on_frame),
            ("exit", &scene.on_exit),
        ] {
            if stmts.is_empty() {
                continue;
            }
            w.set_symbol(format!("scene_{s}_{hook}"));
            w.open(format!("void scene_{s}_{hook}(void)"));
            let mut ctx = LowerCtx::global(game);
            emit_stmts(stmts, &mut ctx, w)?;
            w.close();
            w.clear_symbol();
            w.blank();
        }
    }
    Ok(())
}

pub fn emit_scene_goto(game: &Game, w: &mut CWriter) {
    w.open("void scene_goto(uint8_t next)");
    if game.scenes.iter().any(|s| !s.on_exit.is_empty()) {
        w.open("switch (scene_current)");
        for scene in &game.scenes {
            if scene.on_exit.is_empty() {
                continue;
            }
            let s = names::c_ident(&scene.name);
            w.open(format!("case {}:", names::scene_const(&scene.name)));
            w.line(format!("scene_{s}_exit();"));
            w.line("break;");
            w.close();
        }
        w.close();
    }
    w.line("scene_current = next;");
    if game.scenes.iter().any(|s| !s.on_enter.is_empty()) {
        w.open("switch (next)");
        for scene in &game.scenes {
            if scene.on_enter.is_empty() {
                continue;
            }
            let s = names::c_ident(&scene.name);
            w.open(format!("case {}:", names::scene_const(&scene.name)));
            w.line(format!("scene_{s}_enter();"));
            w.line("break;");
            w.close();
        }
        w.close();
    }
    w.close();
}

/// Per-frame scene dispatch: run the current scene's frame hook.
pub fn emit_scene_frame_dispatch(game: &Game, w: &mut CWriter) {
    if !game.scenes.iter().any(|s| !s.on_frame.is_empty()) {
        return;
    }
    w.open("switch (scene_current)");
    for scene in &game.scenes {
        if scene.on_frame.is_empty() {
            continue;
        }
        let s = names::c_ident(&scene.name);
        w.open(format!("case {}:", names::scene_const(&scene.name)));
        w.line(format!("scene_{s}_frame();"));
        w.line("break;");
        w.close();
    }
    w.close();
}
