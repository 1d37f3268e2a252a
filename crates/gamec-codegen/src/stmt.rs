//! Statement lowering — IR statements to C text.
//!
//! Every statement lands on at least one physical line, and the first line
//! of each statement records the statement's origin into the source map.
//! Control flow nests through the writer's indentation; subsystem statements
//! lower to calls into the generated support functions.

use gamec_ir::ir::{
    CameraOp, DialogOp, MenuOp, MixerOp, PoolOp, Stmt, StmtKind, TransitionOp, Tween,
};
use gamec_ir::Origin;

use crate::error::CodegenResult;
use crate::expr::{emit_expr, LowerCtx};
use crate::names;
use crate::writer::CWriter;

pub fn emit_stmts(stmts: &[Stmt], ctx: &mut LowerCtx<'_>, w: &mut CWriter) -> CodegenResult<()> {
    for stmt in stmts {
        emit_stmt(stmt, ctx, w)?;
    }
    Ok(())
}

pub fn emit_stmt(stmt: &Stmt, ctx: &mut LowerCtx<'_>, w: &mut CWriter) -> CodegenResult<()> {
    let origin = stmt.origin.as_ref();
    match &stmt.kind {
        StmtKind::Assign { target, value } => {
            let lvalue = ctx.lvalue(target);
            w.stmt_line(format!("{lvalue} = {};", emit_expr(value, ctx)), origin);
        }
        StmtKind::ArrayAssign {
            array,
            index,
            value,
        } => {
            w.stmt_line(
                format!(
                    "{}[{}] = {};",
                    names::array(array),
                    emit_expr(index, ctx),
                    emit_expr(value, ctx)
                ),
                origin,
            );
        }
        StmtKind::If {
            condition,
            then_body,
            else_body,
        } => {
            w.open_at(format!("if ({})", emit_expr(condition, ctx)), origin);
            emit_stmts(then_body, ctx, w)?;
            if !else_body.is_empty() {
                w.else_arm();
                emit_stmts(else_body, ctx, w)?;
            }
            w.close();
        }
        StmtKind::When { condition, body } => {
            w.open_at(format!("if ({})", emit_expr(condition, ctx)), origin);
            emit_stmts(body, ctx, w)?;
            w.close();
        }
        StmtKind::While { condition, body } => {
            w.open_at(format!("while ({})", emit_expr(condition, ctx)), origin);
            emit_stmts(body, ctx, w)?;
            w.close();
        }
        StmtKind::For {
            var,
            from,
            to,
            body,
        } => {
            let c_var = names::c_ident(var);
            w.open_at(
                format!("for (int16_t {c_var} = {from}; {c_var} <= {to}; {c_var}++)"),
                origin,
            );
            ctx.loop_vars.push(var.clone());
            emit_stmts(body, ctx, w)?;
            ctx.loop_vars.pop();
            w.close();
        }
        StmtKind::Call { cutscene } => {
            w.stmt_line(format!("cutscene_{}();", names::c_ident(cutscene)), origin);
        }
        StmtKind::SceneChange { scene } => {
            w.stmt_line(format!("scene_goto({});", names::scene_const(scene)), origin);
        }
        StmtKind::RawEmit { code } => {
            let mut first = origin;
            for raw in code.lines() {
                w.stmt_line(raw, first.take());
            }
        }
        StmtKind::Animation { sprite, animation } => {
            w.stmt_line(
                format!(
                    "sprite_{}_play({});",
                    names::c_ident(sprite),
                    names::anim_const(sprite, animation)
                ),
                origin,
            );
        }
        StmtKind::Camera(op) => emit_camera(op, ctx, w, origin),
        StmtKind::Transition(op) => {
            let call = match op {
                TransitionOp::FadeOut { frames } => format!("fade_out({frames});"),
                TransitionOp::FadeIn { frames } => format!("fade_in({frames});"),
            };
            w.stmt_line(call, origin);
        }
        StmtKind::Pool(op) => emit_pool_op(op, ctx, w, origin)?,
        StmtKind::Menu(MenuOp::Open { menu }) => {
            w.stmt_line(format!("menu_open(MENU_{});", names::c_const(menu)), origin);
        }
        StmtKind::Menu(MenuOp::Close) => w.stmt_line("menu_close();", origin),
        StmtKind::Dialog(DialogOp::Show { dialog }) => {
            w.stmt_line(
                format!("dialog_show(DIALOG_{});", names::c_const(dialog)),
                origin,
            );
        }
        StmtKind::Dialog(DialogOp::Hide) => w.stmt_line("dialog_hide();", origin),
        StmtKind::Mixer(op) => {
            let call = match op {
                MixerOp::Play { group, sound } => {
                    format!("mixer_play(AUDIO_{}, {sound});", names::c_const(group))
                }
                MixerOp::Stop { group } => {
                    format!("mixer_stop(AUDIO_{});", names::c_const(group))
                }
                MixerOp::SetVolume { group, volume } => format!(
                    "mixer_set_volume(AUDIO_{}, {});",
                    names::c_const(group),
                    emit_expr(volume, ctx)
                ),
            };
            w.stmt_line(call, origin);
        }
        StmtKind::Tween(tween) => emit_tween_start(tween, ctx, w, origin),
    }
    Ok(())
}

fn emit_camera(op: &CameraOp, ctx: &LowerCtx<'_>, w: &mut CWriter, origin: Option<&Origin>) {
    match op {
        CameraOp::Follow { entity } => {
            w.stmt_line(
                format!("camera_follow(ENTITY_{});", names::c_const(entity)),
                origin,
            );
        }
        CameraOp::MoveTo { x, y } => {
            w.stmt_line(
                format!(
                    "camera_move_to({}, {});",
                    emit_expr(x, ctx),
                    emit_expr(y, ctx)
                ),
                origin,
            );
        }
        CameraOp::Shake { frames } => {
            w.stmt_line(format!("camera_shake({frames});"), origin);
        }
    }
}

fn emit_pool_op(
    op: &PoolOp,
    ctx: &mut LowerCtx<'_>,
    w: &mut CWriter,
    origin: Option<&Origin>,
) -> CodegenResult<()> {
    match op {
        PoolOp::Spawn { pool } => {
            // Overflow policy (sticky flag, no overwrite) lives inside the
            // generated spawn function.
            w.stmt_line(
                format!("(void)pool_{}_spawn();", names::c_ident(pool)),
                origin,
            );
        }
        PoolOp::TrySpawn {
            pool,
            on_spawned,
            on_full,
        } => {
            let p = names::c_ident(pool);
            w.open_at("", origin);
            w.line(format!("uint8_t slot = pool_{p}_spawn();"));
            w.open("if (slot != 0xFF)");
            emit_stmts(on_spawned, ctx, w)?;
            if !on_full.is_empty() {
                w.else_arm();
                emit_stmts(on_full, ctx, w)?;
            }
            w.close();
            w.close();
        }
        PoolOp::DespawnAll { pool } => {
            w.stmt_line(
                format!("pool_{}_despawn_all();", names::c_ident(pool)),
                origin,
            );
        }
    }
    Ok(())
}

fn emit_tween_start(tween: &Tween, ctx: &LowerCtx<'_>, w: &mut CWriter, origin: Option<&Origin>) {
    let wide = if tween.target_type.size_bytes() == 2 { 1 } else { 0 };
    let target = ctx.lvalue(&tween.target);
    w.stmt_line(
        format!(
            "tween_start((void *)&{target}, {wide}, {}, {}, {}, {});",
            emit_expr(&tween.from, ctx),
            emit_expr(&tween.to, ctx),
            tween.duration_frames,
            names::easing_const(tween.easing.c_suffix())
        ),
        origin,
    );
}
