//! Support subsystem emitters: camera, screen fades, audio mixer, save
//! data, dialogs, menus, input buffers, and link constants.
//!
//! Each subsystem is emitted only when the corresponding declaration
//! exists. Hardware register access is left to the platform layer; the
//! generated code maintains the state the platform layer reads.

use gamec_ir::game::{Button, Camera, ChecksumKind, Dialog, Game, Menu, SaveSchema};
use gamec_ir::ir::{visit_stmts, StmtKind};

use crate::error::CodegenResult;
use crate::expr::LowerCtx;
use crate::fixed::to_fixed;
use crate::names;
use crate::stmt::emit_stmts;
use crate::writer::CWriter;

// ══════════════════════════════════════════════════════════════════════════════
// Camera
// ══════════════════════════════════════════════════════════════════════════════

pub fn emit_camera_storage(w: &mut CWriter) {
    w.line("static int16_t camera_x;");
    w.line("static int16_t camera_y;");
    w.line("static uint8_t camera_shake_frames;");
    w.line("static uint8_t camera_follow_target; /* entity id, 0xFF = none */");
}

pub fn emit_camera_functions(game: &Game, camera: &Camera, w: &mut CWriter) {
    w.open("void camera_follow(uint8_t entity)");
    w.line("camera_follow_target = entity;");
    w.close();
    w.blank();

    w.open("void camera_move_to(int16_t x, int16_t y)");
    w.line("camera_follow_target = 0xFF;");
    w.line("camera_x = x;");
    w.line("camera_y = y;");
    w.close();
    w.blank();

    w.open("void camera_shake(uint8_t frames)");
    w.line("camera_shake_frames = frames;");
    w.close();
    w.blank();

    w.open("void camera_update(void)");
    w.line("int16_t tx = camera_x;");
    w.line("int16_t ty = camera_y;");
    w.open("if (camera_shake_frames > 0)");
    w.line("camera_shake_frames--;");
    w.close();
    let tracked: Vec<&gamec_ir::game::Entity> = game
        .entities
        .iter()
        .filter(|e| e.position.is_some())
        .collect();
    if !tracked.is_empty() {
        w.open("switch (camera_follow_target)");
        for entity in tracked {
            let e = names::c_ident(&entity.name);
            w.open(format!("case ENTITY_{}:", names::c_const(&entity.name)));
            w.line(format!("tx = ent_{e}_x;"));
            w.line(format!("ty = ent_{e}_y;"));
            w.line("break;");
            w.close();
        }
        w.open("default:");
        w.line("break;");
        w.close();
        w.close();
    }
    // Deadzone and bounds are configured in pixels; camera positions and
    // entity positions are 8.8, so the constants scale by 256 once here.
    let half_w = to_fixed(f32::from(camera.deadzone_w) / 2.0);
    let half_h = to_fixed(f32::from(camera.deadzone_h) / 2.0);
    let max_x = to_fixed(f32::from(camera.bounds_w));
    let max_y = to_fixed(f32::from(camera.bounds_h));
    w.line(format!("if (tx - camera_x > {half_w}) camera_x = tx - {half_w};"));
    w.line(format!("if (camera_x - tx > {half_w}) camera_x = tx + {half_w};"));
    w.line(format!("if (ty - camera_y > {half_h}) camera_y = ty - {half_h};"));
    w.line(format!("if (camera_y - ty > {half_h}) camera_y = ty + {half_h};"));
    w.line("if (camera_x < 0) camera_x = 0;");
    w.line(format!("if (camera_x > {max_x}) camera_x = {max_x};"));
    w.line("if (camera_y < 0) camera_y = 0;");
    w.line(format!("if (camera_y > {max_y}) camera_y = {max_y};"));
    w.close();
}

// ══════════════════════════════════════════════════════════════════════════════
// Screen fades
// ══════════════════════════════════════════════════════════════════════════════

/// True when any hook contains a fade statement.
pub fn uses_fades(game: &Game) -> bool {
    let mut found = false;
    for hook in game.hooks() {
        visit_stmts(hook.stmts, &mut |stmt| {
            if matches!(stmt.kind, StmtKind::Transition(_)) {
                found = true;
            }
        });
    }
    found
}

pub fn emit_fade_functions(w: &mut CWriter) {
    w.line("static uint8_t fade_mode; /* 0 idle, 1 out, 2 in */");
    w.line("static uint8_t fade_frames;");
    w.blank();
    w.open("void fade_out(uint8_t frames)");
    w.line("fade_mode = 1;");
    w.line("fade_frames = frames;");
    w.close();
    w.blank();
    w.open("void fade_in(uint8_t frames)");
    w.line("fade_mode = 2;");
    w.line("fade_frames = frames;");
    w.close();
    w.blank();
    w.open("void fade_update(void)");
    w.open("if (fade_mode != 0 && fade_frames > 0)");
    w.line("fade_frames--;");
    w.open("if (fade_frames == 0)");
    w.line("fade_mode = 0;");
    w.close();
    w.close();
    w.close();
}

// ══════════════════════════════════════════════════════════════════════════════
// Audio mixer
// ══════════════════════════════════════════════════════════════════════════════

pub fn emit_mixer(game: &Game, w: &mut CWriter) {
    let groups = &game.mixer.groups;
    for (id, group) in groups.iter().enumerate() {
        w.line(format!("#define AUDIO_{} {id}", names::c_const(&group.name)));
    }
    w.line(format!("static uint8_t audio_volume[{}];", groups.len()));
    w.line(format!(
        "static uint8_t audio_playing[{}]; /* sound id, 0xFF = silent */",
        groups.len()
    ));
    w.blank();

    w.open("void mixer_play(uint8_t group, uint8_t sound)");
    w.line("audio_playing[group] = sound;");
    w.close();
    w.blank();
    w.open("void mixer_stop(uint8_t group)");
    w.line("audio_playing[group] = 0xFF;");
    w.close();
    w.blank();
    w.open("void mixer_set_volume(uint8_t group, uint8_t volume)");
    w.line("audio_volume[group] = volume;");
    w.close();
}

// ══════════════════════════════════════════════════════════════════════════════
// Save data
// ══════════════════════════════════════════════════════════════════════════════

fn checksum_len(kind: ChecksumKind) -> u32 {
    match kind {
        ChecksumKind::None => 0,
        ChecksumKind::Xor | ChecksumKind::Crc8 => 1,
        ChecksumKind::Sum16 => 2,
    }
}

pub fn emit_save(save: &SaveSchema, w: &mut CWriter) -> CodegenResult<()> {
    let payload = save.payload_bytes();
    let total = 3 + payload + checksum_len(save.checksum);
    // The staging buffer holds one slot; the platform layer addresses
    // battery RAM as slot * SAVE_SLOT_STRIDE.
    w.line(format!("#define SAVE_SLOTS {}", save.slots));
    w.line(format!("#define SAVE_SLOT_STRIDE {total}"));
    w.line(format!(
        "static uint8_t save_staging[{total}]; /* magic lo, magic hi, version, payload, checksum */"
    ));
    w.blank();

    match save.checksum {
        ChecksumKind::None => {}
        ChecksumKind::Xor => {
            w.open("static uint8_t save_checksum(const uint8_t *p, uint8_t len)");
            w.line("uint8_t x = 0;");
            w.line("uint8_t i;");
            w.open("for (i = 0; i < len; i++)");
            w.line("x ^= p[i];");
            w.close();
            w.line("return x;");
            w.close();
            w.blank();
        }
        ChecksumKind::Crc8 => {
            w.open("static uint8_t save_checksum(const uint8_t *p, uint8_t len)");
            w.line("uint8_t crc = 0;");
            w.line("uint8_t i, bit;");
            w.open("for (i = 0; i < len; i++)");
            w.line("crc ^= p[i];");
            w.open("for (bit = 0; bit < 8; bit++)");
            w.line("crc = (uint8_t)((crc & 0x80) ? ((crc << 1) ^ 0x07) : (crc << 1));");
            w.close();
            w.close();
            w.line("return crc;");
            w.close();
            w.blank();
        }
        ChecksumKind::Sum16 => {
            w.open("static uint16_t save_checksum(const uint8_t *p, uint8_t len)");
            w.line("uint16_t sum = 0;");
            w.line("uint8_t i;");
            w.open("for (i = 0; i < len; i++)");
            w.line("sum = (uint16_t)(sum + p[i]);");
            w.close();
            w.line("return sum;");
            w.close();
            w.blank();
        }
    }

    // Pack live variables into the staging buffer.
    w.open("void save_pack(void)");
    w.line(format!("save_staging[0] = 0x{:02x};", save.magic & 0xFF));
    w.line(format!("save_staging[1] = 0x{:02x};", save.magic >> 8));
    w.line(format!("save_staging[2] = {};", save.version));
    let mut offset = 3u32;
    for field in &save.fields {
        let var = names::var(&field.name);
        match field.ty.size_bytes() {
            1 => {
                w.line(format!("save_staging[{offset}] = (uint8_t){var};"));
                offset += 1;
            }
            _ => {
                w.line(format!(
                    "save_staging[{offset}] = (uint8_t)((uint16_t){var} & 0xFF);"
                ));
                w.line(format!(
                    "save_staging[{}] = (uint8_t)((uint16_t){var} >> 8);",
                    offset + 1
                ));
                offset += 2;
            }
        }
    }
    match save.checksum {
        ChecksumKind::None => {}
        ChecksumKind::Sum16 => {
            w.line(format!(
                "{{ uint16_t c = save_checksum(&save_staging[3], {payload}); \
                 save_staging[{offset}] = (uint8_t)(c & 0xFF); \
                 save_staging[{}] = (uint8_t)(c >> 8); }}",
                offset + 1
            ));
        }
        _ => {
            w.line(format!(
                "save_staging[{offset}] = save_checksum(&save_staging[3], {payload});"
            ));
        }
    }
    w.close();
    w.blank();

    // Unpack: verify magic, version, checksum; restore defaults on failure.
    w.open("uint8_t save_unpack(void)");
    w.line(format!(
        "uint8_t ok = save_staging[0] == 0x{:02x} && save_staging[1] == 0x{:02x} \
         && save_staging[2] == {};",
        save.magic & 0xFF,
        save.magic >> 8,
        save.version
    ));
    match save.checksum {
        ChecksumKind::None => {}
        ChecksumKind::Sum16 => {
            w.line(format!(
                "ok = ok && save_checksum(&save_staging[3], {payload}) == \
                 (uint16_t)(save_staging[{offset}] | ((uint16_t)save_staging[{}] << 8));",
                offset + 1
            ));
        }
        _ => {
            w.line(format!(
                "ok = ok && save_checksum(&save_staging[3], {payload}) == save_staging[{offset}];"
            ));
        }
    }
    w.open("if (!ok)");
    for field in &save.fields {
        w.line(format!("{} = {};", names::var(&field.name), field.default));
    }
    w.line("return 0;");
    w.close();
    let mut offset = 3u32;
    for field in &save.fields {
        let var = names::var(&field.name);
        match field.ty.size_bytes() {
            1 => {
                w.line(format!(
                    "{var} = ({})save_staging[{offset}];",
                    field.ty.c_name()
                ));
                offset += 1;
            }
            _ => {
                w.line(format!(
                    "{var} = ({})(save_staging[{offset}] | ((uint16_t)save_staging[{}] << 8));",
                    field.ty.c_name(),
                    offset + 1
                ));
                offset += 2;
            }
        }
    }
    w.line("return 1;");
    w.close();
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// Dialogs
// ══════════════════════════════════════════════════════════════════════════════

fn c_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

pub fn emit_dialogs(dialogs: &[Dialog], w: &mut CWriter) {
    for (id, dialog) in dialogs.iter().enumerate() {
        w.line(format!("#define DIALOG_{} {id}", names::c_const(&dialog.name)));
    }
    for dialog in dialogs {
        let d = names::c_ident(&dialog.name);
        let lines: Vec<String> = dialog.lines.iter().map(|l| c_string(l)).collect();
        w.line(format!(
            "static const char *const dialog_{d}_lines[{}] = {{ {} }};",
            dialog.lines.len(),
            lines.join(", ")
        ));
    }
    let lens: Vec<String> = dialogs.iter().map(|d| d.lines.len().to_string()).collect();
    w.line(format!(
        "static const uint8_t dialog_len[{}] = {{ {} }};",
        dialogs.len(),
        lens.join(", ")
    ));
    w.line("static uint8_t dialog_active = 0xFF;");
    w.line("static uint8_t dialog_line;");
    w.blank();

    w.open("void dialog_show(uint8_t dialog)");
    w.line("dialog_active = dialog;");
    w.line("dialog_line = 0;");
    w.close();
    w.blank();
    w.open("void dialog_hide(void)");
    w.line("dialog_active = 0xFF;");
    w.close();
    w.blank();
    w.open("void dialog_advance(void)");
    w.open("if (dialog_active == 0xFF)");
    w.line("return;");
    w.close();
    w.line("dialog_line++;");
    w.open("if (dialog_line >= dialog_len[dialog_active])");
    w.line("dialog_active = 0xFF;");
    w.close();
    w.close();
}

// ══════════════════════════════════════════════════════════════════════════════
// Menus
// ══════════════════════════════════════════════════════════════════════════════

pub fn emit_menus(game: &Game, menus: &[Menu], w: &mut CWriter) -> CodegenResult<()> {
    for (id, menu) in menus.iter().enumerate() {
        w.line(format!("#define MENU_{} {id}", names::c_const(&menu.name)));
    }
    for menu in menus {
        let m = names::c_ident(&menu.name);
        let labels: Vec<String> = menu.items.iter().map(|i| c_string(&i.label)).collect();
        w.line(format!(
            "static const char *const menu_{m}_labels[{}] = {{ {} }};",
            menu.items.len(),
            labels.join(", ")
        ));
    }
    let lens: Vec<String> = menus.iter().map(|m| m.items.len().to_string()).collect();
    w.line(format!(
        "static const uint8_t menu_len[{}] = {{ {} }};",
        menus.len(),
        lens.join(", ")
    ));
    w.line("static uint8_t menu_active = 0xFF;");
    w.line("static uint8_t menu_cursor;");
    w.blank();

    w.open("void menu_open(uint8_t menu)");
    w.line("menu_active = menu;");
    w.line("menu_cursor = 0;");
    w.close();
    w.blank();
    w.open("void menu_close(void)");
    w.line("menu_active = 0xFF;");
    w.close();
    w.blank();
    w.open("void menu_move(int8_t delta)");
    w.open("if (menu_active == 0xFF)");
    w.line("return;");
    w.close();
    w.open("if (delta < 0 && menu_cursor > 0)");
    w.line("menu_cursor--;");
    w.close();
    w.open("if (delta > 0 && menu_cursor + 1 < menu_len[menu_active])");
    w.line("menu_cursor++;");
    w.close();
    w.close();
    w.blank();

    w.open("void menu_select(void)");
    w.open("switch (menu_active)");
    for menu in menus {
        w.open(format!("case MENU_{}:", names::c_const(&menu.name)));
        w.set_symbol(format!("menu_{}_select", names::c_ident(&menu.name)));
        w.open("switch (menu_cursor)");
        for (i, item) in menu.items.iter().enumerate() {
            w.open(format!("case {i}:"));
            let mut ctx = LowerCtx::global(game);
            emit_stmts(&item.on_select, &mut ctx, w)?;
            w.line("break;");
            w.close();
        }
        w.close();
        w.line("break;");
        w.close();
        w.clear_symbol();
    }
    w.close();
    w.close();
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// Input buffers
// ══════════════════════════════════════════════════════════════════════════════

fn button_const(button: Button) -> &'static str {
    match button {
        Button::Up => "BTN_UP",
        Button::Down => "BTN_DOWN",
        Button::Left => "BTN_LEFT",
        Button::Right => "BTN_RIGHT",
        Button::A => "BTN_A",
        Button::B => "BTN_B",
        Button::Start => "BTN_START",
        Button::Select => "BTN_SELECT",
    }
}

pub fn emit_input_buffers(game: &Game, w: &mut CWriter) {
    for (id, name) in [
        "BTN_UP",
        "BTN_DOWN",
        "BTN_LEFT",
        "BTN_RIGHT",
        "BTN_A",
        "BTN_B",
        "BTN_START",
        "BTN_SELECT",
    ]
    .iter()
    .enumerate()
    {
        w.line(format!("#define {name} {id}"));
    }
    w.blank();
    for buffer in &game.input_buffers {
        let b = names::c_ident(&buffer.name);
        let seq: Vec<String> = buffer
            .sequence
            .iter()
            .map(|btn| button_const(*btn).to_string())
            .collect();
        w.line(format!(
            "static const uint8_t input_{b}_seq[{}] = {{ {} }};",
            buffer.sequence.len(),
            seq.join(", ")
        ));
        w.line(format!("static uint8_t input_{b}_progress;"));
        w.line(format!("static uint8_t input_{b}_timer;"));
        w.line(format!("static uint8_t input_{b}_fired;"));
    }
    w.blank();

    w.open("void input_feed(uint8_t button)");
    for buffer in &game.input_buffers {
        let b = names::c_ident(&buffer.name);
        let len = buffer.sequence.len();
        w.open(format!("if (button == input_{b}_seq[input_{b}_progress])"));
        w.line(format!("input_{b}_progress++;"));
        w.line(format!("input_{b}_timer = {};", buffer.window_frames));
        w.open(format!("if (input_{b}_progress >= {len})"));
        w.line(format!("input_{b}_fired = 1;"));
        w.line(format!("input_{b}_progress = 0;"));
        w.close();
        w.else_arm();
        w.line(format!(
            "input_{b}_progress = (uint8_t)(button == input_{b}_seq[0]);"
        ));
        w.close();
    }
    w.close();
    w.blank();

    w.open("void input_update(void)");
    for buffer in &game.input_buffers {
        let b = names::c_ident(&buffer.name);
        w.open(format!("if (input_{b}_timer > 0)"));
        w.line(format!("input_{b}_timer--;"));
        w.else_arm();
        w.line(format!("input_{b}_progress = 0;"));
        w.close();
    }
    w.close();
}

// ══════════════════════════════════════════════════════════════════════════════
// Link constants
// ══════════════════════════════════════════════════════════════════════════════

pub fn emit_link(link: &gamec_ir::game::LinkConfig, w: &mut CWriter) {
    w.line(format!(
        "#define LINK_TWO_PLAYER {}",
        u8::from(link.two_player)
    ));
    w.line(format!("#define LINK_PACKET_SIZE {}", link.packet_size));
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamec_ir::game::SaveField;
    use gamec_ir::ir::VarType;

    #[test]
    fn test_crc8_save_layout() {
        let save = SaveSchema {
            fields: vec![
                SaveField {
                    name: "score".into(),
                    ty: VarType::U16,
                    default: 0,
                },
                SaveField {
                    name: "lives".into(),
                    ty: VarType::U8,
                    default: 3,
                },
            ],
            slots: 3,
            checksum: ChecksumKind::Crc8,
            magic: 0xBEEF,
            version: 2,
        };
        let mut w = CWriter::new();
        emit_save(&save, &mut w).unwrap();
        let (text, _) = w.finish();

        // 3 header + 3 payload + 1 checksum
        assert!(text.contains("static uint8_t save_staging[7];"));
        assert!(text.contains("#define SAVE_SLOTS 3"));
        assert!(text.contains("#define SAVE_SLOT_STRIDE 7"));
        assert!(text.contains("save_staging[0] = 0xef;"));
        assert!(text.contains("save_staging[1] = 0xbe;"));
        assert!(text.contains("(crc << 1) ^ 0x07"));
        assert!(text.contains("var_lives = 3;"));
    }

    #[test]
    fn test_c_string_escaping() {
        assert_eq!(c_string("hi \"there\""), "\"hi \\\"there\\\"\"");
        assert_eq!(c_string("a\\b"), "\"a\\\\b\"");
    }
}
