//! Translation unit orchestrator.
//!
//! Emits one C file in a fixed section order: constants → static storage →
//! lookup tables → forward declarations → support functions → dispatch
//! functions → frame entry. A subsystem's section appears if and only if
//! the corresponding collection is non-empty, and every collection is
//! iterated in declaration order, so the same game always produces
//! byte-identical output.

use std::collections::BTreeSet;

use gamec_ir::game::{Game, Palette, PaletteKind, Pool};
use gamec_ir::ir::Easing;
use gamec_ir::limits::PALETTES_PER_TYPE;

use crate::error::{CodegenError, CodegenResult};
use crate::fixed::to_fixed;
use crate::machine;
use crate::names;
use crate::pathfind;
use crate::pool;
use crate::scene;
use crate::source_map::SourceMap;
use crate::support;
use crate::tween;
use crate::writer::CWriter;

/// The generated translation unit and its source map.
pub struct GeneratedC {
    pub c_source: String,
    pub source_map: SourceMap,
}

/// Generate C for a validated game.
pub fn generate(game: &Game) -> CodegenResult<GeneratedC> {
    Generator::new(game)?.run()
}

struct Generator<'a> {
    game: &'a Game,
    w: CWriter,
    /// All pools in declaration order (pools, then particle pools), with the
    /// particle lifetime where applicable.
    pools: Vec<(&'a Pool, Option<u16>)>,
    easings: BTreeSet<Easing>,
    uses_fades: bool,
}

impl<'a> Generator<'a> {
    fn new(game: &'a Game) -> CodegenResult<Self> {
        let mut pools: Vec<(&'a Pool, Option<u16>)> =
            game.pools.iter().map(|p| (p, None)).collect();
        pools.extend(
            game.particles
                .iter()
                .map(|p| (&p.pool, Some(p.lifetime_frames))),
        );
        Ok(Self {
            game,
            w: CWriter::new(),
            pools,
            easings: tween::used_easings(game),
            uses_fades: support::uses_fades(game),
        })
    }

    fn run(mut self) -> CodegenResult<GeneratedC> {
        self.emit_header();
        self.emit_constants();
        self.emit_storage();
        self.emit_tables();
        self.emit_prototypes();
        self.emit_support()?;
        self.emit_dispatch()?;
        self.emit_entry()?;
        let (c_source, source_map) = self.w.finish();
        Ok(GeneratedC {
            c_source,
            source_map,
        })
    }

    // ── Section 1: header ────────────────────────────────────────────────

    fn emit_header(&mut self) {
        self.w.line("/* generated by gamec; do not edit */");
        self.w.line("#include <stdint.h>");
    }

    // ── Section 2: constants and enums ───────────────────────────────────

    fn emit_constants(&mut self) {
        let game = self.game;
        self.w.banner("constants");
        scene::emit_scene_ids(game, &mut self.w);
        for (id, entity) in game.entities.iter().enumerate() {
            self.w
                .line(format!("#define ENTITY_{} {id}", names::c_const(&entity.name)));
        }
        for machine in &game.state_machines {
            machine::emit_state_ids(machine, &mut self.w);
        }
        // ROM tile layout: each sprite's frames pack consecutively.
        let mut tile_base = 0u32;
        for sprite in &game.sprites {
            let s = names::c_const(&sprite.name);
            self.w.line(format!(
                "#define SPRITE_{s}_TILE_BASE {tile_base}"
            ));
            self.w.line(format!(
                "#define SPRITE_{s}_TILES_PER_FRAME {}",
                sprite.tiles_per_frame()
            ));
            tile_base += sprite.tiles_per_frame() * sprite.frame_count();
        }
        // Physics coefficients, converted to 8.8 once at generation time.
        for entity in &game.entities {
            let Some(physics) = &entity.physics else { continue };
            let e = names::c_const(&entity.name);
            self.w.line(format!(
                "#define ENT_{e}_GRAVITY {}",
                to_fixed(physics.gravity)
            ));
            self.w.line(format!(
                "#define ENT_{e}_FRICTION {}",
                to_fixed(physics.friction)
            ));
            self.w
                .line(format!("#define ENT_{e}_MASS {}", to_fixed(physics.mass)));
            self.w.line(format!(
                "#define ENT_{e}_VEL_CLAMP {}",
                to_fixed(physics.velocity_clamp)
            ));
        }
        if let Some(link) = &game.link {
            support::emit_link(link, &mut self.w);
        }
    }

    // ── Section 3: static storage ────────────────────────────────────────

    fn emit_storage(&mut self) {
        let game = self.game;
        self.w.banner("static storage");
        for variable in &game.variables {
            match variable.initial {
                Some(value) => self.w.line(format!(
                    "static {} {} = {value};",
                    variable.ty.c_name(),
                    names::var(&variable.name)
                )),
                None => self.w.line(format!(
                    "static {} {};",
                    variable.ty.c_name(),
                    names::var(&variable.name)
                )),
            }
        }
        for array in &game.arrays {
            if array.initial.is_empty() {
                self.w.line(format!(
                    "static {} {}[{}];",
                    array.ty.c_name(),
                    names::array(&array.name),
                    array.len
                ));
            } else {
                let values: Vec<String> =
                    array.initial.iter().map(i32::to_string).collect();
                self.w.line(format!(
                    "static {} {}[{}] = {{ {} }};",
                    array.ty.c_name(),
                    names::array(&array.name),
                    array.len,
                    values.join(", ")
                ));
            }
        }
        for entity in &game.entities {
            let e = names::c_ident(&entity.name);
            if let Some(position) = &entity.position {
                self.w.line(format!(
                    "static int16_t ent_{e}_x = {};",
                    to_fixed(position.x)
                ));
                self.w.line(format!(
                    "static int16_t ent_{e}_y = {};",
                    to_fixed(position.y)
                ));
            }
            if let Some(velocity) = &entity.velocity {
                self.w.line(format!(
                    "static int16_t ent_{e}_vx = {};",
                    to_fixed(velocity.x)
                ));
                self.w.line(format!(
                    "static int16_t ent_{e}_vy = {};",
                    to_fixed(velocity.y)
                ));
            }
            if entity.sprite.is_some() {
                self.w.line(format!("static uint8_t ent_{e}_oam;"));
            }
        }
        if !game.scenes.is_empty() {
            self.w.line("static uint8_t scene_current;");
        }
        for machine in &game.state_machines {
            self.w.line(format!(
                "static uint8_t sm_{}_state;",
                names::c_ident(&machine.name)
            ));
        }
        if !self.pools.is_empty() {
            pool::emit_overflow_flags(self.pools.len(), &mut self.w);
            for (p, lifetime) in &self.pools {
                pool::emit_storage(p, *lifetime, &mut self.w);
            }
        }
        if game.camera.is_some() {
            support::emit_camera_storage(&mut self.w);
        }
        if !game.nav_grids.is_empty() {
            let max_tiles = game
                .nav_grids
                .iter()
                .map(|g| usize::from(g.width) * usize::from(g.height))
                .max()
                .unwrap_or(0);
            pathfind::emit_scratch(max_tiles, &mut self.w);
        }
    }

    // ── Section 4: lookup tables ─────────────────────────────────────────

    fn emit_tables(&mut self) {
        let game = self.game;
        if !game.palettes.is_empty() {
            self.w.banner("palettes");
            self.emit_palettes();
        }
        if !self.easings.is_empty() {
            self.w.banner("easing tables");
            tween::emit_easing_tables(&self.easings, &mut self.w);
        }
    }

    /// Slot assignment: explicit slots are honored, the rest fill the lowest
    /// free slot per type in declaration order.
    fn assign_slots(&self, kind: PaletteKind) -> Vec<(&'a Palette, u8)> {
        let of_kind: Vec<&Palette> = self
            .game
            .palettes
            .iter()
            .filter(|p| p.kind == kind)
            .collect();
        let mut taken = [false; PALETTES_PER_TYPE];
        for palette in &of_kind {
            if let Some(slot) = palette.slot {
                if let Some(flag) = taken.get_mut(usize::from(slot)) {
                    *flag = true;
                }
            }
        }
        let mut out = Vec::with_capacity(of_kind.len());
        for palette in of_kind {
            let slot = match palette.slot {
                Some(slot) => slot,
                None => {
                    let free = taken.iter().position(|t| !t).unwrap_or(0);
                    taken[free] = true;
                    free as u8
                }
            };
            out.push((palette, slot));
        }
        out
    }

    fn emit_palettes(&mut self) {
        for kind in [PaletteKind::Sprite, PaletteKind::Background] {
            for (palette, slot) in self.assign_slots(kind) {
                let p = names::c_ident(&palette.name);
                let colors: Vec<String> = palette
                    .colors
                    .iter()
                    .map(|c| format!("0x{:04x}", c.packed()))
                    .collect();
                self.w.line(format!(
                    "#define PAL_{}_SLOT {slot}",
                    names::c_const(&palette.name)
                ));
                self.w.line(format!(
                    "static const uint16_t pal_{p}[{}] = {{ {} }};",
                    palette.colors.len(),
                    colors.join(", ")
                ));
            }
        }
    }

    // ── Section 5: forward declarations ──────────────────────────────────

    fn emit_prototypes(&mut self) {
        let game = self.game;
        self.w.banner("forward declarations");
        if !game.scenes.is_empty() {
            self.w.line("void scene_goto(uint8_t next);");
            for s in &game.scenes {
                let n = names::c_ident(&s.name);
                if !s.on_enter.is_empty() {
                    self.w.line(format!("void scene_{n}_enter(void);"));
                }
                if !s.on_frame.is_empty() {
                    self.w.line(format!("void scene_{n}_frame(void);"));
                }
                if !s.on_exit.is_empty() {
                    self.w.line(format!("void scene_{n}_exit(void);"));
                }
            }
        }
        for cutscene in &game.cutscenes {
            self.w.line(format!(
                "void cutscene_{}(void);",
                names::c_ident(&cutscene.name)
            ));
        }
        for (p, _) in &self.pools {
            let n = names::c_ident(&p.name);
            self.w.line(format!("uint8_t pool_{n}_spawn(void);"));
            self.w.line(format!("void pool_{n}_despawn_all(void);"));
            self.w.line(format!("void pool_{n}_update(void);"));
        }
        for m in &game.state_machines {
            let n = names::c_ident(&m.name);
            self.w.line(format!("void sm_{n}_goto(uint8_t next);"));
            self.w.line(format!("void sm_{n}_update(void);"));
        }
        for sprite in &game.sprites {
            if sprite.animations.is_empty() {
                continue;
            }
            let n = names::c_ident(&sprite.name);
            self.w.line(format!("void sprite_{n}_play(uint8_t anim);"));
            self.w.line(format!("void sprite_{n}_animate(void);"));
        }
        if !self.easings.is_empty() {
            self.w.line(
                "void tween_start(void *target, uint8_t wide, int16_t from, int16_t to, \
                 uint16_t duration, uint8_t easing);",
            );
            self.w.line("void tween_update(void);");
        }
        if game.camera.is_some() {
            self.w.line("void camera_follow(uint8_t entity);");
            self.w.line("void camera_move_to(int16_t x, int16_t y);");
            self.w.line("void camera_shake(uint8_t frames);");
            self.w.line("void camera_update(void);");
        }
        if self.uses_fades {
            self.w.line("void fade_out(uint8_t frames);");
            self.w.line("void fade_in(uint8_t frames);");
            self.w.line("void fade_update(void);");
        }
        if !game.mixer.groups.is_empty() {
            self.w.line("void mixer_play(uint8_t group, uint8_t sound);");
            self.w.line("void mixer_stop(uint8_t group);");
            self.w
                .line("void mixer_set_volume(uint8_t group, uint8_t volume);");
        }
        if !game.dialogs.is_empty() {
            self.w.line("void dialog_show(uint8_t dialog);");
            self.w.line("void dialog_hide(void);");
            self.w.line("void dialog_advance(void);");
        }
        if !game.menus.is_empty() {
            self.w.line("void menu_open(uint8_t menu);");
            self.w.line("void menu_close(void);");
            self.w.line("void menu_move(int8_t delta);");
            self.w.line("void menu_select(void);");
        }
        if !game.input_buffers.is_empty() {
            self.w.line("void input_feed(uint8_t button);");
            self.w.line("void input_update(void);");
        }
        if game.save.is_some() {
            self.w.line("void save_pack(void);");
            self.w.line("uint8_t save_unpack(void);");
        }
        for grid in &game.nav_grids {
            self.w.line(format!(
                "uint8_t nav_{}_find(uint8_t start, uint8_t goal);",
                names::c_ident(&grid.name)
            ));
        }
    }

    // ── Section 6: support functions ─────────────────────────────────────

    fn emit_support(&mut self) -> CodegenResult<()> {
        let game = self.game;
        if !self.easings.is_empty() {
            self.w.banner("tween runtime");
            tween::emit_tween_runtime(&mut self.w);
        }
        if game.sprites.iter().any(|s| !s.animations.is_empty()) {
            self.w.banner("sprite animations");
            for sprite in &game.sprites {
                if !sprite.animations.is_empty() {
                    machine::emit_sprite_animations(sprite, &mut self.w);
                    self.w.blank();
                }
            }
        }
        if let Some(camera) = &game.camera {
            self.w.banner("camera");
            support::emit_camera_functions(game, camera, &mut self.w);
        }
        if self.uses_fades {
            self.w.banner("screen fades");
            support::emit_fade_functions(&mut self.w);
        }
        if !game.mixer.groups.is_empty() {
            self.w.banner("audio mixer");
            support::emit_mixer(game, &mut self.w);
        }
        if let Some(save) = &game.save {
            self.w.banner("save data");
            support::emit_save(save, &mut self.w)?;
        }
        if !game.dialogs.is_empty() {
            self.w.banner("dialogs");
            support::emit_dialogs(&game.dialogs, &mut self.w);
        }
        if !game.menus.is_empty() {
            self.w.banner("menus");
            support::emit_menus(game, &game.menus, &mut self.w)?;
        }
        if !game.input_buffers.is_empty() {
            self.w.banner("input buffers");
            support::emit_input_buffers(game, &mut self.w);
        }
        if !game.nav_grids.is_empty() {
            self.w.banner("pathfinding");
            for grid in &game.nav_grids {
                pathfind::emit_nav_grid(grid, &mut self.w)?;
                self.w.blank();
            }
        }
        Ok(())
    }

    // ── Section 7: dispatch functions ────────────────────────────────────

    fn emit_dispatch(&mut self) -> CodegenResult<()> {
        let game = self.game;
        if !self.pools.is_empty() {
            self.w.banner("pools");
            for (index, (p, lifetime)) in self.pools.iter().enumerate() {
                pool::emit_functions(game, p, index, *lifetime, &mut self.w)?;
                self.w.blank();
            }
        }
        if !game.state_machines.is_empty() {
            self.w.banner("state machines");
            for m in &game.state_machines {
                machine::emit_machine(game, m, &mut self.w)?;
                self.w.blank();
            }
        }
        if !game.cutscenes.is_empty() {
            self.w.banner("cutscenes");
            scene::emit_cutscenes(game, &mut self.w)?;
        }
        if !game.scenes.is_empty() {
            self.w.banner("scenes");
            scene::emit_scene_functions(game, &mut self.w)?;
            scene::emit_scene_goto(game, &mut self.w);
        }
        Ok(())
    }

    // ── Section 8: frame entry ───────────────────────────────────────────

    fn emit_entry(&mut self) -> CodegenResult<()> {
        let game = self.game;
        self.w.banner("entry points");
        self.w.open("void game_init(void)");
        for (id, group) in game.mixer.groups.iter().enumerate() {
            self.w.line(format!("audio_volume[{id}] = {};", group.volume));
            self.w.line(format!("audio_playing[{id}] = 0xFF;"));
        }
        if let Some(camera) = &game.camera {
            match &camera.follow {
                Some(follow) => {
                    let entity = game
                        .entity(follow)
                        .ok_or_else(|| CodegenError::UnresolvedSymbol(follow.clone()))?;
                    self.w.line(format!(
                        "camera_follow_target = ENTITY_{};",
                        names::c_const(&entity.name)
                    ));
                }
                None => self.w.line("camera_follow_target = 0xFF;"),
            }
        }
        for machine in &game.state_machines {
            self.w.line(format!(
                "sm_{}_state = {};",
                names::c_ident(&machine.name),
                names::state_const(&machine.name, &machine.initial)
            ));
        }
        if !game.scenes.is_empty() {
            let start = game
                .scene(&game.start_scene)
                .ok_or_else(|| CodegenError::UnresolvedSymbol(game.start_scene.clone()))?;
            self.w.line(format!(
                "scene_current = {};",
                names::scene_const(&start.name)
            ));
            if !start.on_enter.is_empty() {
                self.w.line(format!(
                    "scene_{}_enter();",
                    names::c_ident(&start.name)
                ));
            }
        }
        self.w.close();
        self.w.blank();

        self.w.open("void game_frame(void)");
        if !game.input_buffers.is_empty() {
            self.w.line("input_update();");
        }
        scene::emit_scene_frame_dispatch(game, &mut self.w);
        for machine in &game.state_machines {
            self.w
                .line(format!("sm_{}_update();", names::c_ident(&machine.name)));
        }
        for (p, _) in &self.pools {
            self.w
                .line(format!("pool_{}_update();", names::c_ident(&p.name)));
        }
        for sprite in &game.sprites {
            if !sprite.animations.is_empty() {
                self.w.line(format!(
                    "sprite_{}_animate();",
                    names::c_ident(&sprite.name)
                ));
            }
        }
        if !self.easings.is_empty() {
            self.w.line("tween_update();");
        }
        if game.camera.is_some() {
            self.w.line("camera_update();");
        }
        if self.uses_fades {
            self.w.line("fade_update();");
        }
        self.w.close();
        Ok(())
    }
}
