//! Semantic validator — a fixed battery of independent passes over the Game.
//!
//! Entry point: [`validate`].
//!
//! Every pass runs to completion and accumulates into one shared
//! [`Diagnostics`] report; nothing short-circuits, so a single invocation
//! surfaces every independent problem. The report is read-only evidence —
//! no pass mutates the Game.
//!
//! Codes emitted:
//! - E100: unresolved reference (with fuzzy suggestion)
//! - E200–E204: OAM / palette / WRAM budget errors
//! - E210–E212: budget warnings (near cap, near budget, VRAM tiles)
//! - E300–E306: numeric range errors (colors, indices, tweens, mass)
//! - E310–E313: range warnings (unprovable index, precision, physics)
//! - E400: duplicate declaration
//! - E500–E503, E510: structural findings

use std::collections::{BTreeMap, HashSet};

use gamec_ir::game::{Game, Palette, PaletteKind, Pool};
use gamec_ir::ir::{expr_names, visit_stmts, Expr, Stmt, StmtKind, VarType};
use gamec_ir::limits;
use gamec_ir::{Diagnostic, DiagnosticCode, Diagnostics, Origin};

use gamec_codegen::names::c_ident;

use crate::bounds::{classify, IndexClass, RangeEnv};
use crate::memory::{estimate_vram_tiles, estimate_wram};
use crate::suggest::{did_you_mean, valid_names};

/// Run the full validation battery over a frozen game.
pub fn validate(game: &Game) -> Diagnostics {
    let mut diags = Diagnostics::new();
    let mut validator = Validator {
        game,
        diags: &mut diags,
    };
    validator.run();
    diags
}

struct Validator<'a> {
    game: &'a Game,
    diags: &'a mut Diagnostics,
}

impl<'a> Validator<'a> {
    fn run(&mut self) {
        self.check_duplicate_names();
        self.check_structure();
        self.check_oam_budget();
        self.check_palettes();
        self.check_references();
        self.check_state_machines();
        self.check_memory_budget();
        self.check_tweens();
        self.check_array_bounds();
        self.check_physics();
    }

    // ══════════════════════════════════════════════════════════════════════
    // Duplicate declarations
    // ══════════════════════════════════════════════════════════════════════

    fn check_duplicate_names(&mut self) {
        // Variables and arrays share one namespace; every other collection
        // has its own.
        let storage: Vec<&str> = self
            .game
            .variables
            .iter()
            .map(|v| v.name.as_str())
            .chain(self.game.arrays.iter().map(|a| a.name.as_str()))
            .collect();
        self.report_duplicates("variable", &storage);

        let per_kind: [(&str, Vec<&str>); 8] = [
            (
                "sprite",
                self.game.sprites.iter().map(|s| s.name.as_str()).collect(),
            ),
            (
                "entity",
                self.game.entities.iter().map(|e| e.name.as_str()).collect(),
            ),
            ("pool", self.pool_names()),
            (
                "state machine",
                self.game
                    .state_machines
                    .iter()
                    .map(|m| m.name.as_str())
                    .collect(),
            ),
            (
                "scene",
                self.game.scenes.iter().map(|s| s.name.as_str()).collect(),
            ),
            (
                "palette",
                self.game.palettes.iter().map(|p| p.name.as_str()).collect(),
            ),
            (
                "dialog",
                self.game.dialogs.iter().map(|d| d.name.as_str()).collect(),
            ),
            (
                "menu",
                self.game.menus.iter().map(|m| m.name.as_str()).collect(),
            ),
        ];
        for (kind, names) in per_kind {
            self.report_duplicates(kind, &names);
        }
    }

    fn report_duplicates(&mut self, kind: &str, names: &[&str]) {
        let mut sites: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, name) in names.iter().enumerate() {
            sites.entry(name).or_default().push(i + 1);
        }
        for (name, positions) in sites {
            if positions.len() > 1 {
                let listed: Vec<String> = positions.iter().map(|p| format!("#{p}")).collect();
                self.diags.push_error(Diagnostic::error(
                    DiagnosticCode::DUPLICATE_NAME,
                    format!(
                        "duplicate {kind} name '{name}' (declarations {})",
                        listed.join(", ")
                    ),
                ));
            }
        }

        // Distinct names that sanitize to the same C identifier would
        // collide in the generated symbol space.
        let mut sanitized: BTreeMap<String, Vec<&str>> = BTreeMap::new();
        for name in names {
            let group = sanitized.entry(c_ident(name)).or_default();
            if !group.contains(name) {
                group.push(*name);
            }
        }
        for (ident, group) in sanitized {
            if group.len() > 1 {
                let listed: Vec<String> = group.iter().map(|n| format!("'{n}'")).collect();
                self.diags.push_error(Diagnostic::error(
                    DiagnosticCode::DUPLICATE_NAME,
                    format!(
                        "{kind} names {} collide as C identifier '{ident}'",
                        listed.join(", ")
                    ),
                ));
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Structure
    // ══════════════════════════════════════════════════════════════════════

    fn check_structure(&mut self) {
        if self.game.start_scene.is_empty() {
            self.diags.push_error(Diagnostic::error(
                DiagnosticCode::MISSING_START_SCENE,
                "no start scene declared; exactly one is required",
            ));
        }
        for pool in self.all_pools() {
            if pool.capacity == 0 {
                self.diags.push_error(Diagnostic::error(
                    DiagnosticCode::POOL_CAPACITY_ZERO,
                    format!("pool '{}' has capacity 0", pool.name),
                ));
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Hardware sprite budget
    // ══════════════════════════════════════════════════════════════════════

    fn check_oam_budget(&mut self) {
        let direct = self.game.sprites.len() as u32;
        let entity_sprites = self
            .game
            .entities
            .iter()
            .filter(|e| e.sprite.is_some())
            .count() as u32;
        let pool_slots: u32 = self.game.pools.iter().map(|p| u32::from(p.capacity)).sum();
        let particle_slots: u32 = self
            .game
            .particles
            .iter()
            .map(|p| u32::from(p.pool.capacity))
            .sum();
        let total = direct + entity_sprites + pool_slots + particle_slots;

        let breakdown = format!(
            "{direct} direct + {entity_sprites} entity + {pool_slots} pool + \
             {particle_slots} particle = {total}"
        );
        if total > limits::OAM_SPRITE_CAP {
            self.diags.push_error(Diagnostic::error(
                DiagnosticCode::OAM_OVERFLOW,
                format!(
                    "worst-case hardware sprites exceed the OAM cap of {}: {breakdown}",
                    limits::OAM_SPRITE_CAP
                ),
            ));
        } else if total + limits::OAM_WARN_MARGIN >= limits::OAM_SPRITE_CAP {
            self.diags.push_warning(Diagnostic::warning(
                DiagnosticCode::OAM_NEAR_CAP,
                format!(
                    "worst-case hardware sprites within {} of the OAM cap: {breakdown}",
                    limits::OAM_WARN_MARGIN
                ),
            ));
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Palettes
    // ══════════════════════════════════════════════════════════════════════

    fn check_palettes(&mut self) {
        for kind in [PaletteKind::Sprite, PaletteKind::Background] {
            let of_kind: Vec<&Palette> = self
                .game
                .palettes
                .iter()
                .filter(|p| p.kind == kind)
                .collect();
            let (label, code) = match kind {
                PaletteKind::Sprite => ("sprite", DiagnosticCode::SPRITE_PALETTE_COUNT),
                PaletteKind::Background => {
                    ("background", DiagnosticCode::BACKGROUND_PALETTE_COUNT)
                }
            };
            if of_kind.len() > limits::PALETTES_PER_TYPE {
                self.diags.push_error(Diagnostic::error(
                    code,
                    format!(
                        "{} {label} palettes declared; the hardware has {} slots",
                        of_kind.len(),
                        limits::PALETTES_PER_TYPE
                    ),
                ));
            }

            let mut used_slots: BTreeMap<u8, &str> = BTreeMap::new();
            for palette in &of_kind {
                let Some(slot) = palette.slot else { continue };
                if usize::from(slot) >= limits::PALETTES_PER_TYPE {
                    self.diags.push_error(Diagnostic::error(
                        DiagnosticCode::PALETTE_SLOT_COLLISION,
                        format!(
                            "{label} palette '{}' requests slot {slot}; slots are 0-{}",
                            palette.name,
                            limits::PALETTES_PER_TYPE - 1
                        ),
                    ));
                } else if let Some(other) = used_slots.insert(slot, &palette.name) {
                    self.diags.push_error(Diagnostic::error(
                        DiagnosticCode::PALETTE_SLOT_COLLISION,
                        format!(
                            "{label} palettes '{other}' and '{}' both claim slot {slot}",
                            palette.name
                        ),
                    ));
                }
            }
        }

        for palette in &self.game.palettes {
            if palette.colors.len() != limits::COLORS_PER_PALETTE {
                self.diags.push_error(Diagnostic::error(
                    DiagnosticCode::PALETTE_COLOR_COUNT,
                    format!(
                        "palette '{}' has {} colors; exactly {} required",
                        palette.name,
                        palette.colors.len(),
                        limits::COLORS_PER_PALETTE
                    ),
                ));
            }
            for (i, color) in palette.colors.iter().enumerate() {
                for (channel, value) in [("r", color.r), ("g", color.g), ("b", color.b)] {
                    if value > limits::COLOR_CHANNEL_MAX {
                        self.diags.push_error(Diagnostic::error(
                            DiagnosticCode::COLOR_CHANNEL_RANGE,
                            format!(
                                "palette '{}' color {i} channel {channel} is {value}; \
                                 channels are 0-{}",
                                palette.name,
                                limits::COLOR_CHANNEL_MAX
                            ),
                        ));
                    }
                }
                if color.packed() > limits::COLOR_PACKED_MAX {
                    self.diags.push_error(Diagnostic::error(
                        DiagnosticCode::COLOR_VALUE_RANGE,
                        format!(
                            "palette '{}' color {i} packs to {:#06x}, outside the 15-bit range",
                            palette.name,
                            color.packed()
                        ),
                    ));
                }
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // References
    // ══════════════════════════════════════════════════════════════════════

    fn check_references(&mut self) {
        // Declaration-level references first.
        for sprite in &self.game.sprites {
            if let Some(palette) = &sprite.palette {
                self.check_name(
                    palette,
                    "palette",
                    &self.palette_names(),
                    &format!("sprite '{}'", sprite.name),
                    None,
                );
            }
        }
        for entity in &self.game.entities {
            let at = format!("entity '{}'", entity.name);
            if let Some(sprite) = &entity.sprite {
                self.check_name(sprite, "sprite", &self.sprite_names(), &at, None);
            }
            if let Some(machine) = &entity.state_machine {
                self.check_name(machine, "state machine", &self.machine_names(), &at, None);
            }
        }
        for pool in self.all_pools() {
            if let Some(sprite) = &pool.sprite {
                self.check_name(
                    sprite,
                    "sprite",
                    &self.sprite_names(),
                    &format!("pool '{}'", pool.name),
                    None,
                );
            }
        }
        if let Some(camera) = &self.game.camera {
            if let Some(follow) = &camera.follow {
                self.check_name(follow, "entity", &self.entity_names(), "camera follow", None);
            }
        }
        if !self.game.start_scene.is_empty() {
            let start = self.game.start_scene.as_str();
            self.check_name(start, "scene", &self.scene_names(), "start scene", None);
        }
        for machine in &self.game.state_machines {
            let state_names: Vec<&str> = machine.states.iter().map(|s| s.name.as_str()).collect();
            let at = format!("state machine '{}'", machine.name);
            if !machine.states.is_empty() {
                self.check_name(&machine.initial, "state", &state_names, &at, None);
            }
            for state in &machine.states {
                for transition in &state.transitions {
                    self.check_name(
                        &transition.target,
                        "state",
                        &state_names,
                        &format!("{at} state '{}' transition", state.name),
                        None,
                    );
                }
            }
        }

        // Statement-level references, hook by hook.
        let hooks = self.game.hooks();
        for hook in &hooks {
            let mut loop_vars = Vec::new();
            self.check_stmt_refs(hook.stmts, &hook.label, hook.pool, &mut loop_vars);
        }

        // Despawn predicates are expressions outside any hook's statement
        // list; they resolve against the pool's slot scope.
        for pool in self.all_pools() {
            let at = format!("pool '{}' despawnWhen", pool.name);
            for predicate in &pool.despawn_when {
                self.check_expr_refs(predicate, &at, Some(pool), &[], None);
            }
        }
    }

    fn check_stmt_refs(
        &mut self,
        stmts: &[Stmt],
        at: &str,
        pool_scope: Option<&Pool>,
        loop_vars: &mut Vec<String>,
    ) {
        for stmt in stmts {
            let origin = stmt.origin.as_ref();
            for expr in stmt.kind.exprs() {
                self.check_expr_refs(expr, at, pool_scope, loop_vars, origin);
            }
            match &stmt.kind {
                StmtKind::Assign { target, .. } => {
                    self.check_storage_name(target, at, pool_scope, loop_vars, origin);
                }
                StmtKind::ArrayAssign { array, .. } => {
                    self.check_name(array, "array", &self.array_names(), at, origin);
                }
                StmtKind::SceneChange { scene } => {
                    self.check_name(scene, "scene", &self.scene_names(), at, origin);
                }
                StmtKind::Call { cutscene } => {
                    self.check_name(cutscene, "cutscene", &self.cutscene_names(), at, origin);
                }
                StmtKind::Animation { sprite, animation } => {
                    self.check_name(sprite, "sprite", &self.sprite_names(), at, origin);
                    if let Some(decl) = self.game.sprite(sprite) {
                        let names: Vec<&str> =
                            decl.animations.iter().map(|a| a.name.as_str()).collect();
                        self.check_name(animation, "animation", &names, at, origin);
                    }
                }
                StmtKind::Pool(op) => {
                    let pool_name = match op {
                        gamec_ir::ir::PoolOp::Spawn { pool }
                        | gamec_ir::ir::PoolOp::TrySpawn { pool, .. }
                        | gamec_ir::ir::PoolOp::DespawnAll { pool } => pool,
                    };
                    self.check_name(pool_name, "pool", &self.pool_names(), at, origin);
                }
                StmtKind::Menu(gamec_ir::ir::MenuOp::Open { menu }) => {
                    self.check_name(menu, "menu", &self.menu_names(), at, origin);
                }
                StmtKind::Dialog(gamec_ir::ir::DialogOp::Show { dialog }) => {
                    self.check_name(dialog, "dialog", &self.dialog_names(), at, origin);
                }
                StmtKind::Mixer(op) => {
                    let group = match op {
                        gamec_ir::ir::MixerOp::Play { group, .. }
                        | gamec_ir::ir::MixerOp::Stop { group }
                        | gamec_ir::ir::MixerOp::SetVolume { group, .. } => group,
                    };
                    self.check_name(group, "audio group", &self.group_names(), at, origin);
                }
                StmtKind::Tween(tween) => {
                    self.check_storage_name(&tween.target, at, pool_scope, loop_vars, origin);
                }
                StmtKind::Camera(gamec_ir::ir::CameraOp::Follow { entity }) => {
                    self.check_name(entity, "entity", &self.entity_names(), at, origin);
                }
                _ => {}
            }

            // Recurse with loop variables in scope.
            if let StmtKind::For { var, body, .. } = &stmt.kind {
                loop_vars.push(var.clone());
                self.check_stmt_refs(body, at, pool_scope, loop_vars);
                loop_vars.pop();
            } else {
                for body in stmt.kind.child_bodies() {
                    self.check_stmt_refs(body, at, pool_scope, loop_vars);
                }
            }
        }
    }

    fn check_expr_refs(
        &mut self,
        expr: &Expr,
        at: &str,
        pool_scope: Option<&Pool>,
        loop_vars: &[String],
        origin: Option<&Origin>,
    ) {
        let mut names = Vec::new();
        expr_names(expr, &mut names);
        for (name, is_array) in names {
            if is_array {
                self.check_name(name, "array", &self.array_names(), at, origin);
            } else {
                self.check_storage_name(name, at, pool_scope, loop_vars, origin);
            }
        }
    }

    /// Resolve a scalar name: a declared variable, a live loop variable, or
    /// (inside pool hooks) one of the pool's per-slot names.
    fn check_storage_name(
        &mut self,
        name: &str,
        at: &str,
        pool_scope: Option<&Pool>,
        loop_vars: &[String],
        origin: Option<&Origin>,
    ) {
        if loop_vars.iter().any(|v| v == name) {
            return;
        }
        if let Some(pool) = pool_scope {
            if self.slot_names(pool).iter().any(|n| n == name) {
                return;
            }
        }
        if self.game.variable(name).is_some() {
            return;
        }
        let mut candidates = self.variable_names();
        let slot_names = pool_scope.map(|p| self.slot_names(p)).unwrap_or_default();
        candidates.extend(slot_names.iter().map(String::as_str));
        self.check_name(name, "variable", &candidates, at, origin);
    }

    /// Per-slot names visible inside a pool's hooks.
    fn slot_names(&self, pool: &Pool) -> Vec<String> {
        let mut names: Vec<String> = pool.fields.iter().map(|f| f.name.clone()).collect();
        if pool.has_position {
            names.push("x".into());
            names.push("y".into());
        }
        if pool.has_velocity {
            names.push("vx".into());
            names.push("vy".into());
        }
        if self.game.particles.iter().any(|p| p.pool.name == pool.name) {
            names.push("_lifetime".into());
        }
        names
    }

    /// Emit an E100 unless `name` appears in `candidates`. The error carries
    /// a nearest-match suggestion and the full valid-name list.
    fn check_name(
        &mut self,
        name: &str,
        kind: &str,
        candidates: &[&str],
        at: &str,
        origin: Option<&Origin>,
    ) {
        if candidates.contains(&name) {
            return;
        }
        let mut diag = Diagnostic::error(
            DiagnosticCode::UNRESOLVED_REFERENCE,
            format!(
                "unknown {kind} '{name}' in {at}; {}",
                valid_names(kind, candidates)
            ),
        );
        if let Some(suggestion) = did_you_mean(name, candidates) {
            diag = diag.with_suggestion(suggestion);
        }
        if let Some(origin) = origin {
            diag = diag.with_origin(origin.clone());
        }
        self.diags.push_error(diag);
    }

    // ══════════════════════════════════════════════════════════════════════
    // State machines
    // ══════════════════════════════════════════════════════════════════════

    fn check_state_machines(&mut self) {
        for machine in &self.game.state_machines {
            if machine.states.is_empty() {
                self.diags.push_error(Diagnostic::error(
                    DiagnosticCode::EMPTY_STATE_MACHINE,
                    format!("state machine '{}' declares no states", machine.name),
                ));
                continue;
            }

            // Reachability from the default state through transition edges.
            let mut reached: HashSet<&str> = HashSet::new();
            let mut frontier = vec![machine.initial.as_str()];
            while let Some(name) = frontier.pop() {
                if !reached.insert(name) {
                    continue;
                }
                if let Some(state) = machine.states.iter().find(|s| s.name == name) {
                    for transition in &state.transitions {
                        frontier.push(transition.target.as_str());
                    }
                }
            }
            for state in &machine.states {
                if !reached.contains(state.name.as_str()) {
                    // Not an error: the state may be entered externally.
                    self.diags.push_warning(Diagnostic::warning(
                        DiagnosticCode::UNREACHABLE_STATE,
                        format!(
                            "state '{}' in state machine '{}' is unreachable from \
                             the default state '{}'",
                            state.name, machine.name, machine.initial
                        ),
                    ));
                }
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Memory budgets
    // ══════════════════════════════════════════════════════════════════════

    fn check_memory_budget(&mut self) {
        let estimate = estimate_wram(self.game);
        let total = estimate.total();
        if total > limits::WRAM_BUDGET_BYTES {
            self.diags.push_error(Diagnostic::error(
                DiagnosticCode::WRAM_OVERFLOW,
                format!(
                    "estimated static RAM {total} bytes exceeds the {}-byte budget:{}",
                    limits::WRAM_BUDGET_BYTES,
                    estimate.breakdown()
                ),
            ));
        } else if total >= limits::WRAM_WARN_BYTES {
            self.diags.push_warning(Diagnostic::warning(
                DiagnosticCode::WRAM_NEAR_BUDGET,
                format!(
                    "estimated static RAM {total} bytes approaches the {}-byte budget:{}",
                    limits::WRAM_BUDGET_BYTES,
                    estimate.breakdown()
                ),
            ));
        }

        let tiles = estimate_vram_tiles(self.game);
        if tiles > limits::TILE_BANK_CAPACITY {
            self.diags.push_warning(Diagnostic::warning(
                DiagnosticCode::VRAM_TILE_OVERFLOW,
                format!(
                    "estimated {tiles} tiles exceed the {}-tile bank",
                    limits::TILE_BANK_CAPACITY
                ),
            ));
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Tweens
    // ══════════════════════════════════════════════════════════════════════

    fn check_tweens(&mut self) {
        for hook in self.game.hooks() {
            visit_stmts(hook.stmts, &mut |stmt| {
                let StmtKind::Tween(tween) = &stmt.kind else {
                    return;
                };
                let origin = stmt.origin.as_ref();
                if tween.duration_frames == 0 {
                    self.push_at(
                        Diagnostic::error(
                            DiagnosticCode::TWEEN_DURATION,
                            format!(
                                "tween on '{}' in {} has duration 0; must be > 0",
                                tween.target, hook.label
                            ),
                        ),
                        origin,
                    );
                }
                let (lo, hi) = tween.target_type.bounds();
                for (which, expr) in [("from", &tween.from), ("to", &tween.to)] {
                    if let Some(value) = expr.as_literal() {
                        if value < lo || value > hi {
                            self.push_at(
                                Diagnostic::error(
                                    DiagnosticCode::TWEEN_VALUE_RANGE,
                                    format!(
                                        "tween on '{}' in {}: {which} value {value} \
                                         outside bounds ({lo}..{hi})",
                                        tween.target, hook.label
                                    ),
                                ),
                                origin,
                            );
                        }
                    }
                }
                // Wide u8 spans overflow the 16-bit interpolation product.
                if tween.target_type == VarType::U8 {
                    if let (Some(from), Some(to)) =
                        (tween.from.as_literal(), tween.to.as_literal())
                    {
                        if (to - from).abs() > 127 {
                            self.push_warning_at(
                                Diagnostic::warning(
                                    DiagnosticCode::TWEEN_PRECISION_LOSS,
                                    format!(
                                        "tween on '{}' in {} spans {} values on a u8 \
                                         target; interpolation may lose precision",
                                        tween.target,
                                        hook.label,
                                        (to - from).abs()
                                    ),
                                ),
                                origin,
                            );
                        }
                    }
                }
            });
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Array bounds (bounded abstract interpretation)
    // ══════════════════════════════════════════════════════════════════════

    fn check_array_bounds(&mut self) {
        for hook in self.game.hooks() {
            let mut env = RangeEnv::new();
            env.push_scope();
            self.check_bounds_in(hook.stmts, &hook.label, &mut env);
        }

        // Despawn predicates lower into the generated update loop; no loop
        // variables are in scope there, so indices classify as literal or
        // unknown.
        let env = RangeEnv::new();
        for pool in self.all_pools() {
            let at = format!("pool '{}' despawnWhen", pool.name);
            for predicate in &pool.despawn_when {
                self.check_accesses_in_expr(predicate, &at, &env, None);
            }
        }
    }

    fn check_bounds_in(&mut self, stmts: &[Stmt], at: &str, env: &mut RangeEnv) {
        for stmt in stmts {
            let origin = stmt.origin.as_ref();
            if let StmtKind::ArrayAssign { array, index, .. } = &stmt.kind {
                self.check_access(array, index, at, env, origin);
            }
            for expr in stmt.kind.exprs() {
                self.check_accesses_in_expr(expr, at, env, origin);
            }
            if let StmtKind::For {
                var,
                from,
                to,
                body,
            } = &stmt.kind
            {
                env.push_scope();
                env.bind(var, *from, *to);
                self.check_bounds_in(body, at, env);
                env.pop_scope();
            } else {
                for body in stmt.kind.child_bodies() {
                    self.check_bounds_in(body, at, env);
                }
            }
        }
    }

    fn check_accesses_in_expr(
        &mut self,
        expr: &Expr,
        at: &str,
        env: &RangeEnv,
        origin: Option<&Origin>,
    ) {
        match expr {
            Expr::ArrayIndex { array, index } => {
                self.check_access(array, index, at, env, origin);
                self.check_accesses_in_expr(index, at, env, origin);
            }
            Expr::Binary { left, right, .. } => {
                self.check_accesses_in_expr(left, at, env, origin);
                self.check_accesses_in_expr(right, at, env, origin);
            }
            Expr::Unary { operand, .. } => self.check_accesses_in_expr(operand, at, env, origin),
            _ => {}
        }
    }

    fn check_access(
        &mut self,
        array: &str,
        index: &Expr,
        at: &str,
        env: &RangeEnv,
        origin: Option<&Origin>,
    ) {
        // Unresolved array names are the reference pass's finding.
        let Some(decl) = self.game.array(array) else {
            return;
        };
        let len = i32::from(decl.len);
        match classify(index, env) {
            IndexClass::Literal(value) => {
                if value < 0 || value >= len {
                    self.push_at(
                        Diagnostic::error(
                            DiagnosticCode::ARRAY_INDEX_RANGE,
                            format!(
                                "array '{array}' index {value} out of bounds in {at} \
                                 (size {len})"
                            ),
                        ),
                        origin,
                    );
                }
            }
            IndexClass::Bounded { lo, hi } => {
                if lo < 0 || hi >= len {
                    self.push_at(
                        Diagnostic::error(
                            DiagnosticCode::LOOP_INDEX_RANGE,
                            format!(
                                "array '{array}' indexed by loop range {lo}..{hi} in {at}; \
                                 values outside 0..{} are reachable",
                                len - 1
                            ),
                        ),
                        origin,
                    );
                }
            }
            IndexClass::Unknown => {
                // Cannot prove safety either way — advisory only.
                self.push_warning_at(
                    Diagnostic::warning(
                        DiagnosticCode::UNPROVABLE_INDEX,
                        format!(
                            "array '{array}' index in {at} has no provable range \
                             (size {len}); bounds cannot be checked statically"
                        ),
                    ),
                    origin,
                );
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Physics sanity
    // ══════════════════════════════════════════════════════════════════════

    fn check_physics(&mut self) {
        for entity in &self.game.entities {
            let Some(physics) = &entity.physics else {
                continue;
            };
            if physics.mass <= 0.0 {
                self.diags.push_error(Diagnostic::error(
                    DiagnosticCode::MASS_NOT_POSITIVE,
                    format!(
                        "entity '{}' has mass {}; mass must be > 0",
                        entity.name, physics.mass
                    ),
                ));
            }
            if physics.velocity_clamp.abs() > 127.0 {
                self.diags.push_warning(Diagnostic::warning(
                    DiagnosticCode::VELOCITY_CLAMP_RANGE,
                    format!(
                        "entity '{}' velocity clamp {} exceeds the signed 8-bit range; \
                         values will be clamped at runtime",
                        entity.name, physics.velocity_clamp
                    ),
                ));
            }
            if !(0.0..=1.0).contains(&physics.friction) {
                self.diags.push_warning(Diagnostic::warning(
                    DiagnosticCode::PHYSICS_SANITY,
                    format!(
                        "entity '{}' friction {} outside the usual 0..1 range",
                        entity.name, physics.friction
                    ),
                ));
            }
            if physics.gravity.abs() > 16.0 {
                self.diags.push_warning(Diagnostic::warning(
                    DiagnosticCode::PHYSICS_SANITY,
                    format!(
                        "entity '{}' gravity {} outside the usual -16..16 range",
                        entity.name, physics.gravity
                    ),
                ));
            }
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Helpers
    // ══════════════════════════════════════════════════════════════════════

    fn push_at(&mut self, mut diag: Diagnostic, origin: Option<&Origin>) {
        if let Some(origin) = origin {
            diag = diag.with_origin(origin.clone());
        }
        self.diags.push_error(diag);
    }

    fn push_warning_at(&mut self, mut diag: Diagnostic, origin: Option<&Origin>) {
        if let Some(origin) = origin {
            diag = diag.with_origin(origin.clone());
        }
        self.diags.push_warning(diag);
    }

    fn all_pools(&self) -> Vec<&'a Pool> {
        self.game
            .pools
            .iter()
            .chain(self.game.particles.iter().map(|p| &p.pool))
            .collect()
    }

    fn variable_names(&self) -> Vec<&'a str> {
        self.game.variables.iter().map(|v| v.name.as_str()).collect()
    }

    fn array_names(&self) -> Vec<&'a str> {
        self.game.arrays.iter().map(|a| a.name.as_str()).collect()
    }

    fn sprite_names(&self) -> Vec<&'a str> {
        self.game.sprites.iter().map(|s| s.name.as_str()).collect()
    }

    fn entity_names(&self) -> Vec<&'a str> {
        self.game.entities.iter().map(|e| e.name.as_str()).collect()
    }

    fn scene_names(&self) -> Vec<&'a str> {
        self.game.scenes.iter().map(|s| s.name.as_str()).collect()
    }

    fn cutscene_names(&self) -> Vec<&'a str> {
        self.game.cutscenes.iter().map(|c| c.name.as_str()).collect()
    }

    fn machine_names(&self) -> Vec<&'a str> {
        self.game
            .state_machines
            .iter()
            .map(|m| m.name.as_str())
            .collect()
    }

    fn pool_names(&self) -> Vec<&'a str> {
        self.game
            .pools
            .iter()
            .map(|p| p.name.as_str())
            .chain(self.game.particles.iter().map(|p| p.pool.name.as_str()))
            .collect()
    }

    fn palette_names(&self) -> Vec<&'a str> {
        self.game.palettes.iter().map(|p| p.name.as_str()).collect()
    }

    fn dialog_names(&self) -> Vec<&'a str> {
        self.game.dialogs.iter().map(|d| d.name.as_str()).collect()
    }

    fn menu_names(&self) -> Vec<&'a str> {
        self.game.menus.iter().map(|m| m.name.as_str()).collect()
    }

    fn group_names(&self) -> Vec<&'a str> {
        self.game
            .mixer
            .groups
            .iter()
            .map(|g| g.name.as_str())
            .collect()
    }
}
