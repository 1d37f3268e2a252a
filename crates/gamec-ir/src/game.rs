//! The `Game` aggregate: every static declaration the front-end records,
//! frozen into an immutable snapshot.
//!
//! Construction is staged: the front-end mutates a [`GameBuilder`], then
//! [`GameBuilder::build`] freezes it into a [`Game`] handed to the validator
//! and the code generator. Neither ever mutates it. All collections preserve
//! declaration order — iteration order is part of the determinism contract.

use crate::ir::{Expr, Stmt, VarType};

// ══════════════════════════════════════════════════════════════════════════════
// Scalars & components
// ══════════════════════════════════════════════════════════════════════════════

/// A global variable declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub ty: VarType,
    pub initial: Option<i32>,
}

/// A global array declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayDecl {
    pub name: String,
    pub ty: VarType,
    pub len: u16,
    /// Optional initial values, at most `len` of them.
    pub initial: Vec<i32>,
}

/// A world position in fractional units, converted to fixed-point 8.8 once
/// at generation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

/// A velocity in fractional units per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

/// An axis-aligned collision box relative to the owner's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hitbox {
    pub x: i8,
    pub y: i8,
    pub w: u8,
    pub h: u8,
}

/// A named animation: a frame sequence plus its cadence in ticks per frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    pub name: String,
    pub frames: Vec<u8>,
    pub ticks_per_frame: u8,
}

/// A sprite declaration. Pixel sizes are 8-aligned tile multiples.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub name: String,
    pub asset: String,
    pub width: u8,
    pub height: u8,
    pub position: Option<Position>,
    pub hitbox: Option<Hitbox>,
    pub animations: Vec<Animation>,
    /// Referenced palette name, if any.
    pub palette: Option<String>,
}

impl Sprite {
    /// Hardware tiles this sprite occupies per animation frame.
    pub fn tiles_per_frame(&self) -> u32 {
        u32::from(self.width / 8).max(1) * u32::from(self.height / 8).max(1)
    }

    /// Total frames across all animations (at least one for a static sprite).
    pub fn frame_count(&self) -> u32 {
        let animated: u32 = self.animations.iter().map(|a| a.frames.len() as u32).sum();
        animated.max(1)
    }
}

/// Physics parameters, stored as fractional configuration and converted to
/// fixed-point 8.8 at generation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Physics {
    pub gravity: f32,
    pub friction: f32,
    pub mass: f32,
    pub velocity_clamp: f32,
}

/// An entity: a composition of optional components. Capability is determined
/// by which components are present — there is no inheritance.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub name: String,
    pub position: Option<Position>,
    pub velocity: Option<Velocity>,
    /// Referenced sprite name.
    pub sprite: Option<String>,
    pub hitbox: Option<Hitbox>,
    pub tags: Vec<String>,
    pub physics: Option<Physics>,
    /// Referenced state machine name.
    pub state_machine: Option<String>,
}

// ══════════════════════════════════════════════════════════════════════════════
// Pools & particles
// ══════════════════════════════════════════════════════════════════════════════

/// A typed per-slot state field in a pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotField {
    pub name: String,
    pub ty: VarType,
}

/// A fixed-capacity object pool.
#[derive(Debug, Clone, PartialEq)]
pub struct Pool {
    pub name: String,
    pub capacity: u8,
    pub has_position: bool,
    pub has_velocity: bool,
    /// Referenced sprite template name.
    pub sprite: Option<String>,
    pub fields: Vec<SlotField>,
    pub on_spawn: Vec<Stmt>,
    pub on_frame: Vec<Stmt>,
    pub on_despawn: Vec<Stmt>,
    /// Boolean predicates combined by OR; any true despawns the slot.
    pub despawn_when: Vec<Expr>,
}

/// A particle system: a pool with an implicit `_lifetime` field initialized
/// on spawn, decremented each frame, and an implicit `lifetime == 0` despawn
/// predicate composed alongside (never replacing) the user hooks.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleSystem {
    pub pool: Pool,
    /// Initial `_lifetime` value in frames.
    pub lifetime_frames: u16,
}

// ══════════════════════════════════════════════════════════════════════════════
// State machines & scenes
// ══════════════════════════════════════════════════════════════════════════════

/// A transition edge: when `condition` holds, move to the named state.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub condition: Expr,
    pub target: String,
}

/// A named state with its behavioral hooks and outgoing edges.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub name: String,
    pub on_enter: Vec<Stmt>,
    pub on_tick: Vec<Stmt>,
    pub on_exit: Vec<Stmt>,
    pub transitions: Vec<Transition>,
}

/// A state machine declaration with one default state.
#[derive(Debug, Clone, PartialEq)]
pub struct StateMachine {
    pub name: String,
    pub states: Vec<State>,
    pub initial: String,
}

/// A scene with enter/frame/exit hooks.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub name: String,
    pub on_enter: Vec<Stmt>,
    pub on_frame: Vec<Stmt>,
    pub on_exit: Vec<Stmt>,
}

/// A named cutscene: a plain statement list invoked via `StmtKind::Call`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cutscene {
    pub name: String,
    pub steps: Vec<Stmt>,
}

// ══════════════════════════════════════════════════════════════════════════════
// Navigation
// ══════════════════════════════════════════════════════════════════════════════

/// Distance heuristic baked into a nav grid's generated search arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heuristic {
    Manhattan,
    Chebyshev,
    Euclidean,
}

/// A navigation grid: one walkability bit per tile, optional per-tile cost.
#[derive(Debug, Clone, PartialEq)]
pub struct NavGrid {
    pub name: String,
    pub width: u8,
    pub height: u8,
    /// Row-major walkability, `width * height` entries.
    pub walkable: Vec<bool>,
    /// Optional per-tile movement cost overlay, same length as `walkable`.
    pub cost: Option<Vec<u8>>,
    pub heuristic: Heuristic,
}

// ══════════════════════════════════════════════════════════════════════════════
// Palettes
// ══════════════════════════════════════════════════════════════════════════════

/// Palette register type: sprite and background slots are tracked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteKind {
    Sprite,
    Background,
}

/// An RGB555 color as raw channels. Channels may arrive out of range from
/// the front-end; the validator rejects them before packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pack into the hardware's 15-bit BGR555 word.
    pub fn packed(self) -> u16 {
        (u16::from(self.b) << 10) | (u16::from(self.g) << 5) | u16::from(self.r)
    }
}

/// A 4-color hardware palette.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    pub name: String,
    pub kind: PaletteKind,
    /// Explicit slot 0–7, or auto-assigned in declaration order.
    pub slot: Option<u8>,
    pub colors: Vec<Rgb>,
}

// ══════════════════════════════════════════════════════════════════════════════
// UI, audio, save, link, input
// ══════════════════════════════════════════════════════════════════════════════

/// A dialog box: its text lines become a static string table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub name: String,
    pub lines: Vec<String>,
}

/// One selectable menu entry with its select handler.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuItem {
    pub label: String,
    pub on_select: Vec<Stmt>,
}

/// A menu declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Menu {
    pub name: String,
    pub items: Vec<MenuItem>,
}

/// Checksum kind for the save layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    None,
    Xor,
    Crc8,
    Sum16,
}

/// A typed save field with its default value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveField {
    pub name: String,
    pub ty: VarType,
    pub default: i32,
}

/// The save-data layout: ordered fields, slot count, checksum, marker.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveSchema {
    pub fields: Vec<SaveField>,
    pub slots: u8,
    pub checksum: ChecksumKind,
    pub magic: u16,
    pub version: u8,
}

impl SaveSchema {
    /// Payload bytes per slot, excluding header and checksum.
    pub fn payload_bytes(&self) -> u32 {
        self.fields.iter().map(|f| f.ty.size_bytes()).sum()
    }
}

/// A named audio group with its default volume and channel allocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioGroup {
    pub name: String,
    pub volume: u8,
    pub channels: u8,
}

/// The audio mixer configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioMixer {
    pub groups: Vec<AudioGroup>,
}

/// Camera configuration (optional; no camera code is emitted without one).
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Entity the camera tracks, if any.
    pub follow: Option<String>,
    pub deadzone_w: u8,
    pub deadzone_h: u8,
    /// World bounds the camera clamps to, in pixels.
    pub bounds_w: u16,
    pub bounds_h: u16,
}

/// Link-cable configuration (optional; emitted as constants only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    pub two_player: bool,
    pub packet_size: u8,
}

/// A hardware button in an input-buffer sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
    Start,
    Select,
}

/// A buffered input sequence matched within a frame window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBuffer {
    pub name: String,
    pub sequence: Vec<Button>,
    pub window_frames: u8,
}

// ══════════════════════════════════════════════════════════════════════════════
// The Game aggregate
// ══════════════════════════════════════════════════════════════════════════════

/// The immutable root of one compilation batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Game {
    pub variables: Vec<Variable>,
    pub arrays: Vec<ArrayDecl>,
    pub sprites: Vec<Sprite>,
    pub entities: Vec<Entity>,
    pub pools: Vec<Pool>,
    pub particles: Vec<ParticleSystem>,
    pub state_machines: Vec<StateMachine>,
    pub scenes: Vec<Scene>,
    pub cutscenes: Vec<Cutscene>,
    pub nav_grids: Vec<NavGrid>,
    pub palettes: Vec<Palette>,
    pub dialogs: Vec<Dialog>,
    pub menus: Vec<Menu>,
    pub save: Option<SaveSchema>,
    pub mixer: AudioMixer,
    pub camera: Option<Camera>,
    pub link: Option<LinkConfig>,
    pub input_buffers: Vec<InputBuffer>,
    /// Name of the scene entered at startup. Exactly one is required.
    pub start_scene: String,
}

impl Game {
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn array(&self, name: &str) -> Option<&ArrayDecl> {
        self.arrays.iter().find(|a| a.name == name)
    }

    pub fn sprite(&self, name: &str) -> Option<&Sprite> {
        self.sprites.iter().find(|s| s.name == name)
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.name == name)
    }

    pub fn state_machine(&self, name: &str) -> Option<&StateMachine> {
        self.state_machines.iter().find(|m| m.name == name)
    }

    /// Look up a pool by name, including particle-system pools.
    pub fn pool(&self, name: &str) -> Option<&Pool> {
        self.pools
            .iter()
            .find(|p| p.name == name)
            .or_else(|| self.particles.iter().map(|ps| &ps.pool).find(|p| p.name == name))
    }

    /// Every behavioral hook in the game, in declaration order, with the
    /// pool whose slot fields are in scope (pool hooks only).
    pub fn hooks<'a>(&'a self) -> Vec<HookRef<'a>> {
        let mut hooks = Vec::new();
        let mut push = |label: String, stmts: &'a [Stmt]| {
            hooks.push(HookRef {
                label,
                pool: None,
                stmts,
            });
        };
        for scene in &self.scenes {
            push(format!("scene '{}' enter", scene.name), scene.on_enter.as_slice());
            push(format!("scene '{}' frame", scene.name), scene.on_frame.as_slice());
            push(format!("scene '{}' exit", scene.name), scene.on_exit.as_slice());
        }
        for machine in &self.state_machines {
            for state in &machine.states {
                let at = format!("state machine '{}' state '{}'", machine.name, state.name);
                push(format!("{at} enter"), state.on_enter.as_slice());
                push(format!("{at} tick"), state.on_tick.as_slice());
                push(format!("{at} exit"), state.on_exit.as_slice());
            }
        }
        for cutscene in &self.cutscenes {
            push(format!("cutscene '{}'", cutscene.name), cutscene.steps.as_slice());
        }
        for menu in &self.menus {
            for (i, item) in menu.items.iter().enumerate() {
                push(
                    format!("menu '{}' item {} select", menu.name, i),
                    item.on_select.as_slice(),
                );
            }
        }
        for pool in self.pools.iter().chain(self.particles.iter().map(|p| &p.pool)) {
            hooks.push(HookRef {
                label: format!("pool '{}' onSpawn", pool.name),
                pool: Some(pool),
                stmts: pool.on_spawn.as_slice(),
            });
            hooks.push(HookRef {
                label: format!("pool '{}' onFrame", pool.name),
                pool: Some(pool),
                stmts: pool.on_frame.as_slice(),
            });
            hooks.push(HookRef {
                label: format!("pool '{}' onDespawn", pool.name),
                pool: Some(pool),
                stmts: pool.on_despawn.as_slice(),
            });
        }
        hooks
    }
}

/// One behavioral hook: a label for diagnostics, the pool whose slot fields
/// are in scope (if any), and the statement list itself.
pub struct HookRef<'a> {
    pub label: String,
    pub pool: Option<&'a Pool>,
    pub stmts: &'a [Stmt],
}

// ══════════════════════════════════════════════════════════════════════════════
// GameBuilder — staged mutable construction, frozen by build()
// ══════════════════════════════════════════════════════════════════════════════

/// Mutable staging area the front-end fills before freezing.
///
/// Placeholder identifiers come from the builder's own counter — there is no
/// global mutable state anywhere in the core.
#[derive(Debug, Clone, Default)]
pub struct GameBuilder {
    game: Game,
    next_id: u32,
}

impl GameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a unique placeholder identifier with the given prefix.
    pub fn fresh_id(&mut self, prefix: &str) -> String {
        let id = self.next_id;
        self.next_id += 1;
        format!("__{prefix}_{id}")
    }

    pub fn variable(&mut self, variable: Variable) -> &mut Self {
        self.game.variables.push(variable);
        self
    }

    pub fn array(&mut self, array: ArrayDecl) -> &mut Self {
        self.game.arrays.push(array);
        self
    }

    pub fn sprite(&mut self, sprite: Sprite) -> &mut Self {
        self.game.sprites.push(sprite);
        self
    }

    pub fn entity(&mut self, entity: Entity) -> &mut Self {
        self.game.entities.push(entity);
        self
    }

    pub fn pool(&mut self, pool: Pool) -> &mut Self {
        self.game.pools.push(pool);
        self
    }

    pub fn particles(&mut self, system: ParticleSystem) -> &mut Self {
        self.game.particles.push(system);
        self
    }

    pub fn state_machine(&mut self, machine: StateMachine) -> &mut Self {
        self.game.state_machines.push(machine);
        self
    }

    pub fn scene(&mut self, scene: Scene) -> &mut Self {
        self.game.scenes.push(scene);
        self
    }

    pub fn cutscene(&mut self, cutscene: Cutscene) -> &mut Self {
        self.game.cutscenes.push(cutscene);
        self
    }

    pub fn nav_grid(&mut self, grid: NavGrid) -> &mut Self {
        self.game.nav_grids.push(grid);
        self
    }

    pub fn palette(&mut self, palette: Palette) -> &mut Self {
        self.game.palettes.push(palette);
        self
    }

    pub fn dialog(&mut self, dialog: Dialog) -> &mut Self {
        self.game.dialogs.push(dialog);
        self
    }

    pub fn menu(&mut self, menu: Menu) -> &mut Self {
        self.game.menus.push(menu);
        self
    }

    pub fn save_schema(&mut self, save: SaveSchema) -> &mut Self {
        self.game.save = Some(save);
        self
    }

    pub fn audio_group(&mut self, group: AudioGroup) -> &mut Self {
        self.game.mixer.groups.push(group);
        self
    }

    pub fn camera(&mut self, camera: Camera) -> &mut Self {
        self.game.camera = Some(camera);
        self
    }

    pub fn link(&mut self, link: LinkConfig) -> &mut Self {
        self.game.link = Some(link);
        self
    }

    pub fn input_buffer(&mut self, buffer: InputBuffer) -> &mut Self {
        self.game.input_buffers.push(buffer);
        self
    }

    pub fn start_scene(&mut self, name: impl Into<String>) -> &mut Self {
        self.game.start_scene = name.into();
        self
    }

    /// Freeze into the immutable snapshot handed to the validator.
    pub fn build(self) -> Game {
        self.game
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_packing() {
        assert_eq!(Rgb::new(31, 31, 31).packed(), 0x7FFF);
        assert_eq!(Rgb::new(31, 0, 0).packed(), 0x001F);
        assert_eq!(Rgb::new(0, 0, 31).packed(), 0x7C00);
    }

    #[test]
    fn test_sprite_tile_accounting() {
        let sprite = Sprite {
            name: "hero".into(),
            asset: "hero.png".into(),
            width: 16,
            height: 16,
            position: None,
            hitbox: None,
            animations: vec![
                Animation {
                    name: "walk".into(),
                    frames: vec![0, 1, 2, 1],
                    ticks_per_frame: 8,
                },
                Animation {
                    name: "idle".into(),
                    frames: vec![0],
                    ticks_per_frame: 1,
                },
            ],
            palette: None,
        };
        assert_eq!(sprite.tiles_per_frame(), 4);
        assert_eq!(sprite.frame_count(), 5);
    }

    #[test]
    fn test_builder_freezes_in_declaration_order() {
        let mut builder = GameBuilder::new();
        builder
            .variable(Variable {
                name: "score".into(),
                ty: VarType::U16,
                initial: Some(0),
            })
            .variable(Variable {
                name: "lives".into(),
                ty: VarType::U8,
                initial: Some(3),
            })
            .start_scene("title");
        let game = builder.build();
        assert_eq!(game.variables[0].name, "score");
        assert_eq!(game.variables[1].name, "lives");
        assert_eq!(game.start_scene, "title");
    }

    #[test]
    fn test_fresh_ids_are_unique() {
        let mut builder = GameBuilder::new();
        let a = builder.fresh_id("tmp");
        let b = builder.fresh_id("tmp");
        assert_ne!(a, b);
    }

    #[test]
    fn test_pool_lookup_covers_particles() {
        let mut builder = GameBuilder::new();
        builder.particles(ParticleSystem {
            pool: Pool {
                name: "sparks".into(),
                capacity: 8,
                has_position: true,
                has_velocity: true,
                sprite: None,
                fields: vec![],
                on_spawn: vec![],
                on_frame: vec![],
                on_despawn: vec![],
                despawn_when: vec![],
            },
            lifetime_frames: 30,
        });
        let game = builder.build();
        assert!(game.pool("sparks").is_some());
    }
}
