//! Static memory-budget estimation.
//!
//! Sums the worst-case static WRAM contribution of every declaration the
//! generator will emit storage for, as named line items so budget
//! diagnostics can carry the full breakdown. A parallel estimate counts
//! VRAM tiles against the tile bank.

use gamec_ir::game::Game;
use gamec_ir::ir::{visit_stmts, StmtKind};
use gamec_ir::limits;

/// One named contribution to the WRAM estimate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub label: String,
    pub bytes: u32,
}

/// The full WRAM estimate with its line-item breakdown.
#[derive(Debug, Clone, Default)]
pub struct MemoryEstimate {
    pub items: Vec<LineItem>,
}

impl MemoryEstimate {
    pub fn total(&self) -> u32 {
        self.items.iter().map(|item| item.bytes).sum()
    }

    /// Render the breakdown as one line per item, for budget diagnostics.
    pub fn breakdown(&self) -> String {
        let mut out = String::new();
        for item in &self.items {
            out.push_str(&format!("\n    {}: {} bytes", item.label, item.bytes));
        }
        out.push_str(&format!("\n    total: {} bytes", self.total()));
        out
    }

    fn push(&mut self, label: impl Into<String>, bytes: u32) {
        if bytes > 0 {
            self.items.push(LineItem {
                label: label.into(),
                bytes,
            });
        }
    }
}

/// Bytes of one pool slot's state (active flag included).
fn pool_slot_bytes(pool: &gamec_ir::game::Pool, is_particle: bool) -> u32 {
    let mut bytes = 1; // active flag
    if pool.has_position {
        bytes += 4; // fixed-point x, y
    }
    if pool.has_velocity {
        bytes += 4;
    }
    if is_particle {
        bytes += 2; // implicit _lifetime
    }
    bytes + pool.fields.iter().map(|f| f.ty.size_bytes()).sum::<u32>()
}

/// True when any statement anywhere in the game starts a tween.
pub fn uses_tweens(game: &Game) -> bool {
    let mut found = false;
    for hook in game.hooks() {
        visit_stmts(hook.stmts, &mut |stmt| {
            if matches!(stmt.kind, StmtKind::Tween(_)) {
                found = true;
            }
        });
    }
    found
}

/// Estimate worst-case static WRAM usage in bytes.
pub fn estimate_wram(game: &Game) -> MemoryEstimate {
    let mut est = MemoryEstimate::default();

    let variable_bytes: u32 = game.variables.iter().map(|v| v.ty.size_bytes()).sum();
    est.push("variables", variable_bytes);

    let array_bytes: u32 = game
        .arrays
        .iter()
        .map(|a| u32::from(a.len) * a.ty.size_bytes())
        .sum();
    est.push("arrays", array_bytes);

    let mut entity_bytes = 0;
    for entity in &game.entities {
        if entity.position.is_some() {
            entity_bytes += 4;
        }
        if entity.velocity.is_some() {
            entity_bytes += 4;
        }
        if entity.sprite.is_some() {
            entity_bytes += 1; // OAM slot index
        }
    }
    est.push("entity components", entity_bytes);

    for pool in &game.pools {
        est.push(
            format!("pool '{}' ({} slots)", pool.name, pool.capacity),
            u32::from(pool.capacity) * pool_slot_bytes(pool, false),
        );
    }
    for system in &game.particles {
        est.push(
            format!(
                "particle system '{}' ({} slots)",
                system.pool.name, system.pool.capacity
            ),
            u32::from(system.pool.capacity) * pool_slot_bytes(&system.pool, true),
        );
    }
    let pool_count = game.pools.len() + game.particles.len();
    if pool_count > 0 {
        est.push("pool overflow flags", pool_count.div_ceil(8) as u32);
    }

    est.push("state machine indices", game.state_machines.len() as u32);

    if let Some(save) = &game.save {
        let checksum_bytes = match save.checksum {
            gamec_ir::game::ChecksumKind::None => 0,
            gamec_ir::game::ChecksumKind::Xor | gamec_ir::game::ChecksumKind::Crc8 => 1,
            gamec_ir::game::ChecksumKind::Sum16 => 2,
        };
        // magic (2) + version (1) + payload + checksum, staged once
        est.push("save staging buffer", 3 + save.payload_bytes() + checksum_bytes);
    }

    if game.camera.is_some() {
        est.push("camera", 8);
    }

    est.push("dialog state", 4 * game.dialogs.len() as u32);
    est.push("menu state", 4 * game.menus.len() as u32);

    if !game.nav_grids.is_empty() {
        // Search scratch is shared across grids (one search at a time):
        // node words + g costs + f costs + visited bitmap + waypoints + len.
        let node_cap = limits::SEARCH_NODE_CAP as u32;
        let max_tiles = game
            .nav_grids
            .iter()
            .map(|g| u32::from(g.width) * u32::from(g.height))
            .max()
            .unwrap_or(0);
        let scratch =
            node_cap * 2 + node_cap + node_cap * 2 + max_tiles.div_ceil(8) + limits::WAYPOINT_CAP as u32 + 1;
        est.push("pathfinding scratch", scratch);
    }

    if uses_tweens(game) {
        // 12-byte slot struct per concurrent tween, plus the overflow flag.
        est.push("tween slots", limits::TWEEN_SLOT_CAP as u32 * 12 + 1);
    }

    est.push("input buffers", 8 * game.input_buffers.len() as u32);
    est.push("scene management", 4);

    est
}

/// Estimate VRAM usage in tiles: tiles per frame times frame count, summed
/// over every sprite.
pub fn estimate_vram_tiles(game: &Game) -> u32 {
    game.sprites
        .iter()
        .map(|s| s.tiles_per_frame() * s.frame_count())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamec_ir::game::*;
    use gamec_ir::ir::VarType;

    fn minimal_game() -> Game {
        let mut b = GameBuilder::new();
        b.scene(Scene {
            name: "title".into(),
            on_enter: vec![],
            on_frame: vec![],
            on_exit: vec![],
        })
        .start_scene("title");
        b.build()
    }

    #[test]
    fn test_minimal_game_is_tiny() {
        let est = estimate_wram(&minimal_game());
        // Only the fixed scene-management overhead.
        assert_eq!(est.total(), 4);
    }

    #[test]
    fn test_array_and_variable_sizes() {
        let mut b = GameBuilder::new();
        b.variable(Variable {
            name: "score".into(),
            ty: VarType::U16,
            initial: None,
        })
        .array(ArrayDecl {
            name: "inventory".into(),
            ty: VarType::U8,
            len: 8,
            initial: vec![],
        })
        .start_scene("title");
        b.scene(Scene {
            name: "title".into(),
            on_enter: vec![],
            on_frame: vec![],
            on_exit: vec![],
        });
        let est = estimate_wram(&b.build());
        assert_eq!(est.total(), 2 + 8 + 4);
    }

    #[test]
    fn test_pool_slot_accounting() {
        let pool = Pool {
            name: "bullets".into(),
            capacity: 10,
            has_position: true,
            has_velocity: true,
            sprite: None,
            fields: vec![SlotField {
                name: "damage".into(),
                ty: VarType::U8,
            }],
            on_spawn: vec![],
            on_frame: vec![],
            on_despawn: vec![],
            despawn_when: vec![],
        };
        // active 1 + pos 4 + vel 4 + damage 1 = 10 bytes per slot
        assert_eq!(pool_slot_bytes(&pool, false), 10);
        assert_eq!(pool_slot_bytes(&pool, true), 12);
    }

    #[test]
    fn test_breakdown_mentions_every_item() {
        let mut b = GameBuilder::new();
        b.variable(Variable {
            name: "hp".into(),
            ty: VarType::U8,
            initial: None,
        })
        .scene(Scene {
            name: "title".into(),
            on_enter: vec![],
            on_frame: vec![],
            on_exit: vec![],
        })
        .start_scene("title");
        let est = estimate_wram(&b.build());
        let text = est.breakdown();
        assert!(text.contains("variables: 1 bytes"));
        assert!(text.contains("total:"));
    }

    #[test]
    fn test_vram_tiles() {
        let mut b = GameBuilder::new();
        b.sprite(Sprite {
            name: "hero".into(),
            asset: "hero.png".into(),
            width: 16,
            height: 16,
            position: None,
            hitbox: None,
            animations: vec![Animation {
                name: "walk".into(),
                frames: vec![0, 1, 2],
                ticks_per_frame: 6,
            }],
            palette: None,
        });
        assert_eq!(estimate_vram_tiles(&b.build()), 4 * 3);
    }
}
