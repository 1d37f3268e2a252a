//! Pathfinding emitter — per-grid A* over a packed walkability bitmap.
//!
//! Each NavGrid compiles to a 1-bit-per-tile walkability table, an optional
//! per-tile cost byte, and a search function with the heuristic baked into
//! its arithmetic (no runtime dispatch). The working set is fixed capacity:
//! node and expansion bounds guarantee termination, and exhausting either
//! bound, like an overlong path, is a "not found" outcome, never an
//! overrun. Scratch storage is shared across grids; one search runs at a
//! time.
//!
//! Each frontier node packs `(tile << 8) | parent_index` into one 16-bit
//! word, which caps grids at 256 tiles.

use gamec_ir::game::{Heuristic, NavGrid};
use gamec_ir::limits::{SEARCH_MAX_EXPANSIONS, SEARCH_NODE_CAP, WAYPOINT_CAP};

use crate::error::{CodegenError, CodegenResult};
use crate::names;
use crate::writer::CWriter;

/// Largest tile count addressable by the packed node word.
pub const MAX_GRID_TILES: usize = 256;

/// Pack a walkability vector into the emitted bitmap bytes, bit `i % 8` of
/// byte `i / 8`.
pub fn pack_walkable(walkable: &[bool]) -> Vec<u8> {
    let mut bytes = vec![0u8; walkable.len().div_ceil(8)];
    for (i, &open) in walkable.iter().enumerate() {
        if open {
            bytes[i / 8] |= 1 << (i % 8);
        }
    }
    bytes
}

fn grid_tiles(grid: &NavGrid) -> usize {
    usize::from(grid.width) * usize::from(grid.height)
}

/// Emit the shared scratch arrays, sized for the largest grid.
pub fn emit_scratch(max_tiles: usize, w: &mut CWriter) {
    w.line(format!(
        "static uint16_t astar_node[{SEARCH_NODE_CAP}]; /* (tile << 8) | parent, parent 0xFF = none */"
    ));
    w.line(format!("static uint8_t  astar_g[{SEARCH_NODE_CAP}];"));
    w.line(format!(
        "static uint16_t astar_f[{SEARCH_NODE_CAP}]; /* 0xFFFF marks a closed node */"
    ));
    w.line(format!(
        "static uint8_t  astar_seen[{}];",
        max_tiles.div_ceil(8)
    ));
    w.line(format!("static uint8_t  path_waypoints[{WAYPOINT_CAP}];"));
    w.line("static uint8_t  path_len;");
}

/// Emit one grid's tables and search function.
pub fn emit_nav_grid(grid: &NavGrid, w: &mut CWriter) -> CodegenResult<()> {
    let tiles = grid_tiles(grid);
    if tiles > MAX_GRID_TILES {
        return Err(CodegenError::LimitExceeded(format!(
            "nav grid '{}' has {tiles} tiles; the packed node word addresses at most {MAX_GRID_TILES}",
            grid.name
        )));
    }
    if grid.walkable.len() != tiles {
        return Err(CodegenError::Internal(format!(
            "nav grid '{}' walkability table has {} entries for {tiles} tiles",
            grid.name,
            grid.walkable.len()
        )));
    }

    let n = names::c_ident(&grid.name);
    let width_const = format!("NAV_{}_W", names::c_const(&grid.name));
    let height_const = format!("NAV_{}_H", names::c_const(&grid.name));
    w.line(format!("#define {width_const} {}", grid.width));
    w.line(format!("#define {height_const} {}", grid.height));
    w.blank();

    let bitmap = pack_walkable(&grid.walkable);
    w.line(format!(
        "static const uint8_t nav_{n}_walk[{}] = {{",
        bitmap.len()
    ));
    for chunk in bitmap.chunks(12) {
        let row: Vec<String> = chunk.iter().map(|b| format!("0x{b:02x}")).collect();
        w.line(format!("    {},", row.join(", ")));
    }
    w.line("};");

    if let Some(cost) = &grid.cost {
        if cost.len() != tiles {
            return Err(CodegenError::Internal(format!(
                "nav grid '{}' cost table has {} entries for {tiles} tiles",
                grid.name,
                cost.len()
            )));
        }
        w.blank();
        w.line(format!("static const uint8_t nav_{n}_cost[{tiles}] = {{"));
        for chunk in cost.chunks(12) {
            let row: Vec<String> = chunk.iter().map(|c| format!("{c:3}")).collect();
            w.line(format!("    {},", row.join(", ")));
        }
        w.line("};");
    }

    // Heuristic baked into per-grid arithmetic.
    w.blank();
    w.open(format!("static uint8_t nav_{n}_h(uint8_t a, uint8_t b)"));
    w.line(format!("uint8_t ax = (uint8_t)(a % {width_const});"));
    w.line(format!("uint8_t ay = (uint8_t)(a / {width_const});"));
    w.line(format!("uint8_t bx = (uint8_t)(b % {width_const});"));
    w.line(format!("uint8_t by = (uint8_t)(b / {width_const});"));
    w.line("uint8_t dx = (uint8_t)(ax > bx ? ax - bx : bx - ax);");
    w.line("uint8_t dy = (uint8_t)(ay > by ? ay - by : by - ay);");
    match grid.heuristic {
        Heuristic::Manhattan => w.line("return (uint8_t)(dx + dy);"),
        Heuristic::Chebyshev => w.line("return dx > dy ? dx : dy;"),
        Heuristic::Euclidean => {
            w.line("/* integer approximation: max + min / 2 */");
            w.line("return (uint8_t)(dx > dy ? dx + (dy >> 1) : dy + (dx >> 1));");
        }
    }
    w.close();

    // Search function.
    w.blank();
    w.open(format!("uint8_t nav_{n}_find(uint8_t start, uint8_t goal)"));
    w.line("uint8_t count;");
    w.line("uint8_t expansions;");
    w.line("uint8_t i;");
    w.open("if (start == goal)");
    w.line("path_len = 0;");
    w.line("return 0;");
    w.close();
    w.line(format!(
        "for (i = 0; i < {}; i++) astar_seen[i] = 0;",
        tiles.div_ceil(8)
    ));
    w.line("astar_node[0] = (uint16_t)(((uint16_t)start << 8) | 0xFFu);");
    w.line("astar_g[0] = 0;");
    w.line(format!("astar_f[0] = nav_{n}_h(start, goal);"));
    w.line("astar_seen[start >> 3] |= (uint8_t)(1u << (start & 7));");
    w.line("count = 1;");
    w.open(format!(
        "for (expansions = 0; expansions < {SEARCH_MAX_EXPANSIONS}; expansions++)"
    ));
    w.line("uint8_t best = 0xFF;");
    w.line("uint16_t best_f = 0xFFFFu;");
    w.line("uint8_t tile, x, y, n;");
    w.open("for (i = 0; i < count; i++)");
    w.open("if (astar_f[i] < best_f)");
    w.line("best_f = astar_f[i];");
    w.line("best = i;");
    w.close();
    w.close();
    w.open("if (best == 0xFF)");
    w.line("path_len = 0;");
    w.line("return 0xFF; /* open set exhausted */");
    w.close();
    w.line("tile = (uint8_t)(astar_node[best] >> 8);");
    w.open("if (tile == goal)");
    // Walk parent links back from the goal, then reverse.
    w.line("path_len = 0;");
    w.line("i = best;");
    w.open("for (;;)");
    w.line("uint8_t parent = (uint8_t)(astar_node[i] & 0xFFu);");
    w.open("if (parent == 0xFF)");
    w.line("break; /* reached the start node; it is not a waypoint */");
    w.close();
    w.open(format!("if (path_len >= {WAYPOINT_CAP})"));
    w.line("path_len = 0;");
    w.line("return 0xFF; /* path longer than the waypoint buffer */");
    w.close();
    w.line("path_waypoints[path_len++] = (uint8_t)(astar_node[i] >> 8);");
    w.line("i = parent;");
    w.close();
    w.open("for (i = 0; i < path_len / 2; i++)");
    w.line("uint8_t tmp = path_waypoints[i];");
    w.line("path_waypoints[i] = path_waypoints[path_len - 1 - i];");
    w.line("path_waypoints[path_len - 1 - i] = tmp;");
    w.close();
    w.line("return path_len;");
    w.close();
    w.line("astar_f[best] = 0xFFFFu; /* close */");
    w.line(format!("x = (uint8_t)(tile % {width_const});"));
    w.line(format!("y = (uint8_t)(tile / {width_const});"));
    w.open("for (n = 0; n < 4; n++)");
    w.line("uint8_t nx = x, ny = y, nt, g;");
    w.open("if (n == 0)");
    w.line("if (y == 0) continue;");
    w.line("ny = (uint8_t)(y - 1);");
    w.close();
    w.open("else if (n == 1)");
    w.line(format!("if ((uint8_t)(x + 1) >= {width_const}) continue;"));
    w.line("nx = (uint8_t)(x + 1);");
    w.close();
    w.open("else if (n == 2)");
    w.line(format!("if ((uint8_t)(y + 1) >= {height_const}) continue;"));
    w.line("ny = (uint8_t)(y + 1);");
    w.close();
    w.open("else");
    w.line("if (x == 0) continue;");
    w.line("nx = (uint8_t)(x - 1);");
    w.close();
    w.line(format!("nt = (uint8_t)(ny * {width_const} + nx);"));
    w.open(format!(
        "if (!(nav_{n}_walk[nt >> 3] & (1u << (nt & 7))))"
    ));
    w.line("continue;");
    w.close();
    w.open("if (astar_seen[nt >> 3] & (1u << (nt & 7)))");
    w.line("continue;");
    w.close();
    w.open(format!("if (count >= {SEARCH_NODE_CAP})"));
    w.line("path_len = 0;");
    w.line("return 0xFF; /* node bound exhausted */");
    w.close();
    match &grid.cost {
        Some(_) => w.line(format!("g = (uint8_t)(astar_g[best] + nav_{n}_cost[nt]);")),
        None => w.line("g = (uint8_t)(astar_g[best] + 1);"),
    }
    w.line("astar_node[count] = (uint16_t)(((uint16_t)nt << 8) | best);");
    w.line("astar_g[count] = g;");
    w.line(format!("astar_f[count] = (uint16_t)(g + nav_{n}_h(nt, goal));"));
    w.line("astar_seen[nt >> 3] |= (uint8_t)(1u << (nt & 7));");
    w.line("count++;");
    w.close();
    w.close();
    w.line("path_len = 0;");
    w.line("return 0xFF; /* expansion bound exhausted */");
    w.close();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Step-for-step mirror of the emitted search: same packed bitmap,
    /// first-touch insertion, linear min-f scan, neighbor order, bounds,
    /// and parent walk. Returns the waypoints (start excluded) or `None`
    /// where the generated function returns 0xFF.
    fn run_search(grid: &NavGrid, start: u8, goal: u8) -> Option<Vec<u8>> {
        let width = grid.width;
        let h = |a: u8, b: u8| -> u8 {
            let dx = (a % width).abs_diff(b % width);
            let dy = (a / width).abs_diff(b / width);
            match grid.heuristic {
                Heuristic::Manhattan => dx + dy,
                Heuristic::Chebyshev => dx.max(dy),
                Heuristic::Euclidean => {
                    if dx > dy {
                        dx + (dy >> 1)
                    } else {
                        dy + (dx >> 1)
                    }
                }
            }
        };
        if start == goal {
            return Some(Vec::new());
        }
        let walk = pack_walkable(&grid.walkable);
        let mut node = [0u16; SEARCH_NODE_CAP];
        let mut g_cost = [0u8; SEARCH_NODE_CAP];
        let mut f_cost = [0u16; SEARCH_NODE_CAP];
        let mut seen = vec![0u8; grid.walkable.len().div_ceil(8)];
        node[0] = (u16::from(start) << 8) | 0xFF;
        f_cost[0] = u16::from(h(start, goal));
        seen[usize::from(start) >> 3] |= 1 << (start & 7);
        let mut count = 1usize;
        for _ in 0..SEARCH_MAX_EXPANSIONS {
            let mut best = usize::MAX;
            let mut best_f = 0xFFFFu16;
            for (i, &f) in f_cost.iter().enumerate().take(count) {
                if f < best_f {
                    best_f = f;
                    best = i;
                }
            }
            if best == usize::MAX {
                return None;
            }
            let tile = (node[best] >> 8) as u8;
            if tile == goal {
                let mut path = Vec::new();
                let mut i = best;
                loop {
                    let parent = (node[i] & 0xFF) as u8;
                    if parent == 0xFF {
                        break;
                    }
                    if path.len() >= WAYPOINT_CAP {
                        return None;
                    }
                    path.push((node[i] >> 8) as u8);
                    i = usize::from(parent);
                }
                path.reverse();
                return Some(path);
            }
            f_cost[best] = 0xFFFF;
            let (x, y) = (tile % width, tile / width);
            for n in 0..4u8 {
                let (nx, ny) = match n {
                    0 if y > 0 => (x, y - 1),
                    1 if x + 1 < width => (x + 1, y),
                    2 if y + 1 < grid.height => (x, y + 1),
                    3 if x > 0 => (x - 1, y),
                    _ => continue,
                };
                let nt = ny * width + nx;
                if walk[usize::from(nt) >> 3] & (1 << (nt & 7)) == 0 {
                    continue;
                }
                if seen[usize::from(nt) >> 3] & (1 << (nt & 7)) != 0 {
                    continue;
                }
                if count >= SEARCH_NODE_CAP {
                    return None;
                }
                let step = grid.cost.as_ref().map_or(1, |c| c[usize::from(nt)]);
                node[count] = (u16::from(nt) << 8) | u16::from(best as u8);
                g_cost[count] = g_cost[best].wrapping_add(step);
                f_cost[count] = u16::from(g_cost[count]) + u16::from(h(nt, goal));
                seen[usize::from(nt) >> 3] |= 1 << (nt & 7);
                count += 1;
            }
        }
        None
    }

    fn open_grid(width: u8, height: u8) -> NavGrid {
        NavGrid {
            name: "field".into(),
            width,
            height,
            walkable: vec![true; usize::from(width) * usize::from(height)],
            cost: None,
            heuristic: Heuristic::Manhattan,
        }
    }

    #[test]
    fn test_open_grid_waypoints_equal_manhattan_distance() {
        let grid = open_grid(8, 8);
        // (0,0) to (5,3): dx 5 + dy 3 = 8 steps.
        let path = run_search(&grid, 0, 3 * 8 + 5).expect("no path");
        assert_eq!(path.len(), 8);
        assert_eq!(*path.last().unwrap(), 3 * 8 + 5);
    }

    #[test]
    fn test_search_routes_around_walls() {
        let mut grid = open_grid(4, 4);
        // Wall down column x = 1 except the bottom row.
        for tile in [1usize, 5, 9] {
            grid.walkable[tile] = false;
        }
        let path = run_search(&grid, 0, 2).expect("no path");
        // Detour through row y = 3: eight steps for a Manhattan distance of 2.
        assert_eq!(path.len(), 8);
        assert_eq!(*path.last().unwrap(), 2);
    }

    #[test]
    fn test_walled_off_goal_reports_no_path() {
        let mut grid = open_grid(4, 4);
        // Isolate (3,3) completely.
        grid.walkable[14] = false;
        grid.walkable[11] = false;
        assert_eq!(run_search(&grid, 0, 15), None);
    }

    #[test]
    fn test_search_to_self_is_empty() {
        let grid = open_grid(4, 4);
        assert_eq!(run_search(&grid, 5, 5), Some(Vec::new()));
    }

    #[test]
    fn test_pack_walkable_bit_order() {
        // Tile i lands in bit i % 8 of byte i / 8.
        let mut walkable = vec![false; 10];
        walkable[0] = true;
        walkable[3] = true;
        walkable[9] = true;
        assert_eq!(pack_walkable(&walkable), vec![0b0000_1001, 0b0000_0010]);
    }

    #[test]
    fn test_oversized_grid_rejected() {
        let grid = NavGrid {
            name: "huge".into(),
            width: 32,
            height: 32,
            walkable: vec![true; 1024],
            cost: None,
            heuristic: Heuristic::Manhattan,
        };
        let mut w = CWriter::new();
        assert!(matches!(
            emit_nav_grid(&grid, &mut w),
            Err(CodegenError::LimitExceeded(_))
        ));
    }
}
