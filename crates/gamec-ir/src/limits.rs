//! Hardware boundary constants.
//!
//! These mirror the target platform exactly and are shared by the validator
//! (budget passes) and the code generator (buffer sizing). Changing any of
//! them changes the hardware contract, not a tuning knob.

/// Simultaneously visible hardware sprites (OAM entries).
pub const OAM_SPRITE_CAP: u32 = 40;

/// Worst-case sprite counts within this margin of the cap draw a warning.
pub const OAM_WARN_MARGIN: u32 = 5;

/// Hardware palette registers per type (sprite and background separately).
pub const PALETTES_PER_TYPE: usize = 8;

/// Colors per hardware palette.
pub const COLORS_PER_PALETTE: usize = 4;

/// Maximum value of one RGB555 color channel.
pub const COLOR_CHANNEL_MAX: u8 = 31;

/// Maximum packed RGB555 value (15 bits).
pub const COLOR_PACKED_MAX: u16 = 0x7FFF;

/// Tile slots in the video RAM tile bank.
pub const TILE_BANK_CAPACITY: u32 = 256;

/// Static working-RAM budget available to generated storage, in bytes.
pub const WRAM_BUDGET_BYTES: u32 = 4096;

/// WRAM usage at or above this draws a warning (~83% of the budget).
pub const WRAM_WARN_BYTES: u32 = 3400;

/// Bound on the A* working node array in generated search code.
pub const SEARCH_NODE_CAP: usize = 64;

/// Default bound on A* node expansions per search.
pub const SEARCH_MAX_EXPANSIONS: u32 = 128;

/// Capacity of the generated waypoint buffer; longer paths are "not found".
pub const WAYPOINT_CAP: usize = 32;

/// Concurrent tween slots in generated code.
pub const TWEEN_SLOT_CAP: usize = 8;

/// Entries in each generated easing lookup table.
pub const EASING_TABLE_LEN: usize = 256;

/// Fixed-point 8.8 scale factor.
pub const FIXED_POINT_ONE: i32 = 256;
