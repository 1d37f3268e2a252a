//! C identifier derivation.
//!
//! All generated names are derived from declaration names through one
//! sanitizer so the mapping is stable and collision-free by prefix:
//! `var_` / `arr_` for storage, `scene_` / `sm_` / `pool_` / `nav_` for
//! subsystem functions, upper-snake for enum constants.

/// Sanitize a declaration name into a C identifier fragment.
pub fn c_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push('_');
        }
    }
    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Upper-snake constant fragment.
pub fn c_const(name: &str) -> String {
    c_ident(name).to_ascii_uppercase()
}

pub fn var(name: &str) -> String {
    format!("var_{}", c_ident(name))
}

pub fn array(name: &str) -> String {
    format!("arr_{}", c_ident(name))
}

pub fn pool_field(pool: &str, field: &str) -> String {
    format!("pool_{}_{}", c_ident(pool), c_ident(field))
}

pub fn scene_const(name: &str) -> String {
    format!("SCENE_{}", c_const(name))
}

pub fn state_const(machine: &str, state: &str) -> String {
    format!("SM_{}_{}", c_const(machine), c_const(state))
}

pub fn anim_const(sprite: &str, animation: &str) -> String {
    format!("ANIM_{}_{}", c_const(sprite), c_const(animation))
}

pub fn easing_const(suffix: &str) -> String {
    format!("EASE_{}", suffix.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitizes_punctuation() {
        assert_eq!(c_ident("player-hp"), "player_hp");
        assert_eq!(c_ident("Boss Room"), "boss_room");
        assert_eq!(c_ident("2p"), "_2p");
    }

    #[test]
    fn test_prefixed_names() {
        assert_eq!(var("score"), "var_score");
        assert_eq!(array("inventory"), "arr_inventory");
        assert_eq!(pool_field("bullets", "dmg"), "pool_bullets_dmg");
        assert_eq!(scene_const("title"), "SCENE_TITLE");
        assert_eq!(state_const("boss", "idle"), "SM_BOSS_IDLE");
    }
}
