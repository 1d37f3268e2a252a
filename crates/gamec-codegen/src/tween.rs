//! Tween and easing emitter.
//!
//! For every easing kind actually referenced anywhere in the game, one
//! 256-entry fixed-point lookup table is emitted (unused kinds cost zero
//! ROM). Table values are 8.8 fixed point: `round(curve(i/255) * 256)`.
//! The runtime interpolates with signed arithmetic, so decreasing tweens
//! need no special case, and runs a fixed array of concurrent slots; a
//! start request with no free slot sets `tween_overflow_flag` and is
//! dropped.

use std::collections::BTreeSet;

use gamec_ir::game::Game;
use gamec_ir::ir::{visit_stmts, Easing, StmtKind};
use gamec_ir::limits::{EASING_TABLE_LEN, TWEEN_SLOT_CAP};

use crate::names;
use crate::writer::CWriter;

/// Every easing kind referenced by any tween statement, in a stable order.
pub fn used_easings(game: &Game) -> BTreeSet<Easing> {
    let mut used = BTreeSet::new();
    for hook in game.hooks() {
        visit_stmts(hook.stmts, &mut |stmt| {
            if let StmtKind::Tween(tween) = &stmt.kind {
                used.insert(tween.easing);
            }
        });
    }
    used
}

/// Sample an easing curve at `t` in [0, 1].
fn curve(easing: Easing, t: f64) -> f64 {
    match easing {
        Easing::Linear => t,
        Easing::QuadIn => t * t,
        Easing::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
        Easing::QuadInOut => {
            if t < 0.5 {
                2.0 * t * t
            } else {
                1.0 - 2.0 * (1.0 - t) * (1.0 - t)
            }
        }
        Easing::CubicIn => t * t * t,
        Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
        Easing::Bounce => {
            let n1 = 7.5625;
            let d1 = 2.75;
            if t < 1.0 / d1 {
                n1 * t * t
            } else if t < 2.0 / d1 {
                let t = t - 1.5 / d1;
                n1 * t * t + 0.75
            } else if t < 2.5 / d1 {
                let t = t - 2.25 / d1;
                n1 * t * t + 0.9375
            } else {
                let t = t - 2.625 / d1;
                n1 * t * t + 0.984375
            }
        }
    }
}

/// The full 8.8 fixed-point table for one easing kind.
pub fn table_values(easing: Easing) -> Vec<u16> {
    (0..EASING_TABLE_LEN)
        .map(|i| {
            let t = i as f64 / (EASING_TABLE_LEN - 1) as f64;
            let v = (curve(easing, t) * 256.0).round();
            v.clamp(0.0, 65535.0) as u16
        })
        .collect()
}

/// Emit the easing id constants and one lookup table per used kind.
pub fn emit_easing_tables(used: &BTreeSet<Easing>, w: &mut CWriter) {
    for (id, easing) in used.iter().enumerate() {
        w.line(format!(
            "#define {} {id}",
            names::easing_const(easing.c_suffix())
        ));
    }
    for easing in used {
        w.blank();
        w.line(format!(
            "static const uint16_t ease_{}[{EASING_TABLE_LEN}] = {{",
            easing.c_suffix()
        ));
        let values = table_values(*easing);
        for chunk in values.chunks(8) {
            let row: Vec<String> = chunk.iter().map(|v| format!("{v:5}")).collect();
            w.line(format!("    {},", row.join(", ")));
        }
        w.line("};");
    }
    w.blank();
    let refs: Vec<String> = used
        .iter()
        .map(|e| format!("ease_{}", e.c_suffix()))
        .collect();
    w.line(format!(
        "static const uint16_t *const ease_tables[{}] = {{ {} }};",
        used.len(),
        refs.join(", ")
    ));
}

/// Emit the tween slot storage and the start/update runtime.
pub fn emit_tween_runtime(w: &mut CWriter) {
    w.line("typedef struct {");
    w.line("    void    *target;");
    w.line("    int16_t  from;");
    w.line("    int16_t  to;");
    w.line("    uint16_t frame;");
    w.line("    uint16_t duration;");
    w.line("    uint8_t  easing;");
    w.line("    uint8_t  flags; /* bit0 active, bit1 16-bit target */");
    w.line("} tween_t;");
    w.blank();
    w.line(format!("static tween_t tweens[{TWEEN_SLOT_CAP}];"));
    w.line("static uint8_t tween_overflow_flag;");
    w.blank();

    w.open(
        "static void tween_store(tween_t *t, int16_t value)",
    );
    w.open("if (t->flags & 2)");
    w.line("*(int16_t *)t->target = value;");
    w.else_arm();
    w.line("*(uint8_t *)t->target = (uint8_t)value;");
    w.close();
    w.close();
    w.blank();

    w.open(
        "void tween_start(void *target, uint8_t wide, int16_t from, int16_t to, \
         uint16_t duration, uint8_t easing)",
    );
    w.line("uint8_t i;");
    w.open(format!("for (i = 0; i < {TWEEN_SLOT_CAP}; i++)"));
    w.open("if (!(tweens[i].flags & 1))");
    w.line("tweens[i].target = target;");
    w.line("tweens[i].from = from;");
    w.line("tweens[i].to = to;");
    w.line("tweens[i].frame = 0;");
    w.line("tweens[i].duration = duration;");
    w.line("tweens[i].easing = easing;");
    w.line("tweens[i].flags = (uint8_t)(1u | (wide ? 2u : 0u));");
    w.line("tween_store(&tweens[i], from);");
    w.line("return;");
    w.close();
    w.close();
    w.line("tween_overflow_flag = 1;");
    w.close();
    w.blank();

    w.open("void tween_update(void)");
    w.line("uint8_t i;");
    w.open(format!("for (i = 0; i < {TWEEN_SLOT_CAP}; i++)"));
    w.line("tween_t *t = &tweens[i];");
    w.line("uint16_t progress;");
    w.line("int32_t span;");
    w.line("int16_t value;");
    w.open("if (!(t->flags & 1))");
    w.line("continue;");
    w.close();
    w.line("t->frame++;");
    w.open("if (t->frame >= t->duration)");
    w.line("tween_store(t, t->to);");
    w.line("t->flags = 0;");
    w.line("continue;");
    w.close();
    w.line("progress = (uint16_t)(((uint32_t)t->frame * 256u) / t->duration);");
    w.open("if (progress > 255)");
    w.line("progress = 255;");
    w.close();
    w.line("span = (int32_t)t->to - (int32_t)t->from;");
    w.line("value = (int16_t)((int32_t)t->from + ((span * (int32_t)ease_tables[t->easing][progress]) >> 8));");
    w.line("tween_store(t, value);");
    w.close();
    w.close();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::QuadIn,
            Easing::QuadOut,
            Easing::QuadInOut,
            Easing::CubicIn,
            Easing::CubicOut,
            Easing::Bounce,
        ] {
            let values = table_values(easing);
            assert_eq!(values.len(), EASING_TABLE_LEN);
            assert_eq!(values[0], 0, "{easing:?} must start at 0");
            assert_eq!(values[255], 256, "{easing:?} must end at one (8.8)");
        }
    }

    #[test]
    fn test_linear_is_monotonic() {
        let values = table_values(Easing::Linear);
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        // 51 / 255 is exactly 0.2, so the 8.8 sample is exact.
        assert_eq!(values[51], 51);
    }

    #[test]
    fn test_quad_in_lags_linear() {
        let quad = table_values(Easing::QuadIn);
        let linear = table_values(Easing::Linear);
        // Strictly below linear in the interior of the curve.
        assert!(quad[64] < linear[64]);
        assert!(quad[192] < linear[192]);
    }
}
