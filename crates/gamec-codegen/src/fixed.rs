//! Fixed-point 8.8 conversion.
//!
//! The target hardware has no floating-point unit. Every world magnitude
//! that needs fractional precision is a signed 16-bit value scaled by 256.
//! Floating configuration inputs are converted exactly once, at generation
//! time; the generated C only ever sees integers.

use gamec_ir::limits::FIXED_POINT_ONE;

/// Convert a float to signed 8.8 fixed point: `round(value * 256)`,
/// saturated to the 16-bit signed range.
pub fn to_fixed(value: f32) -> i16 {
    let scaled = (f64::from(value) * f64::from(FIXED_POINT_ONE)).round();
    if scaled >= f64::from(i16::MAX) {
        i16::MAX
    } else if scaled <= f64::from(i16::MIN) {
        i16::MIN
    } else {
        scaled as i16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_values() {
        assert_eq!(to_fixed(0.0), 0);
        assert_eq!(to_fixed(1.0), 256);
        assert_eq!(to_fixed(-2.0), -512);
    }

    #[test]
    fn test_fractions_round() {
        assert_eq!(to_fixed(0.5), 128);
        assert_eq!(to_fixed(0.25), 64);
        assert_eq!(to_fixed(1.5), 384);
        // 0.001 * 256 = 0.256, rounds to 0
        assert_eq!(to_fixed(0.001), 0);
        // 0.002 * 256 = 0.512, rounds to 1
        assert_eq!(to_fixed(0.002), 1);
    }

    #[test]
    fn test_saturation() {
        assert_eq!(to_fixed(1000.0), i16::MAX);
        assert_eq!(to_fixed(-1000.0), i16::MIN);
        assert_eq!(to_fixed(127.996), 32767);
    }
}
