//! Precision policies.
//!
//! This module is intentionally small and conservative. It provides:
//! - Deterministic float ordering (`stable_total_cmp_f64`) for sorting.
//! - Fixed-decimal rounding used when emitting coordinates as text.

use core::cmp::Ordering;

/// Canonicalize a floating-point value for deterministic ordering.
///
/// Rules:
/// - `-0.0` becomes `0.0`
/// - all NaNs become a single canonical NaN
pub fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        // Handles +0.0 and -0.0.
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// Deterministic total ordering for floats.
///
/// Prefer this any time you sort floats or use them in ordered keys.
pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    canonical_f64(a).total_cmp(&canonical_f64(b))
}

/// Rounds to `digits` decimal places and canonicalizes the result, so that
/// tiny negative values never print as `-0`.
pub fn round_to(v: f64, digits: u32) -> f64 {
    let m = 10f64.powi(digits as i32);
    canonical_f64((v * m).round() / m)
}

#[cfg(test)]
mod tests {
    use super::{canonical_f64, round_to, stable_total_cmp_f64};
    use core::cmp::Ordering;

    #[test]
    fn canonicalizes_negative_zero() {
        assert_eq!(canonical_f64(-0.0), 0.0);
        assert_eq!(canonical_f64(0.0), 0.0);
        assert!(round_to(-0.0001, 3).is_sign_positive());
    }

    #[test]
    fn stable_cmp_is_total_and_deterministic() {
        assert_eq!(stable_total_cmp_f64(1.0, 2.0), Ordering::Less);
        assert_eq!(stable_total_cmp_f64(f64::NAN, f64::NAN), Ordering::Equal);
        assert_eq!(stable_total_cmp_f64(-0.0, 0.0), Ordering::Equal);
    }

    #[test]
    fn rounds_to_fixed_digits() {
        assert_eq!(round_to(1.23456, 3), 1.235);
        assert_eq!(round_to(-2.0004, 3), -2.0);
    }
}
