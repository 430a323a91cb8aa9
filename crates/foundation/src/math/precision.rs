//! Precision policies.
//!
//! Deterministic float ordering (`StableF64`) for sorting and keys, and an
//! approximate comparison used by the viewport snapping rules.

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

/// `true` when `a` and `b` differ by at most `eps`.
#[inline]
pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}

/// A float wrapper with a deterministic total ordering.
///
/// - Uses `f64::total_cmp` (after canonicalization) for `Ord`.
/// - Treats NaN as equal to NaN for `Eq` (after canonicalization), enabling
///   use in deterministic ordered structures and memo keys.
#[derive(Debug, Copy, Clone, Default)]
pub struct StableF64(pub f64);

impl PartialEq for StableF64 {
    fn eq(&self, other: &Self) -> bool {
        stable_total_cmp_f64(self.0, other.0) == Ordering::Equal
    }
}

impl Eq for StableF64 {}

impl PartialOrd for StableF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StableF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        stable_total_cmp_f64(self.0, other.0)
    }
}

impl std::hash::Hash for StableF64 {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        canonical_f64(self.0).to_bits().hash(state);
    }
}
