//! Float guards for projection math.
//!
//! Projection results feed straight into rendered path strings, so `NaN`/`Infinity`
//! must be caught at the source rather than downstream.

/// Default tolerance for comparing projected quantities.
pub const EPSILON: f64 = 1e-9;

/// Returns `v` when it is finite, otherwise `fallback`.
#[inline]
pub fn finite_or(v: f64, fallback: f64) -> f64 {
    if v.is_finite() { v } else { fallback }
}

/// Relative/absolute closeness test used by fit and zoom-preservation checks.
pub fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    let diff = (a - b).abs();
    diff <= eps || diff <= eps * a.abs().max(b.abs())
}
