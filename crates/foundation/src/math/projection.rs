//! Planar fit projection: a uniform scale plus a translation.
//!
//! A planar point `p` maps to the viewport as `p * scale + translate`. The "fit"
//! functions derive that pair from bounds and a viewport; [`LiveTransform`] carries
//! the pair once the user starts zooming and panning.

use super::precision::finite_or;
use super::vec::Vec2;
use crate::bounds::Aabb2;

/// Share of the viewport the fitted bounds occupy along their tighter axis.
pub const DEFAULT_FILL_PROPORTION: f64 = 0.95;

/// What `fit_translate` should place at the center of the viewport.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum FitTarget {
    /// The midpoint of these bounds.
    Bounds(Aabb2),
    /// An explicit planar point (typically the output of [`recenter`]).
    Center(Vec2),
}

impl FitTarget {
    fn center(&self) -> Vec2 {
        match self {
            FitTarget::Bounds(b) => b.center(),
            FitTarget::Center(c) => *c,
        }
    }
}

/// Scale at which `bounds` fills `fill_proportion` of a `width` x `height` viewport.
///
/// A zero-extent axis is ignored so the other axis decides the scale. Missing or
/// fully collapsed bounds (empty input, a single point) fall back to
/// `fill_proportion` itself, so the result is always finite and positive as long as
/// `fill_proportion` is.
pub fn fit_scale(bounds: Option<&Aabb2>, width: f64, height: f64, fill_proportion: f64) -> f64 {
    let Some(b) = bounds else {
        return fill_proportion;
    };
    let ratio_x = axis_ratio(b.width(), width);
    let ratio_y = axis_ratio(b.height(), height);
    let ratio = ratio_x.max(ratio_y);
    if ratio <= 0.0 {
        return fill_proportion;
    }
    finite_or(fill_proportion / ratio, fill_proportion)
}

fn axis_ratio(extent: f64, viewport: f64) -> f64 {
    if !(extent > 0.0) || !(viewport > 0.0) {
        return 0.0;
    }
    finite_or(extent / viewport, 0.0)
}

/// Translation that puts the target's center at the middle of the viewport.
pub fn fit_translate(width: f64, height: f64, scale: f64, target: FitTarget) -> Vec2 {
    let c = target.center();
    Vec2::new(
        finite_or(width * 0.5 - scale * c.x, width * 0.5),
        finite_or(height * 0.5 - scale * c.y, height * 0.5),
    )
}

/// Inverse of [`fit_translate`]: the planar point currently shown at the viewport center.
pub fn recenter(width: f64, height: f64, scale: f64, translate: Vec2) -> Vec2 {
    if !(scale > 0.0) {
        return Vec2::ZERO;
    }
    Vec2::new(
        finite_or((width * 0.5 - translate.x) / scale, 0.0),
        finite_or((height * 0.5 - translate.y) / scale, 0.0),
    )
}

/// Fit scale and translate together. Missing bounds center the planar origin.
pub fn fit(bounds: Option<&Aabb2>, width: f64, height: f64, fill_proportion: f64) -> LiveTransform {
    let scale = fit_scale(bounds, width, height, fill_proportion);
    let target = match bounds {
        Some(b) => FitTarget::Bounds(*b),
        None => FitTarget::Center(Vec2::ZERO),
    };
    LiveTransform::new(scale, fit_translate(width, height, scale, target))
}

/// Current `{scale, translate}` pair, either freshly fitted or driven by the pointer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LiveTransform {
    pub scale: f64,
    pub translate: Vec2,
}

impl LiveTransform {
    pub fn new(scale: f64, translate: Vec2) -> Self {
        Self { scale, translate }
    }

    #[inline]
    pub fn apply(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            p.x * self.scale + self.translate.x,
            p.y * self.scale + self.translate.y,
        )
    }

    /// Viewport point back to planar space. Requires `scale > 0`.
    #[inline]
    pub fn invert(&self, p: Vec2) -> Vec2 {
        Vec2::new(
            (p.x - self.translate.x) / self.scale,
            (p.y - self.translate.y) / self.scale,
        )
    }

    /// Multiplies the scale by `factor`, keeping the planar point under `anchor` in place.
    pub fn zoomed(self, factor: f64, anchor: Vec2) -> Self {
        let fixed = self.invert(anchor);
        let scale = self.scale * factor;
        Self {
            scale,
            translate: Vec2::new(anchor.x - fixed.x * scale, anchor.y - fixed.y * scale),
        }
    }

    pub fn panned(self, delta: Vec2) -> Self {
        Self {
            scale: self.scale,
            translate: self.translate + delta,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.scale.is_finite() && self.scale > 0.0 && self.translate.is_finite()
    }
}
