use crate::math::Vec2;

/// Axis-aligned bounding box in planar (pre-projection) or pixel space.
///
/// `min` is the top-left corner and `max` the bottom-right corner, matching the
/// `[[left, top], [right, bottom]]` convention used by path measurers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    pub fn from_point(p: Vec2) -> Self {
        Aabb2 {
            min: [p.x, p.y],
            max: [p.x, p.y],
        }
    }

    /// Smallest box covering every point, or `None` for an empty iterator.
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut out: Option<Aabb2> = None;
        for p in points {
            match out.as_mut() {
                Some(b) => b.include(p),
                None => out = Some(Aabb2::from_point(p)),
            }
        }
        out
    }

    pub fn include(&mut self, p: Vec2) {
        self.min[0] = self.min[0].min(p.x);
        self.min[1] = self.min[1].min(p.y);
        self.max[0] = self.max[0].max(p.x);
        self.max[1] = self.max[1].max(p.y);
    }

    pub fn union(self, other: Aabb2) -> Aabb2 {
        Aabb2 {
            min: [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            max: [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        }
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        )
    }

    /// True when either extent is zero (or not a usable number).
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb2;
    use crate::math::Vec2;

    #[test]
    fn from_points_covers_all_inputs() {
        let b = Aabb2::from_points([
            Vec2::new(1.0, 5.0),
            Vec2::new(-2.0, 3.0),
            Vec2::new(4.0, -1.0),
        ])
        .unwrap();
        assert_eq!(b, Aabb2::new([-2.0, -1.0], [4.0, 5.0]));
        assert_eq!(b.center(), Vec2::new(1.0, 2.0));
    }

    #[test]
    fn empty_input_has_no_bounds() {
        assert_eq!(Aabb2::from_points(std::iter::empty()), None);
    }

    #[test]
    fn flat_boxes_are_degenerate() {
        assert!(Aabb2::new([0.0, 1.0], [3.0, 1.0]).is_degenerate());
        assert!(Aabb2::from_point(Vec2::new(2.0, 2.0)).is_degenerate());
        assert!(!Aabb2::new([0.0, 0.0], [1.0, 1.0]).is_degenerate());
    }

    #[test]
    fn union_is_the_covering_box() {
        let a = Aabb2::new([0.0, 0.0], [1.0, 1.0]);
        let b = Aabb2::new([2.0, -1.0], [3.0, 0.5]);
        assert_eq!(a.union(b), Aabb2::new([0.0, -1.0], [3.0, 1.0]));
    }
}
