use formats::geometry::Geometry;
use foundation::math::Vec2;

/// A feature path as painted, with its planar geometry.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickTarget<'a> {
    pub location_id: Option<&'a str>,
    pub geometry: &'a Geometry,
}

/// Topmost feature containing `point` (planar coordinates).
///
/// Ordering contract:
/// - `targets` must be in paint order; the last painted hit wins.
/// - Targets without a location id are never returned, but they still occlude
///   what lies underneath them.
pub fn pick_topmost<'a>(targets: &[PickTarget<'a>], point: Vec2) -> Option<&'a str> {
    targets
        .iter()
        .rev()
        .find(|t| t.geometry.contains(point))
        .and_then(|t| t.location_id)
}

#[cfg(test)]
mod tests {
    use super::{PickTarget, pick_topmost};
    use formats::geometry::Geometry;
    use foundation::math::Vec2;

    fn square(x0: f64, y0: f64, size: f64) -> Geometry {
        Geometry::Polygon(vec![vec![
            Vec2::new(x0, y0),
            Vec2::new(x0 + size, y0),
            Vec2::new(x0 + size, y0 + size),
            Vec2::new(x0, y0 + size),
            Vec2::new(x0, y0),
        ]])
    }

    #[test]
    fn last_painted_hit_wins() {
        let below = square(0.0, 0.0, 4.0);
        let above = square(1.0, 1.0, 1.0);
        let targets = [
            PickTarget {
                location_id: Some("below"),
                geometry: &below,
            },
            PickTarget {
                location_id: Some("above"),
                geometry: &above,
            },
        ];
        assert_eq!(pick_topmost(&targets, Vec2::new(1.5, 1.5)), Some("above"));
        assert_eq!(pick_topmost(&targets, Vec2::new(3.5, 3.5)), Some("below"));
        assert_eq!(pick_topmost(&targets, Vec2::new(9.0, 9.0)), None);
    }

    #[test]
    fn anonymous_features_occlude() {
        let below = square(0.0, 0.0, 4.0);
        let above = square(0.0, 0.0, 4.0);
        let targets = [
            PickTarget {
                location_id: Some("below"),
                geometry: &below,
            },
            PickTarget {
                location_id: None,
                geometry: &above,
            },
        ];
        assert_eq!(pick_topmost(&targets, Vec2::new(1.0, 1.0)), None);
    }
}
