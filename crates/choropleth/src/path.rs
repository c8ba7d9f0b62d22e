//! Geometry to SVG path data under the current projection.

use formats::geometry::Geometry;
use foundation::math::{LiveTransform, Vec2};
use kurbo::{BezPath, Circle, Point, Shape};

/// Radius of the circle drawn for point geometry, in pixels.
pub const POINT_RADIUS: f64 = 4.5;

const CIRCLE_TOLERANCE: f64 = 0.1;

/// Projects planar geometry through a [`LiveTransform`] and emits path data.
///
/// Consecutive projected vertices closer than `min_segment_px` are merged, so the
/// detail kept follows the current zoom. A line always keeps its last vertex. A ring
/// that collapses to fewer than three vertices is dropped.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PathGenerator {
    transform: LiveTransform,
    min_segment_px: f64,
}

impl PathGenerator {
    pub fn new(transform: LiveTransform, min_segment_px: f64) -> Self {
        Self {
            transform,
            min_segment_px: min_segment_px.max(0.0),
        }
    }

    pub fn transform(&self) -> LiveTransform {
        self.transform
    }

    pub fn min_segment_px(&self) -> f64 {
        self.min_segment_px
    }

    /// SVG `d` attribute for `geometry`. Empty when nothing survives elision.
    pub fn path(&self, geometry: &Geometry) -> String {
        self.bez_path(geometry).to_svg()
    }

    pub fn bez_path(&self, geometry: &Geometry) -> BezPath {
        let mut path = BezPath::new();
        self.append(&mut path, geometry);
        path
    }

    fn append(&self, path: &mut BezPath, geometry: &Geometry) {
        match geometry {
            Geometry::Point(p) => self.point(path, *p),
            Geometry::MultiPoint(points) => {
                for p in points {
                    self.point(path, *p);
                }
            }
            Geometry::LineString(line) => self.line(path, line),
            Geometry::MultiLineString(lines) => {
                for line in lines {
                    self.line(path, line);
                }
            }
            Geometry::Polygon(rings) => {
                for ring in rings {
                    self.ring(path, ring);
                }
            }
            Geometry::MultiPolygon(polygons) => {
                for ring in polygons.iter().flatten() {
                    self.ring(path, ring);
                }
            }
            Geometry::GeometryCollection(members) => {
                for member in members {
                    self.append(path, member);
                }
            }
        }
    }

    fn project(&self, p: Vec2) -> Point {
        let q = self.transform.apply(p);
        Point::new(q.x, q.y)
    }

    fn point(&self, path: &mut BezPath, p: Vec2) {
        let circle = Circle::new(self.project(p), POINT_RADIUS);
        path.extend(circle.path_elements(CIRCLE_TOLERANCE));
    }

    fn line(&self, path: &mut BezPath, line: &[Vec2]) {
        let points = self.thin(line);
        if points.len() < 2 {
            return;
        }
        path.move_to(points[0]);
        for p in &points[1..] {
            path.line_to(*p);
        }
    }

    fn ring(&self, path: &mut BezPath, ring: &[Vec2]) {
        let open = match ring {
            [first, .., last] if first == last => &ring[..ring.len() - 1],
            _ => ring,
        };
        let points = self.thin(open);
        if points.len() < 3 {
            return;
        }
        path.move_to(points[0]);
        for p in &points[1..] {
            path.line_to(*p);
        }
        path.close_path();
    }

    fn thin(&self, points: &[Vec2]) -> Vec<Point> {
        let min_sq = self.min_segment_px * self.min_segment_px;
        let mut out: Vec<Point> = Vec::with_capacity(points.len());
        for (i, p) in points.iter().enumerate() {
            let q = self.project(*p);
            let keep = match out.last() {
                None => true,
                Some(prev) => i + 1 == points.len() || (q - *prev).hypot2() >= min_sq,
            };
            if keep {
                out.push(q);
            }
        }
        out
    }
}
