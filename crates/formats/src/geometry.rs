use foundation::bounds::Aabb2;
use foundation::math::Vec2;
use serde_json::{Map, Value};

/// Planar geometry produced by decoding a topology.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Vec2),
    MultiPoint(Vec<Vec2>),
    LineString(Vec<Vec2>),
    MultiLineString(Vec<Vec<Vec2>>),
    Polygon(Vec<Vec<Vec2>>),
    MultiPolygon(Vec<Vec<Vec<Vec2>>>),
    GeometryCollection(Vec<Geometry>),
}

impl Geometry {
    /// Visits every position in storage order.
    pub fn for_each_position(&self, mut f: impl FnMut(Vec2)) {
        self.visit_positions(&mut f);
    }

    fn visit_positions(&self, f: &mut dyn FnMut(Vec2)) {
        match self {
            Geometry::Point(p) => f(*p),
            Geometry::MultiPoint(ps) | Geometry::LineString(ps) => ps.iter().for_each(|p| f(*p)),
            Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
                lines.iter().flatten().for_each(|p| f(*p))
            }
            Geometry::MultiPolygon(polys) => polys.iter().flatten().flatten().for_each(|p| f(*p)),
            Geometry::GeometryCollection(members) => {
                for m in members {
                    m.visit_positions(f);
                }
            }
        }
    }

    pub fn bounds(&self) -> Option<Aabb2> {
        let mut out: Option<Aabb2> = None;
        self.for_each_position(|p| match out.as_mut() {
            Some(b) => b.include(p),
            None => out = Some(Aabb2::from_point(p)),
        });
        out
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Point(_) => "Point",
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::LineString(_) => "LineString",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
            Geometry::GeometryCollection(_) => "GeometryCollection",
        }
    }

    /// Even-odd containment for areal geometry; lines and points never contain.
    pub fn contains(&self, p: Vec2) -> bool {
        match self {
            Geometry::Polygon(rings) => rings_contain(rings, p),
            Geometry::MultiPolygon(polys) => polys.iter().any(|rings| rings_contain(rings, p)),
            Geometry::GeometryCollection(members) => members.iter().any(|m| m.contains(p)),
            _ => false,
        }
    }
}

fn rings_contain(rings: &[Vec<Vec2>], p: Vec2) -> bool {
    // Holes flip parity, so every ring takes part in the crossing count.
    let mut inside = false;
    for ring in rings {
        let n = ring.len();
        if n < 3 {
            continue;
        }
        let mut j = n - 1;
        for i in 0..n {
            let (a, b) = (ring[i], ring[j]);
            if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
                inside = !inside;
            }
            j = i;
        }
    }
    inside
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    /// `None` for null-typed topology members.
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn bounds(&self) -> Option<Aabb2> {
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref().and_then(Geometry::bounds))
            .reduce(Aabb2::union)
    }

    /// Emits a GeoJSON FeatureCollection. Property ordering follows the source map.
    pub fn to_geojson_value(&self) -> Value {
        let mut root = Map::new();
        root.insert(
            "type".to_string(),
            Value::String("FeatureCollection".to_string()),
        );

        let mut features: Vec<Value> = Vec::with_capacity(self.features.len());
        for feat in &self.features {
            let mut fobj = Map::new();
            fobj.insert("type".to_string(), Value::String("Feature".to_string()));
            if let Some(id) = &feat.id {
                fobj.insert("id".to_string(), Value::String(id.clone()));
            }
            fobj.insert(
                "properties".to_string(),
                Value::Object(feat.properties.clone()),
            );
            fobj.insert(
                "geometry".to_string(),
                feat.geometry
                    .as_ref()
                    .map(geometry_to_geojson_value)
                    .unwrap_or(Value::Null),
            );
            features.push(Value::Object(fobj));
        }

        root.insert("features".to_string(), Value::Array(features));
        Value::Object(root)
    }
}

pub fn geometry_to_geojson_value(geom: &Geometry) -> Value {
    let mut obj = Map::new();
    obj.insert(
        "type".to_string(),
        Value::String(geom.type_name().to_string()),
    );
    if let Geometry::GeometryCollection(members) = geom {
        obj.insert(
            "geometries".to_string(),
            Value::Array(members.iter().map(geometry_to_geojson_value).collect()),
        );
        return Value::Object(obj);
    }

    let coords = match geom {
        Geometry::Point(p) => point_coords(p),
        Geometry::MultiPoint(ps) | Geometry::LineString(ps) => line_coords(ps),
        Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
            Value::Array(lines.iter().map(|l| line_coords(l)).collect())
        }
        Geometry::MultiPolygon(polys) => Value::Array(
            polys
                .iter()
                .map(|rings| Value::Array(rings.iter().map(|r| line_coords(r)).collect()))
                .collect(),
        ),
        Geometry::GeometryCollection(_) => Value::Null,
    };
    obj.insert("coordinates".to_string(), coords);
    Value::Object(obj)
}

fn line_coords(ps: &[Vec2]) -> Value {
    Value::Array(ps.iter().map(point_coords).collect())
}

fn point_coords(p: &Vec2) -> Value {
    Value::Array(vec![Value::from(p.x), Value::from(p.y)])
}
