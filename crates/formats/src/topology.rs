//! Decoding of the compressed topology interchange format.
//!
//! A topology stores every shared border once, as an "arc", and describes
//! geometries as sequences of arc references. Decoding resolves quantization up
//! front so arcs are held as absolute planar positions; geometry objects keep
//! their arc references and are only turned into coordinates on extraction.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use foundation::math::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Property holding the ids a geometry is in territorial dispute with.
pub const DISPUTES_PROPERTY: &str = "disputes";

/// Quantization parameters (`transform` member of the document).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantization {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

impl Quantization {
    #[inline]
    fn apply(&self, x: f64, y: f64) -> Vec2 {
        Vec2::new(
            x * self.scale[0] + self.translate[0],
            y * self.scale[1] + self.translate[1],
        )
    }
}

/// Arc reference: `i >= 0` is `arcs[i]`, `i < 0` is `arcs[!i]` reversed.
pub type ArcRef = i64;

#[derive(Debug, Clone, PartialEq)]
pub enum TopoShape {
    Collection(Vec<TopoObject>),
    Point(Vec2),
    MultiPoint(Vec<Vec2>),
    LineString(Vec<ArcRef>),
    MultiLineString(Vec<Vec<ArcRef>>),
    Polygon(Vec<Vec<ArcRef>>),
    MultiPolygon(Vec<Vec<Vec<ArcRef>>>),
    /// A member with `type: null`; carries properties but no geometry.
    Null,
}

/// One geometry object of a topology (possibly a collection of further objects).
#[derive(Debug, Clone, PartialEq)]
pub struct TopoObject {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    /// Parsed from `properties.disputes`; empty when absent.
    pub disputes: Vec<String>,
    pub shape: TopoShape,
}

impl TopoObject {
    pub fn is_disputed_with(&self, other: &TopoObject) -> bool {
        match &other.id {
            Some(id) => self.disputes.iter().any(|d| d == id),
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Topology {
    pub bbox: Option<Vec<f64>>,
    pub transform: Option<Quantization>,
    arcs: Vec<Vec<Vec2>>,
    pub objects: BTreeMap<String, TopoObject>,
}

#[derive(Debug)]
pub enum TopologyError {
    Io(std::io::Error),
    Json(serde_json::Error),
    NotATopology,
    InvalidArc { index: usize, reason: String },
    InvalidObject { name: String, reason: String },
}

impl std::fmt::Display for TopologyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopologyError::Io(e) => write!(f, "I/O error: {e}"),
            TopologyError::Json(e) => write!(f, "JSON parse error: {e}"),
            TopologyError::NotATopology => write!(f, "expected a Topology document"),
            TopologyError::InvalidArc { index, reason } => {
                write!(f, "invalid arc at index {index}: {reason}")
            }
            TopologyError::InvalidObject { name, reason } => {
                write!(f, "invalid object {name}: {reason}")
            }
        }
    }
}

impl std::error::Error for TopologyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TopologyError::Io(e) => Some(e),
            TopologyError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl Topology {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TopologyError> {
        let payload = fs::read_to_string(path).map_err(TopologyError::Io)?;
        Self::from_json_str(&payload)
    }

    pub fn from_json_str(payload: &str) -> Result<Self, TopologyError> {
        let value: Value = serde_json::from_str(payload).map_err(TopologyError::Json)?;
        Self::from_json_value(&value)
    }

    pub fn from_json_value(value: &Value) -> Result<Self, TopologyError> {
        let obj = value.as_object().ok_or(TopologyError::NotATopology)?;
        if obj.get("type").and_then(|v| v.as_str()) != Some("Topology") {
            return Err(TopologyError::NotATopology);
        }

        let transform = match obj.get("transform") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                serde_json::from_value::<Quantization>(v.clone()).map_err(TopologyError::Json)?,
            ),
        };

        let bbox = obj
            .get("bbox")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|n| n.as_f64()).collect());

        let arcs_val = obj
            .get("arcs")
            .and_then(|v| v.as_array())
            .ok_or(TopologyError::NotATopology)?;
        let mut arcs = Vec::with_capacity(arcs_val.len());
        for (index, arc) in arcs_val.iter().enumerate() {
            let arc = decode_arc(arc, transform.as_ref())
                .map_err(|reason| TopologyError::InvalidArc { index, reason })?;
            arcs.push(arc);
        }

        let objects_val = obj
            .get("objects")
            .and_then(|v| v.as_object())
            .ok_or(TopologyError::NotATopology)?;
        let mut objects = BTreeMap::new();
        for (name, v) in objects_val {
            let parsed = parse_object(v, transform.as_ref(), arcs.len()).map_err(|reason| {
                TopologyError::InvalidObject {
                    name: name.clone(),
                    reason,
                }
            })?;
            objects.insert(name.clone(), parsed);
        }

        Ok(Self {
            bbox,
            transform,
            arcs,
            objects,
        })
    }

    pub fn object(&self, name: &str) -> Option<&TopoObject> {
        self.objects.get(name)
    }

    pub fn arc_count(&self) -> usize {
        self.arcs.len()
    }

    /// Decoded positions of arc `index` (non-negative form).
    pub fn arc(&self, index: usize) -> Option<&[Vec2]> {
        self.arcs.get(index).map(Vec::as_slice)
    }

    /// Appends one referenced arc to `points`, dropping the shared junction point.
    pub fn push_arc(&self, arc: ArcRef, points: &mut Vec<Vec2>) {
        let Some(src) = self.arc(arc_index(arc)) else {
            return;
        };
        if !points.is_empty() {
            points.pop();
        }
        let start = points.len();
        points.extend_from_slice(src);
        if arc < 0 {
            points[start..].reverse();
        }
    }

    /// Concatenates arcs into one line.
    pub fn line(&self, arcs: &[ArcRef]) -> Vec<Vec2> {
        let mut points = Vec::new();
        for &a in arcs {
            self.push_arc(a, &mut points);
        }
        if points.len() < 2 {
            if let Some(&first) = points.first() {
                points.push(first);
            }
        }
        points
    }

    /// Concatenates arcs into a closed ring; rings are padded to at least four positions.
    pub fn ring(&self, arcs: &[ArcRef]) -> Vec<Vec2> {
        let mut points = self.line(arcs);
        if let Some(&first) = points.first() {
            while points.len() < 4 {
                points.push(first);
            }
        }
        points
    }
}

/// Index into the arc table for a possibly-reversed reference.
#[inline]
pub fn arc_index(arc: ArcRef) -> usize {
    if arc < 0 { !arc as usize } else { arc as usize }
}

fn decode_arc(value: &Value, transform: Option<&Quantization>) -> Result<Vec<Vec2>, String> {
    let positions = value
        .as_array()
        .ok_or("arc must be an array of positions".to_string())?;
    let mut out = Vec::with_capacity(positions.len());
    let (mut x, mut y) = (0.0, 0.0);
    for p in positions {
        let [px, py] = parse_pair(p)?;
        match transform {
            // Quantized arcs are delta-encoded.
            Some(t) => {
                x += px;
                y += py;
                out.push(t.apply(x, y));
            }
            None => out.push(Vec2::new(px, py)),
        }
    }
    Ok(out)
}

fn parse_pair(value: &Value) -> Result<[f64; 2], String> {
    let arr = value
        .as_array()
        .ok_or("position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [x, y]".to_string());
    }
    let x = arr[0].as_f64().ok_or("x must be a number".to_string())?;
    let y = arr[1].as_f64().ok_or("y must be a number".to_string())?;
    Ok([x, y])
}

fn parse_position(value: &Value, transform: Option<&Quantization>) -> Result<Vec2, String> {
    let [x, y] = parse_pair(value)?;
    Ok(match transform {
        Some(t) => t.apply(x, y),
        None => Vec2::new(x, y),
    })
}

fn parse_id(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_disputes(properties: &Map<String, Value>) -> Vec<String> {
    properties
        .get(DISPUTES_PROPERTY)
        .and_then(|v| v.as_array())
        .map(|ids| ids.iter().filter_map(|v| parse_id(Some(v))).collect())
        .unwrap_or_default()
}

fn parse_object(
    value: &Value,
    transform: Option<&Quantization>,
    arc_count: usize,
) -> Result<TopoObject, String> {
    let obj = value
        .as_object()
        .ok_or("geometry object must be an object".to_string())?;

    let id = parse_id(obj.get("id"));
    let properties = obj
        .get("properties")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();
    let disputes = parse_disputes(&properties);

    let ty = match obj.get("type") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => return Err("geometry type must be a string or null".to_string()),
    };

    let arcs = || {
        obj.get("arcs")
            .ok_or_else(|| format!("{} missing arcs", ty.unwrap_or("geometry")))
    };
    let coords = || {
        obj.get("coordinates")
            .ok_or_else(|| format!("{} missing coordinates", ty.unwrap_or("geometry")))
    };

    let shape = match ty {
        None => TopoShape::Null,
        Some("GeometryCollection") => {
            let members = obj
                .get("geometries")
                .and_then(|v| v.as_array())
                .ok_or("GeometryCollection missing geometries".to_string())?;
            let mut out = Vec::with_capacity(members.len());
            for (i, m) in members.iter().enumerate() {
                out.push(
                    parse_object(m, transform, arc_count)
                        .map_err(|reason| format!("geometries[{i}]: {reason}"))?,
                );
            }
            TopoShape::Collection(out)
        }
        Some("Point") => TopoShape::Point(parse_position(coords()?, transform)?),
        Some("MultiPoint") => {
            let ps = coords()?
                .as_array()
                .ok_or("MultiPoint coordinates must be an array".to_string())?;
            let mut out = Vec::with_capacity(ps.len());
            for p in ps {
                out.push(parse_position(p, transform)?);
            }
            TopoShape::MultiPoint(out)
        }
        Some("LineString") => TopoShape::LineString(parse_refs(arcs()?, arc_count)?),
        Some("MultiLineString") => TopoShape::MultiLineString(parse_refs2(arcs()?, arc_count)?),
        Some("Polygon") => TopoShape::Polygon(parse_refs2(arcs()?, arc_count)?),
        Some("MultiPolygon") => {
            let polys = arcs()?
                .as_array()
                .ok_or("MultiPolygon arcs must be an array".to_string())?;
            let mut out = Vec::with_capacity(polys.len());
            for p in polys {
                out.push(parse_refs2(p, arc_count)?);
            }
            TopoShape::MultiPolygon(out)
        }
        Some(other) => return Err(format!("unsupported geometry type: {other}")),
    };

    Ok(TopoObject {
        id,
        properties,
        disputes,
        shape,
    })
}

fn parse_refs(value: &Value, arc_count: usize) -> Result<Vec<ArcRef>, String> {
    let refs = value
        .as_array()
        .ok_or("arc references must be an array".to_string())?;
    let mut out = Vec::with_capacity(refs.len());
    for r in refs {
        let a = r
            .as_i64()
            .ok_or("arc reference must be an integer".to_string())?;
        if arc_index(a) >= arc_count {
            return Err(format!("arc reference {a} out of range ({arc_count} arcs)"));
        }
        out.push(a);
    }
    Ok(out)
}

fn parse_refs2(value: &Value, arc_count: usize) -> Result<Vec<Vec<ArcRef>>, String> {
    let lines = value
        .as_array()
        .ok_or("arc reference lists must be an array".to_string())?;
    let mut out = Vec::with_capacity(lines.len());
    for l in lines {
        out.push(parse_refs(l, arc_count)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::{TopoShape, Topology, TopologyError, arc_index};
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn decodes_quantized_delta_arcs() {
        let topo = Topology::from_json_value(&json!({
            "type": "Topology",
            "transform": {"scale": [0.5, 0.5], "translate": [10.0, 20.0]},
            "arcs": [[[0, 0], [2, 0], [0, 2]]],
            "objects": {
                "pin": {"type": "Point", "coordinates": [4, 6], "id": 3}
            }
        }))
        .unwrap();

        assert_eq!(
            topo.arc(0).unwrap(),
            &[
                Vec2::new(10.0, 20.0),
                Vec2::new(11.0, 20.0),
                Vec2::new(11.0, 21.0)
            ]
        );
        let pin = topo.object("pin").unwrap();
        assert_eq!(pin.id.as_deref(), Some("3"));
        // Point positions are quantized but not delta-encoded.
        assert_eq!(pin.shape, TopoShape::Point(Vec2::new(12.0, 23.0)));
    }

    #[test]
    fn reversed_references_walk_arcs_backwards() {
        let topo = Topology::from_json_value(&json!({
            "type": "Topology",
            "arcs": [[[0, 0], [1, 0]], [[1, 0], [1, 1]]],
            "objects": {}
        }))
        .unwrap();
        assert_eq!(arc_index(-1), 0);
        assert_eq!(arc_index(-2), 1);
        assert_eq!(
            topo.line(&[-2, -1]),
            vec![Vec2::new(1.0, 1.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 0.0)]
        );
    }

    #[test]
    fn reads_dispute_annotations_and_null_members() {
        let topo = Topology::from_json_value(&json!({
            "type": "Topology",
            "arcs": [],
            "objects": {
                "regions": {"type": "GeometryCollection", "geometries": [
                    {"type": null, "id": "x", "properties": {"disputes": ["y", 4]}}
                ]}
            }
        }))
        .unwrap();
        let TopoShape::Collection(members) = &topo.object("regions").unwrap().shape else {
            panic!("expected a collection");
        };
        assert_eq!(members[0].shape, TopoShape::Null);
        assert_eq!(members[0].disputes, vec!["y".to_string(), "4".to_string()]);
    }

    #[test]
    fn rejects_out_of_range_arc_references() {
        let err = Topology::from_json_value(&json!({
            "type": "Topology",
            "arcs": [[[0, 0], [1, 1]]],
            "objects": {"bad": {"type": "LineString", "arcs": [0, 1]}}
        }))
        .unwrap_err();
        assert!(matches!(err, TopologyError::InvalidObject { ref name, .. } if name == "bad"));
    }

    #[test]
    fn rejects_other_documents() {
        let err = Topology::from_json_value(&json!({"type": "FeatureCollection", "features": []}))
            .unwrap_err();
        assert!(matches!(err, TopologyError::NotATopology));
    }
}
