//! Geometry extraction from a shared topology.
//!
//! `feature` turns an object into polygons, `mesh` turns it into its border network,
//! and `extract` does either for a whole layer list. None of these mutate the topology.

use std::collections::BTreeMap;
use std::sync::Arc;

use formats::geometry::{Feature, FeatureCollection, Geometry};
use formats::topology::{ArcRef, TopoObject, TopoShape, Topology, arc_index};
use foundation::bounds::Aabb2;
use foundation::math::Vec2;
use tracing::debug;

use crate::layer::{LayerKind, LayerSpec};
use crate::predicates::PredicateEngine;

/// Extracted geometry per layer name, split by kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedLayers {
    pub feature: BTreeMap<String, Arc<FeatureCollection>>,
    /// Always `Geometry::MultiLineString`.
    pub mesh: BTreeMap<String, Arc<Geometry>>,
}

impl ExtractedLayers {
    pub fn len(&self) -> usize {
        self.feature.len() + self.mesh.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feature.is_empty() && self.mesh.is_empty()
    }

    pub fn contains(&self, kind: LayerKind, name: &str) -> bool {
        match kind {
            LayerKind::Feature => self.feature.contains_key(name),
            LayerKind::Mesh => self.mesh.contains_key(name),
        }
    }

    /// Shallow merge: entries of `other` replace same-named entries here.
    pub fn merge(&mut self, other: ExtractedLayers) {
        self.feature.extend(other.feature);
        self.mesh.extend(other.mesh);
    }
}

/// Extracts every layer whose object exists in the topology.
///
/// Layers naming a missing object are skipped without error and contribute nothing.
pub fn extract(
    topology: &Topology,
    layers: &[LayerSpec],
    predicates: &PredicateEngine,
) -> ExtractedLayers {
    let mut out = ExtractedLayers::default();
    for layer in layers {
        let Some(object) = topology.object(&layer.object) else {
            debug!(
                layer = %layer.name,
                object = %layer.object,
                "layer object missing from topology; skipping"
            );
            continue;
        };
        match layer.kind {
            LayerKind::Feature => {
                out.feature
                    .insert(layer.name.clone(), Arc::new(feature(topology, object)));
            }
            LayerKind::Mesh => {
                let filter = predicates.predicate(layer.mesh_filter());
                let geometry = mesh(topology, object, filter.as_deref());
                out.mesh.insert(layer.name.clone(), Arc::new(geometry));
            }
        }
    }
    out
}

/// Combined bounds of every extracted feature collection and mesh, measured in
/// planar (unprojected) space. `None` when nothing has any position.
pub fn combined_bounds(extracted: &ExtractedLayers) -> Option<Aabb2> {
    let features = extracted.feature.values().filter_map(|fc| fc.bounds());
    let meshes = extracted.mesh.values().filter_map(|m| m.bounds());
    features.chain(meshes).reduce(Aabb2::union)
}

/// Converts an object into a feature collection: one feature per collection member,
/// or a single feature for any other object.
pub fn feature(topology: &Topology, object: &TopoObject) -> FeatureCollection {
    let features = match &object.shape {
        TopoShape::Collection(members) => members
            .iter()
            .map(|m| to_feature(topology, m))
            .collect(),
        _ => vec![to_feature(topology, object)],
    };
    FeatureCollection { features }
}

fn to_feature(topology: &Topology, object: &TopoObject) -> Feature {
    Feature {
        id: object.id.clone(),
        properties: object.properties.clone(),
        geometry: to_geometry(topology, &object.shape),
    }
}

fn polygon(topology: &Topology, rings: &[Vec<ArcRef>]) -> Vec<Vec<Vec2>> {
    rings.iter().map(|r| topology.ring(r)).collect()
}

fn to_geometry(topology: &Topology, shape: &TopoShape) -> Option<Geometry> {
    Some(match shape {
        TopoShape::Null => return None,
        TopoShape::Point(p) => Geometry::Point(*p),
        TopoShape::MultiPoint(ps) => Geometry::MultiPoint(ps.clone()),
        TopoShape::LineString(arcs) => Geometry::LineString(topology.line(arcs)),
        TopoShape::MultiLineString(lines) => {
            Geometry::MultiLineString(lines.iter().map(|l| topology.line(l)).collect())
        }
        TopoShape::Polygon(rings) => Geometry::Polygon(polygon(topology, rings)),
        TopoShape::MultiPolygon(polys) => {
            Geometry::MultiPolygon(polys.iter().map(|p| polygon(topology, p)).collect())
        }
        TopoShape::Collection(members) => Geometry::GeometryCollection(
            members
                .iter()
                .filter_map(|m| to_geometry(topology, &m.shape))
                .collect(),
        ),
    })
}

type MeshFilterFn<'f> = &'f (dyn Fn(&TopoObject, &TopoObject) -> bool + Send + Sync);

/// Builds the border network of `object` as a multi-line-string.
///
/// Each arc is tested once: an arc used by a single geometry as `filter(g, g)`, a
/// shared arc as `filter(first, last)` in traversal order. Accepted arcs become one
/// line each, ordered by arc index. Without a filter every arc is kept.
pub fn mesh(
    topology: &Topology,
    object: &TopoObject,
    filter: Option<MeshFilterFn<'_>>,
) -> Geometry {
    let mut by_arc: Vec<Vec<(ArcRef, &TopoObject)>> = vec![Vec::new(); topology.arc_count()];
    collect_arcs(object, &mut by_arc);

    let mut lines = Vec::new();
    for geoms in &by_arc {
        let (Some(&(first_ref, first)), Some(&(_, last))) = (geoms.first(), geoms.last()) else {
            continue;
        };
        let keep = match filter {
            Some(f) => f(first, last),
            None => true,
        };
        if keep {
            lines.push(topology.line(&[first_ref]));
        }
    }
    Geometry::MultiLineString(lines)
}

fn collect_arcs<'a>(object: &'a TopoObject, by_arc: &mut [Vec<(ArcRef, &'a TopoObject)>]) {
    if let TopoShape::Collection(members) = &object.shape {
        for m in members {
            collect_arcs(m, by_arc);
        }
        return;
    }
    let mut push = |arcs: &[ArcRef]| {
        for &a in arcs {
            if let Some(slot) = by_arc.get_mut(arc_index(a)) {
                slot.push((a, object));
            }
        }
    };
    match &object.shape {
        TopoShape::LineString(arcs) => push(arcs),
        TopoShape::MultiLineString(lines) | TopoShape::Polygon(lines) => {
            lines.iter().for_each(|l| push(l))
        }
        TopoShape::MultiPolygon(polys) => polys.iter().flatten().for_each(|r| push(r)),
        TopoShape::Collection(_)
        | TopoShape::Point(_)
        | TopoShape::MultiPoint(_)
        | TopoShape::Null => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::MeshFilter;
    use crate::test_support::three_squares;
    use pretty_assertions::assert_eq;
    use scene::selection::SelectionSet;

    #[test]
    fn feature_rings_close_across_shared_arcs() {
        let topo = three_squares(&[]);
        let fc = feature(&topo, topo.object("regions").unwrap());
        assert_eq!(fc.len(), 3);
        assert_eq!(fc.features[1].id.as_deref(), Some("2"));
        assert_eq!(
            fc.features[1].geometry,
            Some(Geometry::Polygon(vec![vec![
                Vec2::new(1.0, 0.0),
                Vec2::new(2.0, 0.0),
                Vec2::new(2.0, 1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(1.0, 0.0),
            ]]))
        );
    }

    #[test]
    fn unfiltered_mesh_keeps_every_arc_once() {
        let topo = three_squares(&[]);
        let Geometry::MultiLineString(lines) = mesh(&topo, topo.object("regions").unwrap(), None)
        else {
            panic!("mesh must be a multi-line-string");
        };
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], vec![Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0)]);
    }

    #[test]
    fn filtered_mesh_sees_shared_and_outer_arcs() {
        let topo = three_squares(&[]);
        let regions = topo.object("regions").unwrap();

        let interior = |a: &TopoObject, b: &TopoObject| !std::ptr::eq(a, b);
        let Geometry::MultiLineString(lines) = mesh(&topo, regions, Some(&interior)) else {
            panic!("mesh must be a multi-line-string");
        };
        assert_eq!(lines.len(), 2);

        let exterior = |a: &TopoObject, b: &TopoObject| std::ptr::eq(a, b);
        let Geometry::MultiLineString(lines) = mesh(&topo, regions, Some(&exterior)) else {
            panic!("mesh must be a multi-line-string");
        };
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn extract_skips_missing_objects_and_applies_filters() {
        let topo = three_squares(&["2"]);
        let layers = [
            LayerSpec::feature("land", "regions"),
            LayerSpec::mesh("disputed", "regions").with_filter(MeshFilter::Disputed),
            LayerSpec::feature("lakes", "no-such-object"),
        ];
        let predicates = PredicateEngine::new(SelectionSet::new());
        let out = extract(&topo, &layers, &predicates);

        assert_eq!(out.len(), 2);
        assert!(!out.contains(LayerKind::Feature, "lakes"));
        let Geometry::MultiLineString(lines) = out.mesh["disputed"].as_ref() else {
            panic!("mesh must be a multi-line-string");
        };
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn extraction_is_idempotent() {
        let topo = three_squares(&["2"]);
        let layers = [
            LayerSpec::feature("land", "regions"),
            LayerSpec::mesh("borders", "regions"),
        ];
        let predicates = PredicateEngine::default();
        assert_eq!(
            extract(&topo, &layers, &predicates),
            extract(&topo, &layers, &predicates)
        );
    }

    #[test]
    fn combined_bounds_cover_features_and_meshes() {
        let topo = three_squares(&[]);
        let layers = [LayerSpec::mesh("borders", "regions")];
        let out = extract(&topo, &layers, &PredicateEngine::default());
        assert_eq!(
            combined_bounds(&out),
            Some(Aabb2::new([0.0, 0.0], [3.0, 1.0]))
        );
        assert_eq!(combined_bounds(&ExtractedLayers::default()), None);
    }
}
