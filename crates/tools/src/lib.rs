//! Building blocks of the `atlas` command line tool.

use std::sync::Arc;

use choropleth::{InteractiveMap, MapConfig, MapError, MapEvent};
use formats::geometry::{Feature, FeatureCollection};
use formats::topology::Topology;
use foundation::math::Vec2;
use layers::extract::extract;
use layers::layer::{LayerKind, LayerSpec, MeshFilter};
use layers::predicates::PredicateEngine;
use scene::selection::SelectionSet;
use serde_json::{Map, Value};

/// Parses `NAME:OBJECT[:KIND[:FILTER]]`.
pub fn parse_layer(arg: &str) -> Result<LayerSpec, String> {
    let parts: Vec<&str> = arg.split(':').collect();
    let (name, object) = match parts.as_slice() {
        [name, object, ..] if !name.is_empty() && !object.is_empty() => (*name, *object),
        _ => return Err(format!("layer {arg:?}: expected NAME:OBJECT[:KIND[:FILTER]]")),
    };
    if parts.len() > 4 {
        return Err(format!("layer {arg:?}: too many fields"));
    }
    let kind = parts.get(2).map_or(LayerKind::Feature, |k| LayerKind::parse(k));
    let mut layer = LayerSpec::new(name, object, kind);
    if let Some(filter) = parts.get(3) {
        let filter = MeshFilter::parse(filter)
            .ok_or_else(|| format!("layer {arg:?}: unknown filter {filter:?}"))?;
        if kind != LayerKind::Mesh {
            return Err(format!("layer {arg:?}: filters apply to mesh layers only"));
        }
        layer = layer.with_filter(filter);
    }
    Ok(layer)
}

/// One feature layer per topology object, named after the object.
pub fn default_layers(topology: &Topology) -> Vec<LayerSpec> {
    topology
        .objects
        .keys()
        .map(|name| LayerSpec::feature(name.clone(), name.clone()))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub width: f64,
    pub height: f64,
    pub selection: Vec<String>,
    pub zoom: Option<f64>,
}

pub fn render_svg(
    config: MapConfig,
    topology: Arc<Topology>,
    layers: Vec<LayerSpec>,
    options: &RenderOptions,
) -> Result<String, MapError> {
    let mut map = InteractiveMap::mount(config, topology, layers, options.width, options.height)?;
    if !options.selection.is_empty() {
        let selection: SelectionSet = options.selection.iter().cloned().collect();
        map.apply(MapEvent::SelectionChanged(selection))?;
    }
    if let Some(factor) = options.zoom {
        let anchor = Vec2::new(options.width * 0.5, options.height * 0.5);
        map.apply(MapEvent::Zoom { factor, anchor })?;
    }
    Ok(map.render_svg().unwrap_or_default())
}

/// `{layer name: FeatureCollection}`. A mesh becomes a single-feature collection.
pub fn extract_geojson(topology: &Topology, layers: &[LayerSpec]) -> Value {
    let extracted = extract(topology, layers, &PredicateEngine::default());
    let mut out = Map::new();
    for (name, fc) in &extracted.feature {
        out.insert(name.clone(), fc.to_geojson_value());
    }
    for (name, mesh) in &extracted.mesh {
        let fc = FeatureCollection {
            features: vec![Feature {
                id: None,
                properties: Map::new(),
                geometry: Some(mesh.as_ref().clone()),
            }],
        };
        out.insert(name.clone(), fc.to_geojson_value());
    }
    Value::Object(out)
}
