use std::sync::Arc;

use formats::topology::Topology;
use layers::layer::LayerSpec;

/// Three unit squares in a row, ids 1 to 3; region 1 disputes region 2.
pub(crate) fn three_regions() -> Arc<Topology> {
    let json = include_str!("../tests/fixtures/three_regions.json");
    Arc::new(Topology::from_json_str(json).unwrap())
}

pub(crate) fn regions_layers() -> Vec<LayerSpec> {
    vec![
        LayerSpec::feature("regions", "regions"),
        LayerSpec::mesh("borders", "regions"),
    ]
}
