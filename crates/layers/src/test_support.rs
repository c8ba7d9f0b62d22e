use formats::topology::Topology;
use serde_json::json;

/// Three unit squares in a row (ids 1, 2, 3). Arc 0 is shared by 1|2 and arc 1 by 2|3;
/// the remaining four arcs are outer boundaries.
pub(crate) fn three_squares(disputes_of_1: &[&str]) -> Topology {
    Topology::from_json_value(&json!({
        "type": "Topology",
        "arcs": [
            [[1, 0], [1, 1]],
            [[2, 0], [2, 1]],
            [[1, 1], [0, 1], [0, 0], [1, 0]],
            [[1, 0], [2, 0]],
            [[2, 1], [1, 1]],
            [[2, 0], [3, 0], [3, 1], [2, 1]]
        ],
        "objects": {
            "regions": {"type": "GeometryCollection", "geometries": [
                {"type": "Polygon", "id": 1, "arcs": [[2, 0]],
                 "properties": {"disputes": disputes_of_1}},
                {"type": "Polygon", "id": 2, "arcs": [[3, 1, 4, -1]]},
                {"type": "Polygon", "id": 3, "arcs": [[5, -2]]}
            ]}
        }
    }))
    .unwrap()
}
