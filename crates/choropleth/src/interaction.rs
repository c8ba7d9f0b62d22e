//! Pointer hit-testing and caller callbacks for feature paths.

use foundation::math::Vec2;
use layers::layer::LayerKind;
use scene::picking::{PickTarget, pick_topmost};

use crate::render::feature_order;
use crate::state::MapState;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Click,
    Hover,
    Drag,
}

/// A pointer event in viewport pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub position: Vec2,
}

/// Receives pointer events that land on a feature path.
pub trait FeatureHandler {
    fn handle(&mut self, event: &PointerEvent, location_id: &str);
}

impl<F> FeatureHandler for F
where
    F: FnMut(&PointerEvent, &str),
{
    fn handle(&mut self, event: &PointerEvent, location_id: &str) {
        self(event, location_id)
    }
}

/// Location id of the topmost visible feature under the viewport `point`.
///
/// Features are tested in reverse paint order, so a selected feature wins over the
/// siblings it is drawn on top of. Mesh layers are never hit.
pub fn pick(state: &MapState, point: Vec2) -> Option<&str> {
    let live = state.transform()?;
    let planar = live.invert(point);
    let selection = state.selection();

    let mut targets = Vec::new();
    let feature_layers = state
        .layers()
        .iter()
        .filter(|l| l.visible && l.kind == LayerKind::Feature);
    for layer in feature_layers {
        let Some(fc) = state.cache().feature(&layer.name) else {
            continue;
        };
        for i in feature_order(fc, selection) {
            let feature = &fc.features[i];
            if let Some(geometry) = &feature.geometry {
                targets.push(PickTarget {
                    location_id: feature.id.as_deref(),
                    geometry,
                });
            }
        }
    }
    pick_topmost(&targets, planar)
}

/// Forwards a pointer event to `handler` when it lands on a feature.
/// Returns whether the handler was called.
pub fn dispatch(
    state: &MapState,
    kind: PointerKind,
    point: Vec2,
    handler: &mut dyn FeatureHandler,
) -> bool {
    let Some(id) = pick(state, point) else {
        return false;
    };
    handler.handle(&PointerEvent { kind, position: point }, id);
    true
}

#[cfg(test)]
mod tests {
    use super::{PointerEvent, PointerKind, dispatch, pick};
    use crate::map::InteractiveMap;
    use crate::test_support::{regions_layers, three_regions};
    use crate::{MapConfig, MapEvent};
    use foundation::math::Vec2;
    use layers::layer::LayerSpec;
    use pretty_assertions::assert_eq;

    fn mounted() -> InteractiveMap {
        InteractiveMap::mount(
            MapConfig::default(),
            three_regions(),
            regions_layers(),
            960.0,
            500.0,
        )
        .unwrap()
    }

    #[test]
    fn picks_feature_under_viewport_point() {
        let map = mounted();
        // scale 304, translate (24, 98): region 2 spans x in [328, 632].
        assert_eq!(pick(map.state(), Vec2::new(480.0, 250.0)), Some("2"));
        assert_eq!(pick(map.state(), Vec2::new(100.0, 250.0)), Some("1"));
        assert_eq!(pick(map.state(), Vec2::new(480.0, 20.0)), None);
    }

    #[test]
    fn picking_follows_the_live_transform() {
        let mut map = mounted();
        map.apply(MapEvent::Pan {
            delta: Vec2::new(304.0, 0.0),
        })
        .unwrap();
        assert_eq!(pick(map.state(), Vec2::new(480.0, 250.0)), Some("1"));
    }

    #[test]
    fn handlers_receive_event_and_location() {
        let map = mounted();
        let mut seen: Vec<(PointerEvent, String)> = Vec::new();
        let mut record = |e: &PointerEvent, id: &str| seen.push((*e, id.to_string()));

        let at = Vec2::new(800.0, 250.0);
        assert!(dispatch(map.state(), PointerKind::Click, at, &mut record));
        let outside = Vec2::new(5.0, 5.0);
        assert!(!dispatch(map.state(), PointerKind::Hover, outside, &mut record));
        assert_eq!(
            seen,
            vec![(
                PointerEvent {
                    kind: PointerKind::Click,
                    position: at
                },
                "3".to_string()
            )]
        );
    }

    #[test]
    fn meshes_never_receive_callbacks() {
        let map = InteractiveMap::mount(
            MapConfig::default(),
            three_regions(),
            vec![LayerSpec::mesh("borders", "regions")],
            960.0,
            500.0,
        )
        .unwrap();
        let mut calls = 0;
        let mut count = |_: &PointerEvent, _: &str| calls += 1;
        // Right on the border between regions 1 and 2.
        let on_border = Vec2::new(328.0, 250.0);
        assert!(!dispatch(map.state(), PointerKind::Click, on_border, &mut count));
        assert_eq!(calls, 0);
    }
}
