use std::sync::Arc;

use formats::topology::Topology;
use foundation::math::{LiveTransform, Vec2};
use layers::layer::LayerSpec;
use runtime::EventBus;
use scene::selection::SelectionSet;

use crate::config::MapConfig;
use crate::error::MapError;
use crate::interaction::{self, FeatureHandler, PointerKind};
use crate::render::{self, RenderedPath};
use crate::state::{MapEvent, MapState, Phase, reduce};

/// A mounted choropleth map: its state plus the trace of what each event recomputed.
#[derive(Debug, Default)]
pub struct InteractiveMap {
    state: MapState,
    bus: EventBus,
}

impl InteractiveMap {
    pub fn new(config: MapConfig) -> Self {
        Self {
            state: MapState::new(config),
            bus: EventBus::new(),
        }
    }

    /// Sizes the viewport, extracts `layers` from `topology` and fits the result.
    pub fn mount(
        config: MapConfig,
        topology: Arc<Topology>,
        layers: Vec<LayerSpec>,
        width: f64,
        height: f64,
    ) -> Result<Self, MapError> {
        let mut map = Self::new(config);
        map.apply(MapEvent::Resize { width, height })?;
        map.apply(MapEvent::LayersChanged(layers))?;
        map.apply(MapEvent::TopologyChanged(topology))?;
        Ok(map)
    }

    pub fn apply(&mut self, event: MapEvent) -> Result<(), MapError> {
        reduce(&mut self.state, event, &mut self.bus)
    }

    pub fn state(&self) -> &MapState {
        &self.state
    }

    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn transform(&self) -> Option<LiveTransform> {
        self.state.transform()
    }

    pub fn fit_transform(&self) -> Option<LiveTransform> {
        self.state.fit_transform()
    }

    pub fn zoom_factor(&self) -> Option<f64> {
        self.state.zoom_factor()
    }

    pub fn selection(&self) -> &SelectionSet {
        self.state.selection()
    }

    pub fn render(&self) -> Vec<RenderedPath> {
        render::render(&self.state)
    }

    /// The rendered map as an SVG document; `None` before a viewport is set.
    pub fn render_svg(&self) -> Option<String> {
        let viewport = self.state.viewport()?;
        Some(render::svg_document(&self.render(), viewport))
    }

    pub fn pick(&self, point: Vec2) -> Option<&str> {
        interaction::pick(&self.state, point)
    }

    pub fn dispatch(
        &self,
        kind: PointerKind,
        point: Vec2,
        handler: &mut dyn FeatureHandler,
    ) -> bool {
        interaction::dispatch(&self.state, kind, point, handler)
    }
}
