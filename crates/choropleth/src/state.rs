//! Map state and the reducer that moves it between phases.
//!
//! ```text
//! Idle --(topology + viewport)--> Fitted --(zoom/pan)--> Live
//!                                   ^                     |
//!                                   +------ (refit) ------+
//! ```
//!
//! `Fitted` follows the fit projection exactly: every bounds or viewport change
//! reseeds the live transform from a fresh fit. `Live` keeps the user's view: a
//! resize or bounds change preserves the planar point at the viewport center and the
//! zoom factor relative to the fit.

use std::collections::BTreeMap;
use std::sync::Arc;

use formats::topology::Topology;
use foundation::math::{FitTarget, LiveTransform, Vec2, fit, fit_translate, recenter};
use layers::cache::{CacheUpdate, LayerCache};
use layers::layer::LayerSpec;
use layers::predicates::PredicateEngine;
use runtime::EventBus;
use scene::selection::SelectionSet;
use tracing::{debug, info, warn};

use crate::config::MapConfig;
use crate::error::MapError;
use crate::path::PathGenerator;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Result<Self, MapError> {
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            Ok(Self { width, height })
        } else {
            Err(MapError::InvalidViewport { width, height })
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    /// No topology or no viewport yet; nothing can be projected.
    #[default]
    Idle,
    /// The live transform equals the fit projection.
    Fitted,
    /// The user has zoomed or panned away from the fit.
    Live,
}

/// One real-world trigger.
#[derive(Debug, Clone)]
pub enum MapEvent {
    TopologyChanged(Arc<Topology>),
    LayersChanged(Vec<LayerSpec>),
    Resize { width: f64, height: f64 },
    /// Multiply the live scale by `factor` around the viewport point `anchor`.
    Zoom { factor: f64, anchor: Vec2 },
    /// Shift the live translate by a pixel delta.
    Pan { delta: Vec2 },
    /// Absolute transform reported by a zoom device.
    SetTransform(LiveTransform),
    SelectionChanged(SelectionSet),
    /// Choropleth values by location id.
    DataChanged(BTreeMap<String, f64>),
}

impl MapEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MapEvent::TopologyChanged(_) => "topology",
            MapEvent::LayersChanged(_) => "layers",
            MapEvent::Resize { .. } => "resize",
            MapEvent::Zoom { .. } => "zoom",
            MapEvent::Pan { .. } => "pan",
            MapEvent::SetTransform(_) => "set-transform",
            MapEvent::SelectionChanged(_) => "selection",
            MapEvent::DataChanged(_) => "data",
        }
    }
}

/// Everything the map derives from its inputs. Only [`reduce`] writes it.
#[derive(Debug, Default)]
pub struct MapState {
    pub(crate) config: MapConfig,
    pub(crate) topology: Option<Arc<Topology>>,
    pub(crate) layers: Vec<LayerSpec>,
    pub(crate) viewport: Option<Viewport>,
    pub(crate) cache: LayerCache,
    pub(crate) predicates: PredicateEngine,
    pub(crate) data: BTreeMap<String, f64>,
    pub(crate) phase: Phase,
    pub(crate) fit: Option<LiveTransform>,
    pub(crate) live: Option<LiveTransform>,
}

impl MapState {
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn topology(&self) -> Option<&Arc<Topology>> {
        self.topology.as_ref()
    }

    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    pub fn cache(&self) -> &LayerCache {
        &self.cache
    }

    pub fn predicates(&self) -> &PredicateEngine {
        &self.predicates
    }

    pub fn selection(&self) -> &SelectionSet {
        self.predicates.selection()
    }

    pub fn data(&self) -> &BTreeMap<String, f64> {
        &self.data
    }

    /// Projection that fits the current bounds into the viewport.
    pub fn fit_transform(&self) -> Option<LiveTransform> {
        self.fit
    }

    /// Projection currently used for rendering.
    pub fn transform(&self) -> Option<LiveTransform> {
        self.live
    }

    /// Live scale relative to the fit scale (`1.0` while fitted).
    pub fn zoom_factor(&self) -> Option<f64> {
        match (self.live, self.fit) {
            (Some(live), Some(fit)) => Some(live.scale / fit.scale),
            _ => None,
        }
    }

    pub fn path_generator(&self) -> Option<PathGenerator> {
        self.live
            .map(|t| PathGenerator::new(t, self.config.min_segment_px))
    }
}

/// Applies `event` to `state`, recording what was recomputed on `bus`.
///
/// A rejected event leaves `state` untouched.
pub fn reduce(state: &mut MapState, event: MapEvent, bus: &mut EventBus) -> Result<(), MapError> {
    bus.advance();
    let name = event.name();
    let result = match event {
        MapEvent::TopologyChanged(topology) => {
            state.topology = Some(topology);
            sync_layers(state, bus);
            Ok(())
        }
        MapEvent::LayersChanged(layers) => {
            state.layers = layers;
            sync_layers(state, bus);
            Ok(())
        }
        MapEvent::Resize { width, height } => resize(state, width, height, bus),
        MapEvent::Zoom { factor, anchor } => zoom(state, factor, anchor, bus),
        MapEvent::Pan { delta } => {
            update_live(state, bus, "pan", |live| Ok(live.panned(delta)))
        }
        MapEvent::SetTransform(transform) => {
            update_live(state, bus, "set-transform", |_| Ok(transform))
        }
        MapEvent::SelectionChanged(selection) => {
            select(state, selection, bus);
            Ok(())
        }
        MapEvent::DataChanged(values) => {
            bus.emit("data.update", format!("{} values", values.len()));
            state.data = values;
            Ok(())
        }
    };
    if let Err(err) = &result {
        warn!(event = name, step = bus.step(), %err, "map event rejected");
        bus.emit("event.rejected", format!("{name}: {err}"));
    }
    result
}

fn sync_layers(state: &mut MapState, bus: &mut EventBus) {
    let Some(topology) = state.topology.clone() else {
        return;
    };
    let update = state
        .cache
        .update(&topology, &state.layers, &state.predicates);
    match &update {
        CacheUpdate::Unchanged => {
            debug!("layer cache unchanged");
        }
        CacheUpdate::Rebuilt { .. } => {
            info!(layers = state.cache.len(), "layer cache rebuilt");
            bus.emit("cache.rebuild", format!("{} layers", state.cache.len()));
        }
        CacheUpdate::Extended { extracted, .. } => {
            let names: Vec<&str> = extracted.iter().map(|k| k.name.as_str()).collect();
            debug!(layers = ?names, "layer cache extended");
            bus.emit("cache.extend", names.join(","));
        }
    }
    if update.bounds_changed() || state.phase == Phase::Idle {
        let before = state.viewport;
        reproject(state, before, bus);
    }
}

fn resize(
    state: &mut MapState,
    width: f64,
    height: f64,
    bus: &mut EventBus,
) -> Result<(), MapError> {
    let next = Viewport::new(width, height)?;
    let before = state.viewport.replace(next);
    if before == Some(next) {
        return Ok(());
    }
    if state.topology.is_some() {
        reproject(state, before, bus);
    }
    Ok(())
}

/// Recomputes the fit for the current bounds and viewport and reseeds the live
/// transform from it. `before` is the viewport the live transform was set up for.
fn reproject(state: &mut MapState, before: Option<Viewport>, bus: &mut EventBus) {
    let Some(viewport) = state.viewport else {
        debug!("no viewport yet; projection deferred");
        return;
    };
    let next_fit = fit(
        state.cache.bounds(),
        viewport.width,
        viewport.height,
        state.config.fill_proportion,
    );

    match (state.phase, state.live, state.fit, before) {
        (Phase::Live, Some(live), Some(prev_fit), Some(before)) => {
            let zoom = live.scale / prev_fit.scale;
            let center = recenter(before.width, before.height, live.scale, live.translate);
            let scale = next_fit.scale * zoom;
            let translate = fit_translate(
                viewport.width,
                viewport.height,
                scale,
                FitTarget::Center(center),
            );
            state.live = Some(LiveTransform::new(scale, translate));
            debug!(zoom, scale, "rescaled live transform");
            bus.emit("projection.rescale", format!("zoom {zoom}, scale {scale}"));
        }
        _ => {
            state.live = Some(next_fit);
            state.phase = Phase::Fitted;
            debug!(scale = next_fit.scale, "fitted projection");
            bus.emit("projection.fit", format!("scale {}", next_fit.scale));
        }
    }
    state.fit = Some(next_fit);
}

fn zoom(
    state: &mut MapState,
    factor: f64,
    anchor: Vec2,
    bus: &mut EventBus,
) -> Result<(), MapError> {
    if !(factor.is_finite() && factor > 0.0) {
        return Err(MapError::InvalidZoom(factor));
    }
    if !anchor.is_finite() {
        return Err(MapError::InvalidTransform);
    }
    update_live(state, bus, "zoom", |live| Ok(live.zoomed(factor, anchor)))
}

fn update_live(
    state: &mut MapState,
    bus: &mut EventBus,
    what: &str,
    next: impl FnOnce(LiveTransform) -> Result<LiveTransform, MapError>,
) -> Result<(), MapError> {
    let Some(live) = state.live else {
        debug!(what, "pointer event before the first fit; ignored");
        return Ok(());
    };
    let live = next(live)?;
    if !live.is_valid() {
        return Err(MapError::InvalidTransform);
    }
    state.live = Some(live);
    state.phase = Phase::Live;
    bus.emit("transform.live", format!("{what}: scale {}", live.scale));
    Ok(())
}

/// Swaps the selection, re-extracts the meshes drawn from it, and refits when that
/// moves the bounds (a map made only of selection outlines has no bounds until
/// something is selected).
fn select(state: &mut MapState, selection: SelectionSet, bus: &mut EventBus) {
    let previous = state.predicates.selection().clone();
    if !state.predicates.set_selection(selection) {
        return;
    }
    let added = state.predicates.selection().diff(&previous).len();
    let removed = previous.diff(state.predicates.selection()).len();
    let update = state
        .cache
        .refresh_selection_layers(&state.layers, &state.predicates);
    let names: Vec<&str> = match &update {
        CacheUpdate::Extended { extracted, .. } => {
            extracted.iter().map(|k| k.name.as_str()).collect()
        }
        _ => Vec::new(),
    };
    debug!(
        revision = state.predicates.revision(),
        added,
        removed,
        layers = ?names,
        "selection changed"
    );
    bus.emit("predicates.rebuild", names.join(","));
    if update.bounds_changed() {
        let before = state.viewport;
        reproject(state, before, bus);
    }
}
