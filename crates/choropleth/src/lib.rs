//! Interactive choropleth map: layer extraction, fit projection, live zoom/pan and
//! selection-aware rendering, driven by an explicit event reducer.

pub mod config;
pub mod error;
pub mod interaction;
pub mod map;
pub mod path;
pub mod render;
pub mod state;
#[cfg(test)]
mod test_support;

pub use config::MapConfig;
pub use error::MapError;
pub use interaction::{FeatureHandler, PointerEvent, PointerKind};
pub use map::InteractiveMap;
pub use path::PathGenerator;
pub use render::{RenderedPath, svg_document};
pub use state::{MapEvent, MapState, Phase, Viewport, reduce};
