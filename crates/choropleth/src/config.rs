use foundation::math::DEFAULT_FILL_PROPORTION;
use tracing::warn;

pub const FILL_PROPORTION_ENV: &str = "ATLAS_FILL_PROPORTION";
pub const MIN_SEGMENT_PX_ENV: &str = "ATLAS_MIN_SEGMENT_PX";

/// Tunables of an [`InteractiveMap`](crate::InteractiveMap).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MapConfig {
    /// Share of the viewport the fitted bounds occupy, in `(0, 1]`.
    pub fill_proportion: f64,
    /// Projected segments shorter than this many pixels are elided from paths.
    pub min_segment_px: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            fill_proportion: DEFAULT_FILL_PROPORTION,
            min_segment_px: 1.0,
        }
    }
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fill_proportion(mut self, fill_proportion: f64) -> Self {
        if fill_proportion.is_finite() && fill_proportion > 0.0 && fill_proportion <= 1.0 {
            self.fill_proportion = fill_proportion;
        }
        self
    }

    /// `0.0` disables elision.
    pub fn with_min_segment_px(mut self, min_segment_px: f64) -> Self {
        if min_segment_px.is_finite() && min_segment_px >= 0.0 {
            self.min_segment_px = min_segment_px;
        }
        self
    }

    /// Defaults overridden by `ATLAS_FILL_PROPORTION` / `ATLAS_MIN_SEGMENT_PX`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`MapConfig::from_env`], reading variables through `lookup`.
    /// Unparsable or out-of-range values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(v) = read_f64(&lookup, FILL_PROPORTION_ENV) {
            let next = config.with_fill_proportion(v);
            if next == config && v != config.fill_proportion {
                warn!(key = FILL_PROPORTION_ENV, value = v, "out of range; using default");
            }
            config = next;
        }
        if let Some(v) = read_f64(&lookup, MIN_SEGMENT_PX_ENV) {
            let next = config.with_min_segment_px(v);
            if next == config && v != config.min_segment_px {
                warn!(key = MIN_SEGMENT_PX_ENV, value = v, "out of range; using default");
            }
            config = next;
        }
        config
    }
}

fn read_f64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<f64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<f64>() {
        Ok(v) => Some(v),
        Err(err) => {
            warn!(key, value = %raw, %err, "ignoring unparsable config value");
            None
        }
    }
}
