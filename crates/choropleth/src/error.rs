use std::fmt;

/// Rejected map events. The map keeps its previous state when one is returned.
#[derive(Debug, Clone, PartialEq)]
pub enum MapError {
    /// Width or height is zero, negative or not finite.
    InvalidViewport { width: f64, height: f64 },
    /// Zoom factor is not finite and positive.
    InvalidZoom(f64),
    /// A pan or absolute transform would leave the live transform unusable.
    InvalidTransform,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::InvalidViewport { width, height } => {
                write!(f, "invalid viewport {width}x{height}")
            }
            MapError::InvalidZoom(factor) => write!(f, "invalid zoom factor {factor}"),
            MapError::InvalidTransform => write!(f, "transform must have a finite positive scale"),
        }
    }
}

impl std::error::Error for MapError {}
