pub mod geometry;
pub mod topology;

pub use geometry::*;
pub use topology::*;
