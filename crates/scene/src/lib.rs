pub mod ordering;
pub mod picking;
pub mod selection;

pub use ordering::*;
pub use picking::*;
pub use selection::*;
