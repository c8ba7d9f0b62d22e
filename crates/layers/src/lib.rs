pub mod cache;
pub mod extract;
pub mod layer;
pub mod predicates;
pub mod symbology;
#[cfg(test)]
mod test_support;

pub use cache::*;
pub use extract::*;
pub use layer::*;
pub use predicates::*;
pub use symbology::*;
