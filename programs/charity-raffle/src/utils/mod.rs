pub use entrants::*;
pub use randomness::*;

pub mod entrants;
pub mod randomness;
