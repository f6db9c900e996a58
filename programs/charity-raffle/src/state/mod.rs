pub use entrants::*;
pub use raffle::*;
pub use treasury::*;

pub mod entrants;
pub mod raffle;
pub mod treasury;
