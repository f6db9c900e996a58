pub use buy_bundle::*;
pub use contribute::*;
pub use create_raffle::*;
pub use finish_raffle::*;
pub use get_free_ticket::*;

pub mod buy_bundle;
pub mod contribute;
pub mod create_raffle;
pub mod finish_raffle;
pub mod get_free_ticket;
