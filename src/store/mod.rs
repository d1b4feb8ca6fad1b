//! Row-level data access for the ledger tables.
//!
//! Every mutating operation runs on a caller-provided transaction connection;
//! exclusive row locks are taken with `SELECT ... FOR UPDATE` so contending
//! submissions serialize at the store.

pub mod assets;
pub mod orders;
pub mod trades;
pub mod users;

pub use assets::AssetRepository;
pub use orders::OrderRepository;
pub use trades::TradeRepository;
pub use users::UserRepository;
