//! spotmatch - spot-exchange backend
//!
//! Continuous double-auction matching over a transactional PostgreSQL
//! ledger. Users hold a cash balance and per-symbol inventories, post limit
//! orders over the HTTP gateway, and the engine matches crossing orders
//! under price-time priority, settles value atomically, appends an immutable
//! trade log, and pushes events to each affected user's private WebSocket
//! channel.
//!
//! There is no dedicated matching thread: each submission drives its own
//! matching pass, and concurrent submissions on a book serialize through
//! `SELECT ... FOR UPDATE` row locks inside store transactions.

pub mod config;
pub mod db;
pub mod decimal;
pub mod error;
pub mod events;
pub mod gateway;
pub mod logging;
pub mod models;
pub mod store;
pub mod trading;
pub mod user_auth;
pub mod websocket;
