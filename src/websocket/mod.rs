//! WebSocket module for real-time push notifications
//!
//! Delivers `order.matched` and `order.status.updated` events to each
//! affected user over their private `user.<id>` channel.

pub mod channels;
pub mod handler;
pub mod messages;

pub use channels::{ChannelRegistry, Subscription};
pub use handler::ws_handler;
pub use messages::WsMessage;
