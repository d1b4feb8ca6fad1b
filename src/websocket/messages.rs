//! Wire messages pushed over a user's private channel.

use serde::Serialize;

use crate::gateway::types::{OrderView, TradeView};

/// Name of a user's private channel
pub fn channel(user_id: i64) -> String {
    format!("user.{}", user_id)
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum WsMessage {
    #[serde(rename = "connected")]
    Connected { channel: String },

    /// One per executed trade, delivered to both parties
    #[serde(rename = "order.matched")]
    OrderMatched { trade: TradeView },

    /// Terminal status transition of an order, delivered to its owner
    #[serde(rename = "order.status.updated")]
    OrderStatusUpdated { order: OrderView },

    #[serde(rename = "pong")]
    Pong,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_name() {
        assert_eq!(channel(7), "user.7");
    }

    #[test]
    fn test_event_names_on_the_wire() {
        let json = serde_json::to_value(WsMessage::Connected {
            channel: "user.7".to_string(),
        })
        .unwrap();
        assert_eq!(json["event"], "connected");
        assert_eq!(json["data"]["channel"], "user.7");

        let json = serde_json::to_value(WsMessage::Pong).unwrap();
        assert_eq!(json["event"], "pong");
    }
}
