//! Typed events produced by the matching engine and cancel path.
//!
//! Events are staged in a Vec while their transaction runs and handed to the
//! publisher only after commit, so a rolled-back match never notifies anyone.
//! Delivery itself is best-effort per user channel.

use std::sync::Arc;

use crate::gateway::types::{OrderView, TradeView};
use crate::models::{Order, Trade};
use crate::websocket::{ChannelRegistry, WsMessage, messages};

#[derive(Debug, Clone)]
pub enum Event {
    /// One per executed trade, routed to both parties
    OrderMatched {
        trade: Trade,
        buyer_id: i64,
        seller_id: i64,
    },
    /// Terminal transition (filled or cancelled), routed to the owner
    OrderStatusUpdated { order: Order },
}

/// Fans committed events out to the affected users' private channels.
pub struct EventPublisher {
    channels: Arc<ChannelRegistry>,
}

impl EventPublisher {
    pub fn new(channels: Arc<ChannelRegistry>) -> Self {
        Self { channels }
    }

    pub fn publish_all(&self, events: Vec<Event>) {
        for event in events {
            self.publish(event);
        }
    }

    pub fn publish(&self, event: Event) {
        match event {
            Event::OrderMatched {
                trade,
                buyer_id,
                seller_id,
            } => {
                let message = WsMessage::OrderMatched {
                    trade: TradeView::from(&trade),
                };
                let delivered = self.channels.publish(buyer_id, &message)
                    + self.channels.publish(seller_id, &message);
                tracing::debug!(
                    trade_id = trade.id,
                    buyer = %messages::channel(buyer_id),
                    seller = %messages::channel(seller_id),
                    delivered,
                    "published order.matched"
                );
            }
            Event::OrderStatusUpdated { order } => {
                let message = WsMessage::OrderStatusUpdated {
                    order: OrderView::from(&order),
                };
                let delivered = self.channels.publish(order.user_id, &message);
                tracing::debug!(
                    order_id = order.id,
                    status = order.status.as_str(),
                    channel = %messages::channel(order.user_id),
                    delivered,
                    "published order.status.updated"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderStatus, Side};
    use crate::websocket::Subscription;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tokio::sync::mpsc;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sample_trade() -> Trade {
        Trade {
            id: 1,
            buy_order_id: 10,
            sell_order_id: 11,
            buyer_id: 100,
            seller_id: 200,
            symbol: "BTC".to_string(),
            price: d("50000"),
            amount: d("1"),
            executed_at: Utc::now(),
        }
    }

    #[test]
    fn test_order_matched_reaches_both_parties() {
        let channels = Arc::new(ChannelRegistry::new());
        let publisher = EventPublisher::new(channels.clone());

        let (buyer_tx, mut buyer_rx) = mpsc::unbounded_channel();
        let (seller_tx, mut seller_rx) = mpsc::unbounded_channel();
        let _buyer = Subscription::attach(channels.clone(), 100, buyer_tx);
        let _seller = Subscription::attach(channels.clone(), 200, seller_tx);

        publisher.publish(Event::OrderMatched {
            trade: sample_trade(),
            buyer_id: 100,
            seller_id: 200,
        });

        for rx in [&mut buyer_rx, &mut seller_rx] {
            let msg = rx.try_recv().expect("event delivered");
            let json = serde_json::to_value(&msg).unwrap();
            assert_eq!(json["event"], "order.matched");
            assert_eq!(json["data"]["trade"]["price"], "50000.00000000");
            assert_eq!(json["data"]["trade"]["total"], "50000.00000000");
        }
    }

    #[test]
    fn test_status_update_reaches_owner_only() {
        let channels = Arc::new(ChannelRegistry::new());
        let publisher = EventPublisher::new(channels.clone());

        let (owner_tx, mut owner_rx) = mpsc::unbounded_channel();
        let (other_tx, mut other_rx) = mpsc::unbounded_channel();
        let _owner = Subscription::attach(channels.clone(), 100, owner_tx);
        let _other = Subscription::attach(channels.clone(), 200, other_tx);

        let order = Order {
            id: 10,
            user_id: 100,
            symbol: "BTC".to_string(),
            side: Side::Buy,
            price: d("50000"),
            amount: d("1"),
            filled_amount: d("1"),
            status: OrderStatus::Filled,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        publisher.publish(Event::OrderStatusUpdated { order });

        let msg = owner_rx.try_recv().expect("owner notified");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["event"], "order.status.updated");
        assert_eq!(json["data"]["order"]["status"], 2);
        assert_eq!(json["data"]["order"]["status_text"], "filled");
        assert_eq!(json["data"]["order"]["remaining_amount"], "0.00000000");

        assert!(other_rx.try_recv().is_err());
    }
}
