//! Per-user push channels.
//!
//! Every user gets one logical channel, `user.<id>`; a channel exists while
//! at least one socket is attached and fans each published message out to
//! all of them. Sockets attach through a `Subscription`, which detaches
//! itself when dropped, so a closing WebSocket task cannot leak registry
//! entries.

use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;

use super::messages::{self, WsMessage};

/// Outbound half of one attached socket
pub type WsSender = mpsc::UnboundedSender<WsMessage>;

struct Subscriber {
    id: u64,
    tx: WsSender,
}

/// Registry of live user channels.
pub struct ChannelRegistry {
    channels: DashMap<i64, Vec<Subscriber>>,
    next_subscriber_id: AtomicU64,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
            next_subscriber_id: AtomicU64::new(1),
        }
    }

    /// Hand a message to every socket on a user's channel.
    ///
    /// Returns the number of sockets that accepted it; zero means the user
    /// is not connected. A socket whose receiver is already gone is simply
    /// skipped, its Subscription cleans up when the handler task ends.
    pub fn publish(&self, user_id: i64, message: &WsMessage) -> usize {
        let Some(subscribers) = self.channels.get(&user_id) else {
            return 0;
        };
        let mut delivered = 0;
        for subscriber in subscribers.iter() {
            if subscriber.tx.send(message.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    fn detach(&self, user_id: i64, subscriber_id: u64) {
        let now_empty = match self.channels.get_mut(&user_id) {
            Some(mut subscribers) => {
                subscribers.retain(|s| s.id != subscriber_id);
                subscribers.is_empty()
            }
            None => return,
        };
        if now_empty {
            // Re-checked under the shard lock: another socket may have
            // attached between the retain above and this call.
            self.channels
                .remove_if(&user_id, |_, subscribers| subscribers.is_empty());
            tracing::debug!(channel = %messages::channel(user_id), "channel closed");
        }
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A socket's membership in a user channel; detaches on drop.
pub struct Subscription {
    registry: Arc<ChannelRegistry>,
    user_id: i64,
    subscriber_id: u64,
}

impl Subscription {
    pub fn attach(registry: Arc<ChannelRegistry>, user_id: i64, tx: WsSender) -> Subscription {
        let subscriber_id = registry.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        registry
            .channels
            .entry(user_id)
            .or_default()
            .push(Subscriber {
                id: subscriber_id,
                tx,
            });

        tracing::debug!(
            channel = %messages::channel(user_id),
            subscriber_id,
            "socket attached"
        );
        Subscription {
            registry,
            user_id,
            subscriber_id,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.detach(self.user_id, self.subscriber_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_fans_out_to_every_attached_socket() {
        let registry = Arc::new(ChannelRegistry::new());
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let _a = Subscription::attach(registry.clone(), 7, tx_a);
        let _b = Subscription::attach(registry.clone(), 7, tx_b);

        let delivered = registry.publish(7, &WsMessage::Pong);

        assert_eq!(delivered, 2);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_publish_to_offline_user_reaches_nobody() {
        let registry = Arc::new(ChannelRegistry::new());
        assert_eq!(registry.publish(42, &WsMessage::Pong), 0);
    }

    #[test]
    fn test_channels_are_isolated_per_user() {
        let registry = Arc::new(ChannelRegistry::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = Subscription::attach(registry.clone(), 7, tx);

        assert_eq!(registry.publish(8, &WsMessage::Pong), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropping_a_subscription_detaches_only_that_socket() {
        let registry = Arc::new(ChannelRegistry::new());
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let first = Subscription::attach(registry.clone(), 7, tx_a);
        let second = Subscription::attach(registry.clone(), 7, tx_b);

        drop(first);
        assert_eq!(registry.publish(7, &WsMessage::Pong), 1);
        assert!(rx_b.try_recv().is_ok());

        drop(second);
        assert_eq!(registry.publish(7, &WsMessage::Pong), 0);
    }
}
