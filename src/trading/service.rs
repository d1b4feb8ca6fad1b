//! Caller-facing order lifecycle operations.

use std::future::Future;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::db::{self, Database};
use crate::error::ExchangeError;
use crate::events::{Event, EventPublisher};
use crate::models::{Order, OrderStatus, Side};
use crate::store::OrderRepository;
use crate::trading::book::OrderBook;
use crate::trading::{MatchingEngine, ReservationService};

/// A validated submission. Shape validation (required fields, numeric price
/// and amount, known side, symbol length) happens at the gateway boundary;
/// by the time a NewOrder exists its fields are trusted.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub symbol: String,
    pub side: Side,
    pub price: Decimal,
    pub amount: Decimal,
}

const MAX_CONFLICT_RETRIES: u32 = 3;

pub struct OrderService;

impl OrderService {
    /// Submit a new order: reserve collateral and persist it OPEN in one
    /// transaction, run a matching pass in a second, return the post-match
    /// order. Staged events publish only after their transaction committed.
    pub async fn submit(
        db: &Database,
        publisher: &EventPublisher,
        user_id: i64,
        new_order: NewOrder,
    ) -> Result<Order, ExchangeError> {
        let mut tx = db.pool().begin().await?;
        ReservationService::reserve(
            &mut tx,
            user_id,
            &new_order.symbol,
            new_order.side,
            new_order.price,
            new_order.amount,
        )
        .await?;
        let order = OrderRepository::insert(
            &mut tx,
            user_id,
            &new_order.symbol,
            new_order.side,
            new_order.price,
            new_order.amount,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            order_id = order.id,
            user_id,
            symbol = %order.symbol,
            side = order.side.as_str(),
            price = %order.price,
            amount = %order.amount,
            "order accepted"
        );

        let events =
            Self::with_conflict_retry(|| MatchingEngine::match_order(db, order.id)).await?;
        publisher.publish_all(events);

        OrderRepository::get_by_id(db.pool(), order.id)
            .await?
            .ok_or(ExchangeError::NotFound)
    }

    /// Cancel an OPEN order owned by the caller, refunding its unfilled
    /// remainder. A cancel racing a match serializes on the order row lock;
    /// if the match won, the order is no longer OPEN and this returns
    /// CannotCancel.
    pub async fn cancel(
        db: &Database,
        publisher: &EventPublisher,
        user_id: i64,
        order_id: i64,
    ) -> Result<Order, ExchangeError> {
        let (order, events) =
            Self::with_conflict_retry(|| Self::cancel_once(db, user_id, order_id)).await?;
        publisher.publish_all(events);
        Ok(order)
    }

    async fn cancel_once(
        db: &Database,
        user_id: i64,
        order_id: i64,
    ) -> Result<(Order, Vec<Event>), ExchangeError> {
        let mut tx = db.pool().begin().await?;

        // Ownership check and lock in one step; a foreign order and a missing
        // order are indistinguishable to the caller.
        let Some(mut order) = OrderRepository::lock_owned(&mut tx, user_id, order_id).await? else {
            return Err(ExchangeError::NotFound);
        };
        if order.status != OrderStatus::Open {
            return Err(ExchangeError::CannotCancel);
        }

        ReservationService::refund(&mut tx, &order).await?;
        order.status = OrderStatus::Cancelled;
        order.updated_at =
            OrderRepository::set_status(&mut tx, order.id, OrderStatus::Cancelled).await?;
        tx.commit().await?;

        tracing::info!(order_id = order.id, user_id, "order cancelled");

        let events = vec![Event::OrderStatusUpdated {
            order: order.clone(),
        }];
        Ok((order, events))
    }

    /// The caller's orders, newest first
    pub async fn list(db: &Database, user_id: i64) -> Result<Vec<Order>, ExchangeError> {
        Ok(OrderRepository::list_for_user(db.pool(), user_id).await?)
    }

    /// Both sides of a symbol's book in display priority
    pub async fn book(
        db: &Database,
        symbol: &str,
    ) -> Result<(Vec<Order>, Vec<Order>), ExchangeError> {
        Ok(OrderBook::snapshot(db.pool(), symbol).await?)
    }

    /// Retry an operation whose transaction hit a store deadlock or
    /// serialization failure. Exhaustion surfaces as StoreConflict.
    async fn with_conflict_retry<T, F, Fut>(mut op: F) -> Result<T, ExchangeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ExchangeError>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Err(ExchangeError::Store(err)) if db::is_retryable_conflict(&err) => {
                    attempt += 1;
                    if attempt > MAX_CONFLICT_RETRIES {
                        tracing::warn!(attempt, "store conflict retries exhausted");
                        return Err(ExchangeError::StoreConflict);
                    }
                    tracing::debug!(attempt, "store conflict, retrying transaction");
                    tokio::time::sleep(Duration::from_millis(10 * attempt as u64)).await;
                }
                other => return other,
            }
        }
    }
}
