//! Matching engine - drives a taker through the book and settles each match.
//!
//! One `match_order` call is one store transaction. Lock order inside it:
//! taker row, then counter-order rows in priority order, then per settlement
//! buyer asset -> seller asset -> buyer user -> seller user. A failure at any
//! step rolls back every mutation of the call; staged events are returned to
//! the caller and published only after commit.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::db::Database;
use crate::decimal;
use crate::error::ExchangeError;
use crate::events::Event;
use crate::models::{Order, OrderStatus, Side};
use crate::store::{AssetRepository, OrderRepository, TradeRepository, UserRepository};
use crate::trading::book::{self, OrderBook};

pub struct MatchingEngine;

impl MatchingEngine {
    /// Run one matching pass for an order.
    ///
    /// Reloads the order under an exclusive lock; a no-longer-OPEN order (a
    /// cancel won the race) is skipped without effect. Counter-orders are
    /// walked best-price-first, earliest-first; each match executes at the
    /// maker's resting price. Whatever remains unfilled stays OPEN on the
    /// book.
    pub async fn match_order(db: &Database, order_id: i64) -> Result<Vec<Event>, ExchangeError> {
        let mut tx = db.pool().begin().await?;
        let mut events = Vec::new();

        let Some(mut taker) = OrderRepository::lock_by_id(&mut tx, order_id).await? else {
            tx.rollback().await?;
            return Ok(events);
        };
        if taker.status != OrderStatus::Open {
            tx.rollback().await?;
            return Ok(events);
        }

        let counters = OrderBook::counter_orders(&mut tx, &taker).await?;
        tracing::debug!(
            order_id = taker.id,
            candidates = counters.len(),
            "matching pass"
        );

        for mut maker in counters {
            if taker.remaining_amount() <= Decimal::ZERO {
                break;
            }
            // The locked row is current; anything no longer matchable is
            // skipped rather than trusted from the query snapshot.
            if !book::crosses(&taker, &maker) || maker.remaining_amount() <= Decimal::ZERO {
                continue;
            }

            let match_amount = taker.remaining_amount().min(maker.remaining_amount());
            let match_price = maker.price;

            Self::settle(&mut tx, &mut taker, &mut maker, match_amount, match_price, &mut events)
                .await?;
        }

        tx.commit().await?;
        Ok(events)
    }

    /// Settle one match between a buy and a sell order.
    ///
    /// Moves `amount` of inventory from seller to buyer and `total` of cash
    /// from the buyer's reservation to the seller. The buyer reserved at its
    /// own limit price; executing at a cheaper maker price refunds the
    /// difference (and its commission component) so reserve -> execute is
    /// exact. The commission itself stays with the house; no fee account is
    /// kept.
    async fn settle(
        conn: &mut PgConnection,
        taker: &mut Order,
        maker: &mut Order,
        amount: Decimal,
        price: Decimal,
        events: &mut Vec<Event>,
    ) -> Result<(), ExchangeError> {
        let (buy, sell): (&mut Order, &mut Order) = match taker.side {
            Side::Buy => (taker, maker),
            Side::Sell => (maker, taker),
        };

        let total = decimal::mul(price, amount);

        // Buyer inventory: row is created lazily on first settlement.
        let buyer_asset = AssetRepository::lock_or_create(conn, buy.user_id, &buy.symbol).await?;
        AssetRepository::adjust(conn, buyer_asset.id, amount, Decimal::ZERO).await?;

        // Seller inventory: reservation locked it at submit, so the row exists.
        let seller_asset = AssetRepository::lock(conn, sell.user_id, &sell.symbol)
            .await?
            .ok_or(ExchangeError::AssetNotFound)?;
        AssetRepository::adjust(conn, seller_asset.id, -amount, -amount).await?;

        // Buyer cash: already debited at reservation against the buy limit.
        // Refund the price improvement when the maker was cheaper.
        UserRepository::lock_by_id(conn, buy.user_id).await?;
        let reserved_leg = decimal::mul(buy.price, amount);
        let improvement = reserved_leg - total;
        if improvement > Decimal::ZERO {
            let refund = improvement + decimal::commission(improvement);
            UserRepository::adjust_balance(conn, buy.user_id, refund).await?;
        }

        // Seller cash: full notional; the seller pays no commission.
        UserRepository::lock_by_id(conn, sell.user_id).await?;
        UserRepository::adjust_balance(conn, sell.user_id, total).await?;

        // Fill both sides, transitioning to FILLED where complete.
        let mut status_events = Vec::new();
        for order in [&mut *buy, &mut *sell] {
            order.filled_amount += amount;
            let was_open = order.status == OrderStatus::Open;
            if order.is_filled() {
                order.status = OrderStatus::Filled;
            }
            order.updated_at =
                OrderRepository::apply_fill(conn, order.id, order.filled_amount, order.status)
                    .await?;
            if was_open && order.status == OrderStatus::Filled {
                status_events.push(Event::OrderStatusUpdated {
                    order: order.clone(),
                });
            }
        }

        let trade = TradeRepository::insert(
            conn,
            buy.id,
            sell.id,
            buy.user_id,
            sell.user_id,
            &buy.symbol,
            price,
            amount,
            Utc::now(),
        )
        .await?;

        tracing::info!(
            trade_id = trade.id,
            buy_order_id = buy.id,
            sell_order_id = sell.id,
            symbol = %trade.symbol,
            price = %price,
            amount = %amount,
            "trade executed"
        );

        events.push(Event::OrderMatched {
            buyer_id: trade.buyer_id,
            seller_id: trade.seller_id,
            trade,
        });
        events.append(&mut status_events);

        Ok(())
    }
}
