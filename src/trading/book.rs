//! Order-book eligibility and snapshots.
//!
//! The book is the set of resting OPEN orders on a symbol. A taker is matched
//! against counter-orders of the opposite side whose price crosses its limit,
//! never against the same user, walked in price-time priority.

use sqlx::{PgConnection, PgPool};

use crate::models::{Order, OrderStatus, Side};
use crate::store::OrderRepository;

/// True when a resting order is eligible to match the taker: opposite side,
/// same symbol, crossing price, another user, still open.
pub fn crosses(taker: &Order, resting: &Order) -> bool {
    if resting.symbol != taker.symbol
        || resting.user_id == taker.user_id
        || resting.id == taker.id
        || resting.status != OrderStatus::Open
    {
        return false;
    }
    match taker.side {
        Side::Buy => resting.side == Side::Sell && resting.price <= taker.price,
        Side::Sell => resting.side == Side::Buy && resting.price >= taker.price,
    }
}

pub struct OrderBook;

impl OrderBook {
    /// The resting counter-orders a taker may match, locked, in match
    /// priority: best price for the taker first, then created_at, then id.
    pub async fn counter_orders(
        conn: &mut PgConnection,
        taker: &Order,
    ) -> Result<Vec<Order>, sqlx::Error> {
        OrderRepository::lock_counter_orders(conn, taker).await
    }

    /// Both sides of a symbol's book: bids highest-first, asks cheapest-first.
    pub async fn snapshot(
        pool: &PgPool,
        symbol: &str,
    ) -> Result<(Vec<Order>, Vec<Order>), sqlx::Error> {
        let buys = OrderRepository::open_by_symbol(pool, symbol, Side::Buy).await?;
        let sells = OrderRepository::open_by_symbol(pool, symbol, Side::Sell).await?;
        Ok((buys, sells))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn order(id: i64, user_id: i64, side: Side, price: &str) -> Order {
        Order {
            id,
            user_id,
            symbol: "BTC".to_string(),
            side,
            price: Decimal::from_str(price).unwrap(),
            amount: Decimal::ONE,
            filled_amount: Decimal::ZERO,
            status: OrderStatus::Open,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_buy_crosses_cheaper_and_equal_asks() {
        let taker = order(10, 1, Side::Buy, "50000");
        assert!(crosses(&taker, &order(1, 2, Side::Sell, "49000")));
        assert!(crosses(&taker, &order(2, 2, Side::Sell, "50000")));
        assert!(!crosses(&taker, &order(3, 2, Side::Sell, "50001")));
    }

    #[test]
    fn test_sell_crosses_higher_and_equal_bids() {
        let taker = order(10, 1, Side::Sell, "50000");
        assert!(crosses(&taker, &order(1, 2, Side::Buy, "51000")));
        assert!(crosses(&taker, &order(2, 2, Side::Buy, "50000")));
        assert!(!crosses(&taker, &order(3, 2, Side::Buy, "48000")));
    }

    #[test]
    fn test_never_matches_same_user_or_side() {
        let taker = order(10, 1, Side::Buy, "50000");
        // Same user never matches, regardless of price
        assert!(!crosses(&taker, &order(1, 1, Side::Sell, "49000")));
        // Same side never matches
        assert!(!crosses(&taker, &order(2, 2, Side::Buy, "49000")));
    }

    #[test]
    fn test_never_matches_terminal_orders() {
        let taker = order(10, 1, Side::Buy, "50000");
        let mut resting = order(1, 2, Side::Sell, "49000");
        resting.status = OrderStatus::Filled;
        assert!(!crosses(&taker, &resting));
        resting.status = OrderStatus::Cancelled;
        assert!(!crosses(&taker, &resting));
    }

    #[test]
    fn test_never_matches_other_symbol() {
        let taker = order(10, 1, Side::Buy, "50000");
        let mut resting = order(1, 2, Side::Sell, "49000");
        resting.symbol = "ETH".to_string();
        assert!(!crosses(&taker, &resting));
    }
}
