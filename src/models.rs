// models.rs - Ledger row types: users, assets, orders, trades

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;
use sqlx::postgres::PgRow;

use crate::decimal;

/// Order side, stored as TEXT ('buy' | 'sell')
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }

    pub fn parse(s: &str) -> Option<Side> {
        match s {
            "buy" => Some(Side::Buy),
            "sell" => Some(Side::Sell),
            _ => None,
        }
    }
}

/// Order status, stored as SMALLINT (1=open, 2=filled, 3=cancelled)
///
/// Once an order reaches Filled or Cancelled it is terminal and never
/// mutated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Open,
    Filled,
    Cancelled,
}

impl OrderStatus {
    pub fn code(self) -> i16 {
        match self {
            OrderStatus::Open => 1,
            OrderStatus::Filled => 2,
            OrderStatus::Cancelled => 3,
        }
    }

    pub fn from_code(code: i16) -> OrderStatus {
        match code {
            2 => OrderStatus::Filled,
            3 => OrderStatus::Cancelled,
            _ => OrderStatus::Open,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::Filled => "filled",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, OrderStatus::Open)
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    /// Unlocked cash, scale 8, never negative
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn from_row(row: &PgRow) -> User {
        User {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            balance: row.get("balance"),
            created_at: row.get("created_at"),
        }
    }
}

/// Per-user inventory of one symbol
#[derive(Debug, Clone)]
pub struct Asset {
    pub id: i64,
    pub user_id: i64,
    pub symbol: String,
    pub amount: Decimal,
    /// Reserved by open sell orders; 0 <= locked_amount <= amount
    pub locked_amount: Decimal,
}

impl Asset {
    pub fn from_row(row: &PgRow) -> Asset {
        Asset {
            id: row.get("id"),
            user_id: row.get("user_id"),
            symbol: row.get("symbol"),
            amount: row.get("amount"),
            locked_amount: row.get("locked_amount"),
        }
    }

    #[inline]
    pub fn available_amount(&self) -> Decimal {
        self.amount - self.locked_amount
    }
}

#[derive(Debug, Clone)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub symbol: String,
    pub side: Side,
    pub price: Decimal,
    pub amount: Decimal,
    pub filled_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn from_row(row: &PgRow) -> Order {
        let side: String = row.get("side");
        Order {
            id: row.get("id"),
            user_id: row.get("user_id"),
            symbol: row.get("symbol"),
            // The side column carries a CHECK constraint, so parse cannot miss
            side: Side::parse(&side).unwrap_or(Side::Buy),
            price: row.get("price"),
            amount: row.get("amount"),
            filled_amount: row.get("filled_amount"),
            status: OrderStatus::from_code(row.get("status")),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    /// Quantity still open to match
    #[inline]
    pub fn remaining_amount(&self) -> Decimal {
        self.amount - self.filled_amount
    }

    #[inline]
    pub fn is_filled(&self) -> bool {
        self.filled_amount >= self.amount
    }
}

/// An executed match. Append-only; price is the maker's resting price.
#[derive(Debug, Clone)]
pub struct Trade {
    pub id: i64,
    pub buy_order_id: i64,
    pub sell_order_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub symbol: String,
    pub price: Decimal,
    pub amount: Decimal,
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    pub fn from_row(row: &PgRow) -> Trade {
        Trade {
            id: row.get("id"),
            buy_order_id: row.get("buy_order_id"),
            sell_order_id: row.get("sell_order_id"),
            buyer_id: row.get("buyer_id"),
            seller_id: row.get("seller_id"),
            symbol: row.get("symbol"),
            price: row.get("price"),
            amount: row.get("amount"),
            executed_at: row.get("executed_at"),
        }
    }

    /// Notional value of the trade
    #[inline]
    pub fn total(&self) -> Decimal {
        decimal::mul(self.price, self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_status_codes_round_trip() {
        for status in [OrderStatus::Open, OrderStatus::Filled, OrderStatus::Cancelled] {
            assert_eq!(OrderStatus::from_code(status.code()), status);
        }
        assert_eq!(OrderStatus::Open.code(), 1);
        assert_eq!(OrderStatus::Filled.code(), 2);
        assert_eq!(OrderStatus::Cancelled.code(), 3);
    }

    #[test]
    fn test_status_text() {
        assert_eq!(OrderStatus::Open.as_str(), "open");
        assert_eq!(OrderStatus::Filled.as_str(), "filled");
        assert_eq!(OrderStatus::Cancelled.as_str(), "cancelled");
    }

    #[test]
    fn test_side_parse() {
        assert_eq!(Side::parse("buy"), Some(Side::Buy));
        assert_eq!(Side::parse("sell"), Some(Side::Sell));
        assert_eq!(Side::parse("BUY"), None);
        assert_eq!(Side::parse("hold"), None);
    }

    #[test]
    fn test_available_amount() {
        let asset = Asset {
            id: 1,
            user_id: 1,
            symbol: "BTC".to_string(),
            amount: d("2"),
            locked_amount: d("0.5"),
        };
        assert_eq!(asset.available_amount(), d("1.5"));
    }

    #[test]
    fn test_remaining_and_is_filled() {
        let mut order = Order {
            id: 1,
            user_id: 1,
            symbol: "BTC".to_string(),
            side: Side::Buy,
            price: d("50000"),
            amount: d("1"),
            filled_amount: d("0.4"),
            status: OrderStatus::Open,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(order.remaining_amount(), d("0.6"));
        assert!(!order.is_filled());

        order.filled_amount = d("1");
        assert_eq!(order.remaining_amount(), Decimal::ZERO);
        assert!(order.is_filled());
    }
}
