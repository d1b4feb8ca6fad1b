use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::models::{Order, OrderStatus, Side};

const ORDER_COLUMNS: &str =
    "id, user_id, symbol, side, price, amount, filled_amount, status, created_at, updated_at";

/// Order repository
pub struct OrderRepository;

impl OrderRepository {
    /// Persist a new order in OPEN state
    pub async fn insert(
        conn: &mut PgConnection,
        user_id: i64,
        symbol: &str,
        side: Side,
        price: Decimal,
        amount: Decimal,
    ) -> Result<Order, sqlx::Error> {
        let row = sqlx::query(&format!(
            r#"INSERT INTO orders (user_id, symbol, side, price, amount)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {ORDER_COLUMNS}"#
        ))
        .bind(user_id)
        .bind(symbol)
        .bind(side.as_str())
        .bind(price)
        .bind(amount)
        .fetch_one(&mut *conn)
        .await?;

        Ok(Order::from_row(&row))
    }

    pub async fn get_by_id(pool: &PgPool, order_id: i64) -> Result<Option<Order>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(order_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.as_ref().map(Order::from_row))
    }

    /// Load an order row under an exclusive lock
    pub async fn lock_by_id(
        conn: &mut PgConnection,
        order_id: i64,
    ) -> Result<Option<Order>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(order_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.as_ref().map(Order::from_row))
    }

    /// Lock an order owned by the given user. None when the order does not
    /// exist or belongs to someone else; callers do not distinguish the two.
    pub async fn lock_owned(
        conn: &mut PgConnection,
        user_id: i64,
        order_id: i64,
    ) -> Result<Option<Order>, sqlx::Error> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2 FOR UPDATE"
        ))
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.as_ref().map(Order::from_row))
    }

    /// Fetch and lock the resting counter-orders a taker is eligible to match.
    ///
    /// Same symbol, OPEN, another user, crossing price. Buy takers walk asks
    /// cheapest-first; sell takers walk bids highest-first; ties break on
    /// created_at then id. Locks are acquired in the returned order, which
    /// keeps contending matchers on one book serialized.
    pub async fn lock_counter_orders(
        conn: &mut PgConnection,
        taker: &Order,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let sql = match taker.side {
            Side::Buy => format!(
                r#"SELECT {ORDER_COLUMNS} FROM orders
                   WHERE symbol = $1 AND status = 1 AND side = 'sell'
                     AND price <= $2 AND user_id <> $3 AND id <> $4
                   ORDER BY price ASC, created_at ASC, id ASC
                   FOR UPDATE"#
            ),
            Side::Sell => format!(
                r#"SELECT {ORDER_COLUMNS} FROM orders
                   WHERE symbol = $1 AND status = 1 AND side = 'buy'
                     AND price >= $2 AND user_id <> $3 AND id <> $4
                   ORDER BY price DESC, created_at ASC, id ASC
                   FOR UPDATE"#
            ),
        };

        let rows = sqlx::query(&sql)
            .bind(&taker.symbol)
            .bind(taker.price)
            .bind(taker.user_id)
            .bind(taker.id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(rows.iter().map(Order::from_row).collect())
    }

    /// Write back a fill: new cumulative filled_amount and status.
    /// Returns the row's new updated_at.
    pub async fn apply_fill(
        conn: &mut PgConnection,
        order_id: i64,
        filled_amount: Decimal,
        status: OrderStatus,
    ) -> Result<DateTime<Utc>, sqlx::Error> {
        use sqlx::Row;
        let row = sqlx::query(
            r#"UPDATE orders
               SET filled_amount = $2, status = $3, updated_at = NOW()
               WHERE id = $1
               RETURNING updated_at"#,
        )
        .bind(order_id)
        .bind(filled_amount)
        .bind(status.code())
        .fetch_one(&mut *conn)
        .await?;
        Ok(row.get("updated_at"))
    }

    /// Returns the row's new updated_at.
    pub async fn set_status(
        conn: &mut PgConnection,
        order_id: i64,
        status: OrderStatus,
    ) -> Result<DateTime<Utc>, sqlx::Error> {
        use sqlx::Row;
        let row = sqlx::query(
            r#"UPDATE orders SET status = $2, updated_at = NOW()
               WHERE id = $1
               RETURNING updated_at"#,
        )
        .bind(order_id)
        .bind(status.code())
        .fetch_one(&mut *conn)
        .await?;
        Ok(row.get("updated_at"))
    }

    /// A user's orders, newest first
    pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Order>, sqlx::Error> {
        let rows = sqlx::query(&format!(
            r#"SELECT {ORDER_COLUMNS} FROM orders
               WHERE user_id = $1
               ORDER BY created_at DESC, id DESC"#
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.iter().map(Order::from_row).collect())
    }

    /// OPEN orders on one side of a symbol's book, in book priority:
    /// bids highest-first, asks cheapest-first, time then id within a level.
    pub async fn open_by_symbol(
        pool: &PgPool,
        symbol: &str,
        side: Side,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let sql = match side {
            Side::Buy => format!(
                r#"SELECT {ORDER_COLUMNS} FROM orders
                   WHERE symbol = $1 AND status = 1 AND side = 'buy'
                   ORDER BY price DESC, created_at ASC, id ASC"#
            ),
            Side::Sell => format!(
                r#"SELECT {ORDER_COLUMNS} FROM orders
                   WHERE symbol = $1 AND status = 1 AND side = 'sell'
                   ORDER BY price ASC, created_at ASC, id ASC"#
            ),
        };

        let rows = sqlx::query(&sql).bind(symbol).fetch_all(pool).await?;
        Ok(rows.iter().map(Order::from_row).collect())
    }
}
