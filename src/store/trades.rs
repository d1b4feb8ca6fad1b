use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::models::Trade;

/// Trade repository. Trades are append-only.
pub struct TradeRepository;

impl TradeRepository {
    #[allow(clippy::too_many_arguments)]
    pub async fn insert(
        conn: &mut PgConnection,
        buy_order_id: i64,
        sell_order_id: i64,
        buyer_id: i64,
        seller_id: i64,
        symbol: &str,
        price: Decimal,
        amount: Decimal,
        executed_at: DateTime<Utc>,
    ) -> Result<Trade, sqlx::Error> {
        let row = sqlx::query(
            r#"INSERT INTO trades
               (buy_order_id, sell_order_id, buyer_id, seller_id, symbol, price, amount, executed_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
               RETURNING id, buy_order_id, sell_order_id, buyer_id, seller_id,
                         symbol, price, amount, executed_at"#,
        )
        .bind(buy_order_id)
        .bind(sell_order_id)
        .bind(buyer_id)
        .bind(seller_id)
        .bind(symbol)
        .bind(price)
        .bind(amount)
        .bind(executed_at)
        .fetch_one(&mut *conn)
        .await?;

        Ok(Trade::from_row(&row))
    }
}
