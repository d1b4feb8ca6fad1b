use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use crate::models::Asset;

/// Asset (per-user inventory) repository
pub struct AssetRepository;

impl AssetRepository {
    pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Asset>, sqlx::Error> {
        let rows = sqlx::query(
            r#"SELECT id, user_id, symbol, amount, locked_amount
               FROM assets WHERE user_id = $1
               ORDER BY symbol"#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.iter().map(Asset::from_row).collect())
    }

    /// Lock the (user, symbol) row exclusively. None if the row does not exist.
    pub async fn lock(
        conn: &mut PgConnection,
        user_id: i64,
        symbol: &str,
    ) -> Result<Option<Asset>, sqlx::Error> {
        let row = sqlx::query(
            r#"SELECT id, user_id, symbol, amount, locked_amount
               FROM assets WHERE user_id = $1 AND symbol = $2
               FOR UPDATE"#,
        )
        .bind(user_id)
        .bind(symbol)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.as_ref().map(Asset::from_row))
    }

    /// Lock the (user, symbol) row, creating it with zeros first if absent.
    ///
    /// Buyers get their inventory row lazily on first settlement.
    pub async fn lock_or_create(
        conn: &mut PgConnection,
        user_id: i64,
        symbol: &str,
    ) -> Result<Asset, sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO assets (user_id, symbol, amount, locked_amount)
               VALUES ($1, $2, 0, 0)
               ON CONFLICT (user_id, symbol) DO NOTHING"#,
        )
        .bind(user_id)
        .bind(symbol)
        .execute(&mut *conn)
        .await?;

        let row = sqlx::query(
            r#"SELECT id, user_id, symbol, amount, locked_amount
               FROM assets WHERE user_id = $1 AND symbol = $2
               FOR UPDATE"#,
        )
        .bind(user_id)
        .bind(symbol)
        .fetch_one(&mut *conn)
        .await?;

        Ok(Asset::from_row(&row))
    }

    /// Apply signed deltas to amount and locked_amount. The caller must hold
    /// the row lock and have verified the invariants hold afterwards.
    pub async fn adjust(
        conn: &mut PgConnection,
        asset_id: i64,
        amount_delta: Decimal,
        locked_delta: Decimal,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"UPDATE assets
               SET amount = amount + $2, locked_amount = locked_amount + $3
               WHERE id = $1"#,
        )
        .bind(asset_id)
        .bind(amount_delta)
        .bind(locked_delta)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Release locked inventory on a sell cancel. A missing row is tolerated
    /// silently: nothing was reserved elsewhere.
    pub async fn release_locked(
        conn: &mut PgConnection,
        user_id: i64,
        symbol: &str,
        quantity: Decimal,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"UPDATE assets
               SET locked_amount = locked_amount - $3
               WHERE user_id = $1 AND symbol = $2"#,
        )
        .bind(user_id)
        .bind(symbol)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// Credit inventory outside the matching path (seeding and tests)
    pub async fn deposit(
        pool: &PgPool,
        user_id: i64,
        symbol: &str,
        quantity: Decimal,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO assets (user_id, symbol, amount, locked_amount)
               VALUES ($1, $2, $3, 0)
               ON CONFLICT (user_id, symbol)
               DO UPDATE SET amount = assets.amount + EXCLUDED.amount"#,
        )
        .bind(user_id)
        .bind(symbol)
        .bind(quantity)
        .execute(pool)
        .await?;
        Ok(())
    }
}
