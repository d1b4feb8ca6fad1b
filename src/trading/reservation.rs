//! Reservation and refund of order collateral.
//!
//! A buy order reserves cash (notional plus buyer commission); a sell order
//! locks inventory. Both run inside the transaction that persists the order,
//! so a failed reservation never leaves a dangling OPEN order.

use rust_decimal::Decimal;
use sqlx::PgConnection;

use crate::decimal;
use crate::error::ExchangeError;
use crate::models::{Order, Side};
use crate::store::{AssetRepository, UserRepository};

pub struct ReservationService;

impl ReservationService {
    /// Reserve collateral for a new order.
    ///
    /// Buy: debit `trunc8(price * amount) + trunc8(notional * 0.015)` from the
    /// user's balance. Sell: raise `locked_amount` on the asset row.
    pub async fn reserve(
        conn: &mut PgConnection,
        user_id: i64,
        symbol: &str,
        side: Side,
        price: Decimal,
        amount: Decimal,
    ) -> Result<(), ExchangeError> {
        match side {
            Side::Buy => {
                let notional = decimal::mul(price, amount);
                let required = notional + decimal::commission(notional);

                let user = UserRepository::lock_by_id(conn, user_id)
                    .await?
                    .ok_or(ExchangeError::NotFound)?;
                if user.balance < required {
                    return Err(ExchangeError::InsufficientBalance);
                }
                UserRepository::adjust_balance(conn, user_id, -required).await?;
            }
            Side::Sell => {
                let asset = AssetRepository::lock(conn, user_id, symbol)
                    .await?
                    .ok_or(ExchangeError::AssetNotFound)?;
                if asset.available_amount() < amount {
                    return Err(ExchangeError::InsufficientAsset);
                }
                AssetRepository::adjust(conn, asset.id, Decimal::ZERO, amount).await?;
            }
        }
        Ok(())
    }

    /// Release the collateral still held by an order's unfilled remainder.
    ///
    /// The exact inverse of `reserve` on `remaining_amount`, so submit-then-
    /// cancel of an unmatched order is the identity on scale-8 decimals. A
    /// missing asset row on a sell cancel is tolerated silently.
    pub async fn refund(conn: &mut PgConnection, order: &Order) -> Result<(), ExchangeError> {
        let remaining = order.remaining_amount();
        if remaining <= Decimal::ZERO {
            return Ok(());
        }

        match order.side {
            Side::Buy => {
                let notional = decimal::mul(order.price, remaining);
                let refund = notional + decimal::commission(notional);
                UserRepository::adjust_balance(conn, order.user_id, refund).await?;
            }
            Side::Sell => {
                AssetRepository::release_locked(conn, order.user_id, &order.symbol, remaining)
                    .await?;
            }
        }
        Ok(())
    }
}
