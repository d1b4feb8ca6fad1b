//! Request/response DTOs, wire views, validation and error mapping.
//!
//! All money and quantity fields leave the system as strings with exactly
//! 8 fractional digits.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::decimal;
use crate::error::{ExchangeError, ValidationErrors};
use crate::models::{Asset, Order, Side, Trade, User};
use crate::trading::NewOrder;

// ============================================================================
// Wire views
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub balance: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            balance: decimal::format_fixed(user.balance),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetView {
    pub symbol: String,
    pub amount: String,
    pub locked_amount: String,
    pub available_amount: String,
}

impl From<&Asset> for AssetView {
    fn from(asset: &Asset) -> Self {
        Self {
            symbol: asset.symbol.clone(),
            amount: decimal::format_fixed(asset.amount),
            locked_amount: decimal::format_fixed(asset.locked_amount),
            available_amount: decimal::format_fixed(asset.available_amount()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub id: i64,
    pub user_id: i64,
    pub symbol: String,
    pub side: &'static str,
    pub price: String,
    pub amount: String,
    pub filled_amount: String,
    pub remaining_amount: String,
    pub status: i16,
    pub status_text: &'static str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            user_id: order.user_id,
            symbol: order.symbol.clone(),
            side: order.side.as_str(),
            price: decimal::format_fixed(order.price),
            amount: decimal::format_fixed(order.amount),
            filled_amount: decimal::format_fixed(order.filled_amount),
            remaining_amount: decimal::format_fixed(order.remaining_amount()),
            status: order.status.code(),
            status_text: order.status.as_str(),
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TradeView {
    pub id: i64,
    pub buy_order_id: i64,
    pub sell_order_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub symbol: String,
    pub price: String,
    pub amount: String,
    pub total: String,
    pub executed_at: DateTime<Utc>,
}

impl From<&Trade> for TradeView {
    fn from(trade: &Trade) -> Self {
        Self {
            id: trade.id,
            buy_order_id: trade.buy_order_id,
            sell_order_id: trade.sell_order_id,
            buyer_id: trade.buyer_id,
            seller_id: trade.seller_id,
            symbol: trade.symbol.clone(),
            price: decimal::format_fixed(trade.price),
            amount: decimal::format_fixed(trade.amount),
            total: decimal::format_fixed(trade.total()),
            executed_at: trade.executed_at,
        }
    }
}

// ============================================================================
// Requests + validation
// ============================================================================

pub const MAX_SYMBOL_LEN: usize = 10;

/// Raw order submission. Fields stay loose so validation can produce a
/// field-keyed error map instead of a deserializer rejection.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub symbol: Option<String>,
    pub side: Option<String>,
    pub price: Option<Value>,
    pub amount: Option<Value>,
}

/// Validate a raw submission into a trusted NewOrder.
pub fn validate_order_request(req: &CreateOrderRequest) -> Result<NewOrder, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let symbol = match req.symbol.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => {
            if s.len() > MAX_SYMBOL_LEN {
                errors.entry("symbol").or_default().push(format!(
                    "symbol may not be longer than {} characters",
                    MAX_SYMBOL_LEN
                ));
                None
            } else {
                Some(s.to_string())
            }
        }
        _ => {
            errors
                .entry("symbol")
                .or_default()
                .push("symbol is required".to_string());
            None
        }
    };

    let side = match req.side.as_deref() {
        Some(s) => match Side::parse(s) {
            Some(side) => Some(side),
            None => {
                errors
                    .entry("side")
                    .or_default()
                    .push("side must be either \"buy\" or \"sell\"".to_string());
                None
            }
        },
        None => {
            errors
                .entry("side")
                .or_default()
                .push("side is required".to_string());
            None
        }
    };

    let price = positive_decimal(&mut errors, "price", req.price.as_ref());
    let amount = positive_decimal(&mut errors, "amount", req.amount.as_ref());

    if !errors.is_empty() {
        return Err(errors);
    }

    // Unwraps cannot fail: every None pushed an error above
    Ok(NewOrder {
        symbol: symbol.unwrap(),
        side: side.unwrap(),
        price: price.unwrap(),
        amount: amount.unwrap(),
    })
}

/// Accepts JSON numbers and numeric strings; anything else is an error.
fn positive_decimal(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<&Value>,
) -> Option<Decimal> {
    let Some(value) = value else {
        errors
            .entry(field)
            .or_default()
            .push(format!("{} is required", field));
        return None;
    };

    let parsed = match value {
        Value::Number(n) => decimal::parse(&n.to_string()).ok(),
        Value::String(s) => decimal::parse(s).ok(),
        _ => None,
    };

    match parsed {
        Some(d) if d > Decimal::ZERO => Some(d),
        Some(_) => {
            errors
                .entry(field)
                .or_default()
                .push(format!("{} must be greater than 0", field));
            None
        }
        None => {
            errors
                .entry(field)
                .or_default()
                .push(format!("{} must be a number", field));
            None
        }
    }
}

// ============================================================================
// Error mapping
// ============================================================================

/// Map an ExchangeError to the HTTP response for an order operation.
///
/// Caller-fault errors return their message verbatim; store errors surface a
/// generic message without leaking internals.
pub fn error_response(action: &str, err: ExchangeError) -> Response {
    match err {
        ExchangeError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "errors": errors })),
        )
            .into_response(),
        ExchangeError::Store(err) => {
            tracing::error!(error = %err, "store error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Internal server error" })),
            )
                .into_response()
        }
        client_err => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "message": format!("Failed to {} order", action),
                "error": client_err.to_string(),
            })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(
        symbol: Option<&str>,
        side: Option<&str>,
        price: Value,
        amount: Value,
    ) -> CreateOrderRequest {
        CreateOrderRequest {
            symbol: symbol.map(str::to_string),
            side: side.map(str::to_string),
            price: Some(price),
            amount: Some(amount),
        }
    }

    #[test]
    fn test_valid_request_passes() {
        let req = raw(Some("BTC"), Some("buy"), json!(50000), json!("1.5"));
        let new_order = validate_order_request(&req).unwrap();
        assert_eq!(new_order.symbol, "BTC");
        assert_eq!(new_order.side, Side::Buy);
        assert_eq!(new_order.price, Decimal::from(50000));
        assert_eq!(new_order.amount, Decimal::new(15, 1));
    }

    #[test]
    fn test_missing_fields_keyed_per_field() {
        let req = CreateOrderRequest {
            symbol: None,
            side: None,
            price: None,
            amount: None,
        };
        let errors = validate_order_request(&req).unwrap_err();
        assert!(errors.contains_key("symbol"));
        assert!(errors.contains_key("side"));
        assert!(errors.contains_key("price"));
        assert!(errors.contains_key("amount"));
    }

    #[test]
    fn test_symbol_too_long() {
        let req = raw(Some("VERYLONGSYMBOL"), Some("sell"), json!(1), json!(1));
        let errors = validate_order_request(&req).unwrap_err();
        assert!(errors.contains_key("symbol"));
    }

    #[test]
    fn test_unknown_side() {
        let req = raw(Some("BTC"), Some("hold"), json!(1), json!(1));
        let errors = validate_order_request(&req).unwrap_err();
        assert!(errors.contains_key("side"));
    }

    #[test]
    fn test_non_positive_and_non_numeric_rejected() {
        let req = raw(Some("BTC"), Some("buy"), json!(0), json!(-1));
        let errors = validate_order_request(&req).unwrap_err();
        assert!(errors["price"][0].contains("greater than 0"));
        assert!(errors["amount"][0].contains("greater than 0"));

        let req = raw(Some("BTC"), Some("buy"), json!("abc"), json!(true));
        let errors = validate_order_request(&req).unwrap_err();
        assert!(errors["price"][0].contains("must be a number"));
        assert!(errors["amount"][0].contains("must be a number"));
    }

    #[test]
    fn test_order_view_decimal_strings() {
        use crate::models::OrderStatus;
        let order = Order {
            id: 1,
            user_id: 2,
            symbol: "BTC".to_string(),
            side: Side::Sell,
            price: Decimal::from(50000),
            amount: Decimal::ONE,
            filled_amount: Decimal::new(5, 1),
            status: OrderStatus::Open,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let view = OrderView::from(&order);
        assert_eq!(view.price, "50000.00000000");
        assert_eq!(view.filled_amount, "0.50000000");
        assert_eq!(view.remaining_amount, "0.50000000");
        assert_eq!(view.status, 1);
        assert_eq!(view.status_text, "open");
        assert_eq!(view.side, "sell");
    }
}
