//! Order handlers: book query, submission, cancellation.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::error::ExchangeError;
use crate::gateway::state::AppState;
use crate::gateway::types::{self, CreateOrderRequest, OrderView};
use crate::trading::OrderService;
use crate::user_auth::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub symbol: Option<String>,
}

/// GET /orders?symbol=X — the symbol's book in display priority.
/// Without a symbol, the caller's own orders, newest first.
pub async fn get_orders(
    State(state): State<Arc<AppState>>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Query(query): Query<OrdersQuery>,
) -> Response {
    match query.symbol {
        Some(symbol) => match OrderService::book(&state.db, &symbol).await {
            Ok((buys, sells)) => (
                StatusCode::OK,
                Json(json!({
                    "symbol": symbol,
                    "buy_orders": buys.iter().map(OrderView::from).collect::<Vec<_>>(),
                    "sell_orders": sells.iter().map(OrderView::from).collect::<Vec<_>>(),
                })),
            )
                .into_response(),
            Err(err) => types::error_response("list", err),
        },
        None => match OrderService::list(&state.db, user.user_id).await {
            Ok(orders) => (
                StatusCode::OK,
                Json(json!({
                    "orders": orders.iter().map(OrderView::from).collect::<Vec<_>>(),
                })),
            )
                .into_response(),
            Err(err) => types::error_response("list", err),
        },
    }
}

/// POST /orders — validate, reserve, persist, match.
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Json(req): Json<CreateOrderRequest>,
) -> Response {
    let new_order = match types::validate_order_request(&req) {
        Ok(new_order) => new_order,
        Err(errors) => return types::error_response("create", ExchangeError::Validation(errors)),
    };

    tracing::info!(
        user_id = user.user_id,
        symbol = %new_order.symbol,
        side = new_order.side.as_str(),
        "create order request"
    );

    match OrderService::submit(&state.db, &state.publisher, user.user_id, new_order).await {
        Ok(order) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Order created",
                "order": OrderView::from(&order),
            })),
        )
            .into_response(),
        Err(err) => types::error_response("create", err),
    }
}

/// POST /orders/{id}/cancel
pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
    Path(order_id): Path<i64>,
) -> Response {
    match OrderService::cancel(&state.db, &state.publisher, user.user_id, order_id).await {
        Ok(order) => (
            StatusCode::OK,
            Json(json!({
                "message": "Order cancelled",
                "order": OrderView::from(&order),
            })),
        )
            .into_response(),
        Err(err) => types::error_response("cancel", err),
    }
}
