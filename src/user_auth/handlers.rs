use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;

use super::middleware::AuthenticatedUser;
use super::service::LoginRequest;
use crate::gateway::state::AppState;
use crate::gateway::types::UserView;

/// POST /login — verify credentials, return a bearer token and the user.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Response {
    match state.auth.login(req).await {
        Ok((token, user)) => (
            StatusCode::OK,
            Json(json!({
                "token": token,
                "user": UserView::from(&user),
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("Login failed: {:?}", e);
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Invalid email or password" })),
            )
                .into_response()
        }
    }
}

/// POST /logout — tokens are stateless, so this only acknowledges; the
/// client discards its token.
pub async fn logout(
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> Response {
    tracing::info!(user_id = user.user_id, "logout");
    (StatusCode::OK, Json(json!({ "message": "Logged out" }))).into_response()
}
