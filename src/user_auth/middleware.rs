use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use serde_json::{Value, json};
use std::sync::Arc;

use crate::gateway::state::AppState;

/// Identity injected into request extensions after token verification.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
    pub user_id: i64,
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(unauthenticated)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(unauthenticated)?;

    let claims = state
        .auth
        .verify_token(token)
        .map_err(|_| unauthenticated())?;
    let user_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| unauthenticated())?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id });
    Ok(next.run(request).await)
}

fn unauthenticated() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Unauthenticated" })),
    )
}
