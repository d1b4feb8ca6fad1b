pub mod handlers;
pub mod state;
pub mod types;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::user_auth;
use crate::websocket::ws_handler;
use state::AppState;

/// Build the full route tree.
///
/// Everything except /login, /ws and /health sits behind the bearer-token
/// middleware; /ws authenticates its token itself during the upgrade.
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/logout", post(user_auth::handlers::logout))
        .route("/profile", get(handlers::profile::get_profile))
        .route(
            "/orders",
            get(handlers::order::get_orders).post(handlers::order::create_order),
        )
        .route("/orders/{id}/cancel", post(handlers::order::cancel_order))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            user_auth::middleware::auth_middleware,
        ));

    Router::new()
        .route("/login", post(user_auth::handlers::login))
        .route("/ws", get(ws_handler))
        .route("/health", get(handlers::health_check))
        .merge(protected)
        .with_state(state)
}

/// Start the HTTP gateway server
pub async fn run_server(config: &GatewayConfig, state: Arc<AppState>) {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await.unwrap();

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("WebSocket endpoint: ws://{}/ws", addr);

    axum::serve(listener, app).await.unwrap();
}
