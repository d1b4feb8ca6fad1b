//! Account profile handler.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::gateway::state::AppState;
use crate::gateway::types::{AssetView, UserView};
use crate::models::{Asset, User};
use crate::store::{AssetRepository, UserRepository};
use crate::user_auth::AuthenticatedUser;

/// GET /profile — the caller's account and inventory.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    axum::Extension(user): axum::Extension<AuthenticatedUser>,
) -> Response {
    let loaded: Result<(Option<User>, Vec<Asset>), sqlx::Error> = async {
        let account = UserRepository::get_by_id(state.db.pool(), user.user_id).await?;
        let assets = AssetRepository::list_for_user(state.db.pool(), user.user_id).await?;
        Ok((account, assets))
    }
    .await;

    match loaded {
        Ok((Some(account), assets)) => (
            StatusCode::OK,
            Json(json!({
                "user": UserView::from(&account),
                "assets": assets.iter().map(AssetView::from).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        // Token refers to a user that no longer exists
        Ok((None, _)) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Unauthenticated" })),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "failed to load profile");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "Internal server error" })),
            )
                .into_response()
        }
    }
}
