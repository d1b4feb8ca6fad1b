use std::sync::Arc;

use crate::db::Database;
use crate::events::EventPublisher;
use crate::user_auth::UserAuthService;
use crate::websocket::ChannelRegistry;

/// Shared state handed to every handler.
pub struct AppState {
    pub db: Database,
    pub auth: UserAuthService,
    pub channels: Arc<ChannelRegistry>,
    pub publisher: EventPublisher,
}
