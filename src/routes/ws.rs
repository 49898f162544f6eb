use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::ws;
use crate::state::AppState;
use std::sync::Arc;

/// Create the WebSocket router
///
/// One endpoint per category; the category is resolved before the upgrade
/// so unknown names are refused with a plain 404.
pub fn create_ws_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ws/{category}", get(ws::ws_recognition_handler))
        .layer(TraceLayer::new_for_http())
}
