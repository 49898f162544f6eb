//! Router assembly

pub mod api;
pub mod ws;

use std::sync::Arc;

use axum::{Router, http::HeaderValue};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::config::ServerConfig;
use crate::state::AppState;

/// The full application: REST and WebSocket routes behind the CORS policy.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let cors = cors_layer(&app_state.config);

    api::create_api_router()
        .merge(ws::create_ws_router())
        .layer(cors)
        .with_state(app_state)
}

/// CORS policy from `cors_allowed_origins`; `*` allows any origin.
pub fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}
