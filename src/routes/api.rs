use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, predict};
use crate::state::AppState;
use std::sync::Arc;

pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::root))
        .route("/health", get(api::health_check))
        .route("/categories", get(api::list_categories))
        .route("/predict/{category}", post(predict::predict_handler))
        .layer(TraceLayer::new_for_http())
}
