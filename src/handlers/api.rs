use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde::Serialize;
use serde_json::{Value, json};

use crate::core::recognizer::RecognizerInfo;
use crate::core::stabilizer::StabilizerConfig;
use crate::state::AppState;

/// Liveness handler
/// Returns a simple JSON response indicating the server is running
pub async fn root() -> Json<Value> {
    Json(json!({
        "status": "OK"
    }))
}

/// Readiness handler
///
/// Reports every loaded category and the number of live sessions in each.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let sessions = state.sessions();
    let counts = sessions.counts_by_category();

    let categories: serde_json::Map<String, Value> = state
        .core_state
        .recognizers()
        .iter()
        .map(|recognizer| {
            let info = recognizer.info();
            let active = counts.get(recognizer.name()).copied().unwrap_or(0);
            (
                info.name.clone(),
                json!({
                    "model_loaded": info.model_loaded,
                    "backend": info.backend,
                    "input_width": info.input_width,
                    "sequence_length": info.sequence_length,
                    "classes": info.classes,
                    "active_sessions": active,
                }),
            )
        })
        .collect();

    Json(json!({
        "status": "healthy",
        "categories": categories,
        "active_sessions": sessions.len(),
    }))
}

/// One entry of the category listing.
#[derive(Debug, Serialize)]
pub struct CategoryDescription {
    #[serde(flatten)]
    pub info: RecognizerInfo,
    pub labels: Vec<String>,
    pub stabilizer: StabilizerConfig,
    pub min_nonzero_ratio: f32,
}

/// List categories with their effective stabilization parameters
pub async fn list_categories(State(state): State<Arc<AppState>>) -> Json<Value> {
    let categories: Vec<CategoryDescription> = state
        .core_state
        .recognizers()
        .iter()
        .map(|recognizer| CategoryDescription {
            info: recognizer.info(),
            labels: recognizer.labels().to_vec(),
            stabilizer: recognizer.config().stabilizer_config(),
            min_nonzero_ratio: recognizer.config().min_nonzero_ratio,
        })
        .collect();

    Json(json!({ "categories": categories }))
}
