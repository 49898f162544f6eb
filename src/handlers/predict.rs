use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State, rejection::JsonRejection},
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::error::RecognitionError;
use crate::errors::{AppError, AppResult};
use crate::handlers::ws::messages::landmark_input;
use crate::state::AppState;

/// Request body for the one-shot predict endpoint
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    /// One flat frame
    #[serde(default)]
    pub landmarks: Option<Vec<Option<f32>>>,
    /// Frames in temporal order; takes precedence over `landmarks`
    #[serde(default)]
    pub sequence: Option<Vec<Vec<Option<f32>>>>,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub success: bool,
    pub label: String,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_predictions: Option<BTreeMap<String, f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Classify one frame or sequence without any session state.
///
/// A prediction below the category's threshold is still a 200, with
/// `success: false` and the raw label and confidence.
pub async fn predict_handler(
    Path(category): Path<String>,
    State(state): State<Arc<AppState>>,
    body: Result<Json<PredictRequest>, JsonRejection>,
) -> AppResult<Json<PredictResponse>> {
    let recognizer = state
        .recognizer(&category)
        .ok_or_else(|| AppError::NotFound(format!("Unknown category '{category}'")))?;

    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let input = landmark_input(request.landmarks, request.sequence)
        .ok_or_else(|| AppError::BadRequest("No landmarks provided".to_string()))?;

    match recognizer.predict_once(input).await {
        Ok(prediction) => {
            info!(
                "One-shot '{}' prediction: {} ({:.2})",
                recognizer.name(),
                prediction.label,
                prediction.confidence
            );
            Ok(Json(PredictResponse {
                success: true,
                label: prediction.label,
                confidence: prediction.confidence,
                all_predictions: Some(prediction.probabilities),
                error: None,
            }))
        }
        Err(RecognitionError::BelowConfidenceThreshold { label, confidence }) => {
            let error = RecognitionError::BelowConfidenceThreshold {
                label: label.clone(),
                confidence,
            }
            .to_string();
            Ok(Json(PredictResponse {
                success: false,
                label,
                confidence,
                all_predictions: None,
                error: Some(error),
            }))
        }
        Err(e) => {
            warn!("One-shot '{}' prediction failed: {}", recognizer.name(), e);
            Err(e.into())
        }
    }
}
