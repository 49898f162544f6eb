//! Recognition error types shared by the preprocessing, inference and
//! stabilization layers.

use thiserror::Error;

/// Errors produced while turning landmarks into a prediction.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RecognitionError {
    /// The classifier for a category could not be loaded or is missing.
    #[error("Model not loaded: {0}")]
    ClassifierUnavailable(String),

    /// The payload does not have the shape the category expects.
    #[error("Invalid input shape: {0}")]
    InvalidInputShape(String),

    /// Too few non-zero coordinates to be worth classifying.
    #[error("No hand detected ({:.0}% non-zero coordinates)", .nonzero_ratio * 100.0)]
    InsufficientSignal { nonzero_ratio: f32 },

    /// The best raw prediction did not reach the category's confidence floor.
    #[error("Confidence {confidence:.2} below threshold")]
    BelowConfidenceThreshold { label: String, confidence: f32 },

    /// The classifier failed while running a request.
    #[error("Inference failed: {0}")]
    Inference(String),
}

impl RecognitionError {
    /// Wire status reported alongside this error in `prediction` events.
    pub fn status(&self) -> &'static str {
        match self {
            Self::ClassifierUnavailable(_) | Self::Inference(_) => "classifier_error",
            Self::InvalidInputShape(_) => "invalid_input",
            Self::InsufficientSignal { .. } => "no_detection",
            Self::BelowConfidenceThreshold { .. } => "below_threshold",
        }
    }
}

pub type RecognitionResult<T> = Result<T, RecognitionError>;
