//! WebSocket message types
//!
//! This module defines all message types for WebSocket communication: the
//! incoming `predict`/`reset` requests and the outgoing `connected`,
//! `prediction`, `reset_response` and `error` events.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::error::RecognitionError;
use crate::core::preprocess::LandmarkInput;
use crate::core::recognizer::FrameOutcome;

/// WebSocket message types for incoming messages
#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum IncomingMessage {
    #[serde(rename = "predict")]
    Predict {
        /// One flat frame; `null` coordinates are treated as missing.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        landmarks: Option<Vec<Option<f32>>>,
        /// Frames in temporal order; takes precedence over `landmarks`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sequence: Option<Vec<Vec<Option<f32>>>>,
        /// Label the learner is expected to sign.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
    },
    #[serde(rename = "reset")]
    Reset,
}

fn to_frame(values: Vec<Option<f32>>) -> Vec<f32> {
    values
        .into_iter()
        .map(|value| value.unwrap_or(f32::NAN))
        .collect()
}

/// Turn a predict payload into landmark input; `None` when it has neither
/// `sequence` nor `landmarks`.
pub fn landmark_input(
    landmarks: Option<Vec<Option<f32>>>,
    sequence: Option<Vec<Vec<Option<f32>>>>,
) -> Option<LandmarkInput> {
    match (sequence, landmarks) {
        (Some(sequence), _) => Some(LandmarkInput::Sequence(
            sequence.into_iter().map(to_frame).collect(),
        )),
        (None, Some(frame)) => Some(LandmarkInput::Frame(to_frame(frame))),
        (None, None) => None,
    }
}

/// Body of a `prediction` event.
///
/// Exactly one is sent for every inbound `predict`, whatever happened to it.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PredictionEvent {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed: Option<bool>,
    #[serde(rename = "stableCount", skip_serializing_if = "Option::is_none")]
    pub stable_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_predictions: Option<BTreeMap<String, f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PredictionEvent {
    fn not_yet(error: &str, status: &'static str) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            status,
            ..Default::default()
        }
    }

    /// A request that could not be read.
    pub fn invalid(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            status: "invalid_input",
            ..Default::default()
        }
    }

    pub fn from_outcome(outcome: FrameOutcome) -> Self {
        let status = outcome.status();
        match outcome {
            FrameOutcome::NoDetection { nonzero_ratio } => Self {
                success: true,
                status,
                message: Some(RecognitionError::InsufficientSignal { nonzero_ratio }.to_string()),
                ..Default::default()
            },
            FrameOutcome::Cooldown { .. } => Self::not_yet("Cooldown active", status),
            FrameOutcome::Unstable => Self::not_yet("Hand not stable", status),
            FrameOutcome::BelowThreshold { raw } => Self {
                success: false,
                error: Some(
                    RecognitionError::BelowConfidenceThreshold {
                        label: raw.label.clone(),
                        confidence: raw.confidence,
                    }
                    .to_string(),
                ),
                label: Some(raw.label),
                confidence: Some(raw.confidence),
                all_predictions: Some(raw.probabilities),
                status,
                ..Default::default()
            },
            FrameOutcome::BuildingHistory { .. } => {
                Self::not_yet("Building prediction history", status)
            }
            FrameOutcome::Decided { decision, raw } => Self {
                success: true,
                label: Some(decision.label),
                confidence: Some(decision.confidence),
                stable: Some(decision.stable),
                confirmed: Some(decision.confirmed),
                stable_count: Some(decision.stable_count),
                all_predictions: Some(raw.probabilities),
                status,
                ..Default::default()
            },
        }
    }

    pub fn from_error(error: &RecognitionError) -> Self {
        match error {
            RecognitionError::InsufficientSignal { .. } => Self {
                success: true,
                status: error.status(),
                message: Some(error.to_string()),
                ..Default::default()
            },
            RecognitionError::BelowConfidenceThreshold { label, confidence } => Self {
                success: false,
                label: Some(label.clone()),
                confidence: Some(*confidence),
                error: Some(error.to_string()),
                status: error.status(),
                ..Default::default()
            },
            _ => Self {
                success: false,
                error: Some(error.to_string()),
                status: error.status(),
                ..Default::default()
            },
        }
    }
}

/// WebSocket message types for outgoing messages
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum OutgoingMessage {
    #[serde(rename = "connected")]
    Connected {
        session_id: String,
        category: String,
        /// Values per frame the client must send
        input_width: usize,
        /// Frames per sample for sequence categories
        sequence_length: Option<usize>,
        labels: Vec<String>,
    },
    #[serde(rename = "prediction")]
    Prediction(PredictionEvent),
    #[serde(rename = "reset_response")]
    ResetResponse { success: bool },
    #[serde(rename = "error")]
    Error { message: String },
}
