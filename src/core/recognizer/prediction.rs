use std::collections::BTreeMap;

use serde::Serialize;

use crate::core::classifier::argmax;
use crate::core::error::{RecognitionError, RecognitionResult};
use crate::core::stabilizer::Decision;

/// Raw result of one inference call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
    /// Probability of every label.
    pub probabilities: BTreeMap<String, f32>,
}

impl Prediction {
    /// Pair a probability vector with its labels and pick the winner.
    pub fn from_probabilities(labels: &[String], probabilities: &[f32]) -> RecognitionResult<Self> {
        if labels.len() != probabilities.len() {
            return Err(RecognitionError::Inference(format!(
                "model returned {} scores for {} labels",
                probabilities.len(),
                labels.len()
            )));
        }

        let (index, confidence) = argmax(probabilities)
            .ok_or_else(|| RecognitionError::Inference("model returned no scores".to_string()))?;

        Ok(Self {
            label: labels[index].clone(),
            confidence,
            probabilities: labels
                .iter()
                .cloned()
                .zip(probabilities.iter().copied())
                .collect(),
        })
    }
}

/// What happened to one frame sent on a session.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Too little signal to classify; the session state was not touched.
    NoDetection { nonzero_ratio: f32 },
    /// A recent detection is cooling down.
    Cooldown { remaining: u32 },
    /// The hand is moving or the stability window is filling.
    Unstable,
    /// The raw prediction was at or below the confidence floor, so it was
    /// not voted and no consensus exists.
    BelowThreshold { raw: Prediction },
    /// Inference ran but the vote has no consensus yet.
    BuildingHistory { raw: Prediction },
    /// A smoothed decision, with the raw prediction it was built from.
    Decided { decision: Decision, raw: Prediction },
}

impl FrameOutcome {
    /// Wire status of this outcome.
    pub fn status(&self) -> &'static str {
        match self {
            Self::NoDetection { .. } => "no_detection",
            Self::Cooldown { .. } => "cooldown",
            Self::Unstable => "unstable",
            Self::BelowThreshold { .. } => "below_threshold",
            Self::BuildingHistory { .. } => "building_history",
            Self::Decided { .. } => "ok",
        }
    }
}
