use serde::{Deserialize, Serialize};

use super::labels::LabelCase;
use super::stability::StabilityConfig;

/// Stabilization parameters of one recognition category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilizerConfig {
    /// Raw predictions at or below this confidence are not voted; smoothed
    /// confidence must reach it to grow the stable count.
    pub confidence_threshold: f32,
    /// Size of the prediction history FIFO.
    pub history_size: usize,
    /// Minimum votes for the plurality label before a consensus exists.
    pub min_consistent: usize,
    pub stability: StabilityConfig,
    /// Frames skipped after a new or improved detection.
    pub cooldown_frames: u32,
    /// Upper bound of the stable count.
    pub stable_window: u32,
    /// Stable count required for `stable = true`.
    pub min_stable_count: u32,
    /// Smoothed confidence must exceed this before a consensus is reported.
    pub min_smoothed_confidence: f32,
    pub label_case: LabelCase,
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            history_size: 10,
            min_consistent: 2,
            stability: StabilityConfig::default(),
            cooldown_frames: 3,
            stable_window: 3,
            min_stable_count: 2,
            min_smoothed_confidence: 0.5,
            label_case: LabelCase::AsIs,
        }
    }
}
