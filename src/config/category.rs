//! Recognition category configuration and built-in presets
//!
//! Each category is one instance of the shared recognition pipeline. The
//! presets reproduce the behaviour of the dedicated per-category servers the
//! service replaces; YAML can override any field or define new categories.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::classifier::DeclaredShape;
use crate::core::preprocess::Normalization;
use crate::core::stabilizer::{LabelCase, StabilityConfig, StabilizerConfig};

/// Whether a category classifies single frames or frame sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryMode {
    Static,
    Sequence,
}

impl CategoryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Sequence => "sequence",
        }
    }
}

/// Client frame width for two hands (2 x 21 points x 3 coordinates).
pub const TWO_HAND_WIDTH: usize = 126;
/// Client frame width for face + pose + both hands.
pub const HOLISTIC_WIDTH: usize = 1629;

/// Smoothed confidence a consensus must exceed before it is reported.
const MIN_SMOOTHED_CONFIDENCE: f32 = 0.5;

/// Names of the built-in presets, in the order they are listed.
pub const PRESET_NAMES: &[&str] = &[
    "letters",
    "numbers",
    "days",
    "static_words",
    "colours",
    "words",
    "sentences",
];

/// Full parameter set of one recognition category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryConfig {
    pub name: String,
    /// Model file, relative to `models_dir` unless absolute.
    pub model_path: PathBuf,
    /// Labels file (`.json` array/object or one label per line).
    pub labels_path: PathBuf,
    /// Feature statistics (`.npz` with `mean` and `std`), for `feature_stats`.
    pub stats_path: Option<PathBuf>,
    pub mode: CategoryMode,
    /// Values per frame sent by clients.
    pub frame_width: usize,
    /// Model input width, required when the model leaves it dynamic.
    pub model_input_width: Option<usize>,
    /// Frames per sample for sequence categories.
    pub sequence_length: Option<usize>,
    pub normalization: Normalization,
    pub label_case: LabelCase,
    pub confidence_threshold: f32,
    pub history_size: usize,
    pub min_consistent: usize,
    pub stability: StabilityConfig,
    pub cooldown_frames: u32,
    pub stable_window: u32,
    pub min_stable_count: u32,
    /// Inputs with a smaller share of non-zero coordinates are "no detection".
    pub min_nonzero_ratio: f32,
    /// Allow zero-padding/truncating client frames to the model width.
    pub pad_or_truncate_width: bool,
}

impl CategoryConfig {
    /// Look up a built-in preset by name (case-insensitive).
    pub fn preset(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        let config = match name.as_str() {
            "letters" => Self::static_preset(&name, LabelCase::Upper, 0.7),
            "numbers" => Self {
                normalization: Normalization::FeatureStats,
                stats_path: Some(PathBuf::from("numbers/feature_stats.npz")),
                ..Self::static_preset(&name, LabelCase::Upper, 0.6)
            },
            "days" => Self::static_preset(&name, LabelCase::Title, 0.6),
            "static_words" => Self {
                normalization: Normalization::HandBox,
                history_size: 5,
                min_consistent: 5,
                cooldown_frames: 8,
                ..Self::static_preset(&name, LabelCase::Title, 0.7)
            },
            "colours" => Self::sequence_preset(&name, 30, 0.6),
            "words" => Self::sequence_preset(&name, 30, 0.7),
            "sentences" => Self::sequence_preset(&name, 60, 0.3),
            _ => return None,
        };
        Some(config)
    }

    fn static_preset(name: &str, label_case: LabelCase, confidence_threshold: f32) -> Self {
        Self {
            name: name.to_string(),
            model_path: PathBuf::from(format!("{name}/model.onnx")),
            labels_path: PathBuf::from(format!("{name}/labels.json")),
            stats_path: None,
            mode: CategoryMode::Static,
            frame_width: TWO_HAND_WIDTH,
            model_input_width: None,
            sequence_length: None,
            normalization: Normalization::None,
            label_case,
            confidence_threshold,
            history_size: 10,
            min_consistent: 2,
            stability: StabilityConfig::default(),
            cooldown_frames: 3,
            stable_window: 3,
            min_stable_count: 2,
            min_nonzero_ratio: 0.3,
            pad_or_truncate_width: false,
        }
    }

    fn sequence_preset(name: &str, sequence_length: usize, confidence_threshold: f32) -> Self {
        Self {
            mode: CategoryMode::Sequence,
            frame_width: HOLISTIC_WIDTH,
            sequence_length: Some(sequence_length),
            normalization: Normalization::Robust,
            stability: StabilityConfig {
                enabled: false,
                ..StabilityConfig::default()
            },
            // Holistic frames are mostly face points; only reject empty input.
            min_nonzero_ratio: 0.0,
            ..Self::static_preset(name, LabelCase::Title, confidence_threshold)
        }
    }

    /// Stabilizer settings for sessions of this category.
    pub fn stabilizer_config(&self) -> StabilizerConfig {
        StabilizerConfig {
            confidence_threshold: self.confidence_threshold,
            history_size: self.history_size,
            min_consistent: self.min_consistent,
            stability: self.stability.clone(),
            cooldown_frames: self.cooldown_frames,
            stable_window: self.stable_window,
            min_stable_count: self.min_stable_count,
            min_smoothed_confidence: MIN_SMOOTHED_CONFIDENCE,
            label_case: self.label_case,
        }
    }

    /// Shape hints for models with dynamic input dimensions.
    pub fn declared_shape(&self) -> DeclaredShape {
        DeclaredShape {
            frames: self.sequence_length,
            width: self.model_input_width,
        }
    }
}
