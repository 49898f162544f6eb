//! Feature normalization strategies.

use serde::{Deserialize, Serialize};

use crate::core::error::{RecognitionError, RecognitionResult};

use super::stats::FeatureStats;

/// Values per single-hand landmark block (21 points x 3 coordinates).
pub const HAND_BLOCK_WIDTH: usize = 63;

const ROBUST_STD_FLOOR: f32 = 1e-6;
const ROBUST_CLIP: f32 = 5.0;

/// How model inputs are normalized before inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalization {
    /// Raw landmark values.
    #[default]
    None,
    /// Centre on the mean point, scale by the global std, clip to +-5.
    Robust,
    /// Shift each hand so its bounding box starts at the origin in x and y.
    HandBox,
    /// Per-feature z-score using stored mean/std vectors.
    FeatureStats,
}

impl Normalization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Robust => "robust",
            Self::HandBox => "hand_box",
            Self::FeatureStats => "feature_stats",
        }
    }
}

/// Robust sequence normalization.
///
/// Every frame is viewed as `width / 3` xyz points. The mean point over all
/// frames ignores NaN and infinite components (an axis with no defined
/// values centres on 0), the global standard deviation of the centred coordinates is floored at
/// `1e-6`, and the scaled result is clipped to `[-5, 5]`. Coordinates that
/// were not finite on input come out as 0.
pub fn robust_normalize(frames: &mut [Vec<f32>]) -> RecognitionResult<()> {
    let Some(width) = frames.first().map(Vec::len) else {
        return Err(RecognitionError::InvalidInputShape(
            "cannot normalize an empty sequence".to_string(),
        ));
    };
    if width == 0 || width % 3 != 0 || frames.iter().any(|f| f.len() != width) {
        return Err(RecognitionError::InvalidInputShape(format!(
            "robust normalization needs rectangular xyz frames, got width {width}"
        )));
    }

    let mut sums = [0f64; 3];
    let mut counts = [0usize; 3];
    for frame in frames.iter() {
        for (i, value) in frame.iter().enumerate() {
            if value.is_finite() {
                sums[i % 3] += f64::from(*value);
                counts[i % 3] += 1;
            }
        }
    }
    let center: [f64; 3] = std::array::from_fn(|axis| {
        if counts[axis] == 0 {
            0.0
        } else {
            sums[axis] / counts[axis] as f64
        }
    });

    let mut sum = 0f64;
    let mut sum_sq = 0f64;
    let mut defined = 0usize;
    for frame in frames.iter_mut() {
        for (i, value) in frame.iter_mut().enumerate() {
            if !value.is_finite() {
                continue;
            }
            let centred = f64::from(*value) - center[i % 3];
            *value = centred as f32;
            sum += centred;
            sum_sq += centred * centred;
            defined += 1;
        }
    }

    let std = if defined == 0 {
        0.0
    } else {
        let mean = sum / defined as f64;
        (sum_sq / defined as f64 - mean * mean).max(0.0).sqrt()
    };
    let std = (std as f32).max(ROBUST_STD_FLOOR);

    for value in frames.iter_mut().flat_map(|frame| frame.iter_mut()) {
        *value = if !value.is_finite() {
            0.0
        } else {
            (*value / std).clamp(-ROBUST_CLIP, ROBUST_CLIP)
        };
    }

    Ok(())
}

/// Shift every 63-wide hand block so its minimum x and y become 0.
///
/// Z coordinates are left untouched; trailing values that do not fill a whole
/// hand block are ignored.
pub fn hand_box_normalize(frame: &mut [f32]) {
    for hand in frame.chunks_exact_mut(HAND_BLOCK_WIDTH) {
        let min_x = hand.iter().step_by(3).copied().fold(f32::INFINITY, f32::min);
        let min_y = hand
            .iter()
            .skip(1)
            .step_by(3)
            .copied()
            .fold(f32::INFINITY, f32::min);

        for point in hand.chunks_exact_mut(3) {
            point[0] -= min_x;
            point[1] -= min_y;
        }
    }
}

/// Replace NaN and infinite coordinates with 0.
pub fn zero_non_finite(values: &mut [f32]) {
    for value in values.iter_mut().filter(|value| !value.is_finite()) {
        *value = 0.0;
    }
}

/// Apply `normalization` to already shaped model input frames.
///
/// Missing coordinates reach the model as 0 in every mode.
pub fn apply(
    normalization: Normalization,
    frames: &mut [Vec<f32>],
    stats: Option<&FeatureStats>,
) -> RecognitionResult<()> {
    if normalization == Normalization::Robust {
        return robust_normalize(frames);
    }

    frames.iter_mut().for_each(|frame| zero_non_finite(frame));
    match normalization {
        Normalization::None | Normalization::Robust => Ok(()),
        Normalization::HandBox => {
            frames.iter_mut().for_each(|frame| hand_box_normalize(frame));
            Ok(())
        }
        Normalization::FeatureStats => match stats {
            Some(stats) => frames.iter_mut().try_for_each(|frame| stats.apply(frame)),
            // Missing stats degrade to raw features.
            None => Ok(()),
        },
    }
}

/// Share of coordinates that are finite and non-zero.
pub fn nonzero_ratio<'a>(values: impl IntoIterator<Item = &'a f32>) -> f32 {
    let mut total = 0usize;
    let mut nonzero = 0usize;
    for value in values {
        total += 1;
        if *value != 0.0 && value.is_finite() {
            nonzero += 1;
        }
    }
    if total == 0 {
        0.0
    } else {
        nonzero as f32 / total as f32
    }
}
