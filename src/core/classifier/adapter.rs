//! Coercion of client frame widths to the model's declared input width.

use crate::core::error::{RecognitionError, RecognitionResult};

/// How a client frame of width `W` is turned into a model frame of width `M`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAdapter {
    /// `W == M`.
    Exact,
    /// `W == 2 * M`: keep whichever hand has more non-zero coordinates,
    /// preferring the second (right) hand on ties.
    DominantHand { hand_width: usize },
    /// Zero-pad or truncate to `M`.
    PadOrTruncate { width: usize },
}

impl InputAdapter {
    /// Pick the adapter for a category at startup.
    pub fn select(
        client_width: usize,
        model_width: usize,
        allow_pad_or_truncate: bool,
    ) -> RecognitionResult<Self> {
        if client_width == model_width {
            Ok(Self::Exact)
        } else if client_width == model_width * 2 {
            Ok(Self::DominantHand {
                hand_width: model_width,
            })
        } else if allow_pad_or_truncate {
            Ok(Self::PadOrTruncate { width: model_width })
        } else {
            Err(RecognitionError::ClassifierUnavailable(format!(
                "client frames have {client_width} values but the model expects {model_width}"
            )))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::DominantHand { .. } => "dominant_hand",
            Self::PadOrTruncate { .. } => "pad_or_truncate",
        }
    }

    pub fn adapt(&self, frame: Vec<f32>) -> Vec<f32> {
        match *self {
            Self::Exact => frame,
            Self::DominantHand { hand_width } => {
                let (left, right) = frame.split_at(hand_width.min(frame.len()));
                if count_nonzero(right) >= count_nonzero(left) {
                    right.to_vec()
                } else {
                    left.to_vec()
                }
            }
            Self::PadOrTruncate { width } => {
                let mut frame = frame;
                frame.resize(width, 0.0);
                frame
            }
        }
    }
}

fn count_nonzero(values: &[f32]) -> usize {
    values
        .iter()
        .filter(|v| **v != 0.0 && v.is_finite())
        .count()
}
