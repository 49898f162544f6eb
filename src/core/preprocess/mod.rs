//! Feature preprocessing: shape checks, signal gating, width adaptation,
//! temporal padding/trimming and normalization of landmark input.

pub mod normalize;
pub mod sequence;
pub mod stats;

pub use normalize::{Normalization, hand_box_normalize, nonzero_ratio, robust_normalize};
pub use sequence::{pad_or_trim, validate_frames};
pub use stats::FeatureStats;

use crate::core::classifier::InputAdapter;
use crate::core::error::{RecognitionError, RecognitionResult};

/// Landmark payload as received from a client.
#[derive(Debug, Clone, PartialEq)]
pub enum LandmarkInput {
    /// One flat frame.
    Frame(Vec<f32>),
    /// Frames in temporal order.
    Sequence(Vec<Vec<f32>>),
}

impl LandmarkInput {
    /// The most recent frame, used for stability tracking.
    pub fn last_frame(&self) -> Option<&[f32]> {
        match self {
            Self::Frame(frame) => Some(frame.as_slice()),
            Self::Sequence(frames) => frames.last().map(Vec::as_slice),
        }
    }
}

/// Turns client landmarks into a flat model input sample for one category.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    client_width: usize,
    sequence_length: Option<usize>,
    normalization: Normalization,
    min_nonzero_ratio: f32,
    adapter: InputAdapter,
    stats: Option<FeatureStats>,
}

impl Preprocessor {
    pub fn new(
        client_width: usize,
        sequence_length: Option<usize>,
        normalization: Normalization,
        min_nonzero_ratio: f32,
        adapter: InputAdapter,
        stats: Option<FeatureStats>,
    ) -> Self {
        Self {
            client_width,
            sequence_length,
            normalization,
            min_nonzero_ratio,
            adapter,
            stats,
        }
    }

    pub fn client_width(&self) -> usize {
        self.client_width
    }

    pub fn sequence_length(&self) -> Option<usize> {
        self.sequence_length
    }

    pub fn adapter(&self) -> InputAdapter {
        self.adapter
    }

    /// Validate the input shape and gate on signal strength.
    ///
    /// Returns the frames in the client width. Single-frame categories keep
    /// only the last frame of a sequence; sequence categories treat a single
    /// frame as a one-frame sequence.
    pub fn check(&self, input: LandmarkInput) -> RecognitionResult<Vec<Vec<f32>>> {
        let mut frames = match input {
            LandmarkInput::Frame(frame) => vec![frame],
            LandmarkInput::Sequence(frames) => frames,
        };
        validate_frames(&frames, Some(self.client_width))?;

        if self.sequence_length.is_none() && frames.len() > 1 {
            frames.drain(..frames.len() - 1);
        }

        let ratio = nonzero_ratio(frames.iter().flatten());
        if ratio == 0.0 || ratio < self.min_nonzero_ratio {
            return Err(RecognitionError::InsufficientSignal {
                nonzero_ratio: ratio,
            });
        }

        Ok(frames)
    }

    /// Full preprocessing: [`Preprocessor::check`] then [`Preprocessor::finish`].
    pub fn prepare(&self, input: LandmarkInput) -> RecognitionResult<Vec<f32>> {
        let frames = self.check(input)?;
        self.finish(frames)
    }

    /// Adapt widths, pad/trim to the sequence length, normalize and flatten
    /// frames that already passed [`Preprocessor::check`].
    pub fn finish(&self, frames: Vec<Vec<f32>>) -> RecognitionResult<Vec<f32>> {
        let mut frames: Vec<Vec<f32>> = frames
            .into_iter()
            .map(|frame| self.adapter.adapt(frame))
            .collect();

        if let Some(length) = self.sequence_length {
            frames = pad_or_trim(frames, length)?;
        }

        normalize::apply(self.normalization, &mut frames, self.stats.as_ref())?;

        Ok(frames.into_iter().flatten().collect())
    }
}
