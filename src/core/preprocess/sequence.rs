//! Temporal shaping of landmark sequences.

use crate::core::error::{RecognitionError, RecognitionResult};

/// Check that a sequence is non-empty, rectangular and made of xyz triples.
///
/// Returns the common frame width. When `expected_width` is given, every
/// frame must have exactly that many values.
pub fn validate_frames(frames: &[Vec<f32>], expected_width: Option<usize>) -> RecognitionResult<usize> {
    let first = frames
        .first()
        .ok_or_else(|| RecognitionError::InvalidInputShape("sequence is empty".to_string()))?;
    let width = first.len();

    if width == 0 || width % 3 != 0 {
        return Err(RecognitionError::InvalidInputShape(format!(
            "frame width {width} is not a positive multiple of 3"
        )));
    }

    if let Some(index) = frames.iter().position(|frame| frame.len() != width) {
        return Err(RecognitionError::InvalidInputShape(format!(
            "frame {index} has {} values, expected {width}",
            frames[index].len()
        )));
    }

    if let Some(expected) = expected_width
        && expected != width
    {
        return Err(RecognitionError::InvalidInputShape(format!(
            "expected {expected} features per frame, got {width}"
        )));
    }

    Ok(width)
}

/// Bring a sequence to exactly `target_len` frames.
///
/// Short sequences are padded by repeating their last frame. Long sequences
/// keep the centred window that starts at `(len - target_len) / 2`.
pub fn pad_or_trim(mut frames: Vec<Vec<f32>>, target_len: usize) -> RecognitionResult<Vec<Vec<f32>>> {
    let len = frames.len();
    let Some(last) = frames.last().cloned() else {
        return Err(RecognitionError::InvalidInputShape(
            "cannot pad an empty sequence".to_string(),
        ));
    };

    if len < target_len {
        frames.resize(target_len, last);
    } else if len > target_len {
        let start = (len - target_len) / 2;
        frames.truncate(start + target_len);
        frames.drain(..start);
    }

    Ok(frames)
}
