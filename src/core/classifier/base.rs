use std::fmt;

use crate::core::error::{RecognitionError, RecognitionResult};

/// Input layout a classifier expects for one sample (batch dimension excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputShape {
    /// Frames per sample for sequence models, `None` for single-frame models.
    pub frames: Option<usize>,
    /// Values per frame.
    pub width: usize,
}

impl InputShape {
    pub fn single(width: usize) -> Self {
        Self {
            frames: None,
            width,
        }
    }

    pub fn sequence(frames: usize, width: usize) -> Self {
        Self {
            frames: Some(frames),
            width,
        }
    }

    /// Total number of values in one flattened sample.
    pub fn len(&self) -> usize {
        self.frames.unwrap_or(1) * self.width
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for InputShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.frames {
            Some(frames) => write!(f, "[{frames}, {}]", self.width),
            None => write!(f, "[{}]", self.width),
        }
    }
}

/// Opaque classifier: a flat input sample in, one probability per label out.
///
/// Implementations must be safe to share between sessions; `predict` takes
/// `&self` and may be called concurrently from blocking worker threads.
pub trait Classifier: Send + Sync {
    /// Shape of the flattened sample passed to [`Classifier::predict`].
    fn input_shape(&self) -> InputShape;

    /// Labels in output order, already canonicalized.
    fn labels(&self) -> &[String];

    /// Run inference on one sample of `input_shape().len()` values.
    fn predict(&self, input: &[f32]) -> RecognitionResult<Vec<f32>>;

    /// Short backend name for health output and logs.
    fn backend(&self) -> &'static str {
        "custom"
    }

    /// Run one all-zero sample so graph initialization happens before the
    /// first real request, and confirm the output width matches the labels.
    fn warm_up(&self) -> RecognitionResult<()> {
        let probabilities = self.predict(&vec![0.0; self.input_shape().len()])?;
        check_output_width(&probabilities, self.labels())
    }
}

/// Turn raw model outputs into a probability distribution.
///
/// Outputs that already look like probabilities (non-negative, summing to
/// about 1) are returned unchanged; anything else is treated as logits.
pub fn to_probabilities(outputs: Vec<f32>) -> Vec<f32> {
    let sum: f32 = outputs.iter().sum();
    let is_distribution =
        outputs.iter().all(|p| p.is_finite() && *p >= 0.0) && (sum - 1.0).abs() < 1e-3;
    if is_distribution {
        return outputs;
    }
    softmax(&outputs)
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|v| (v - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|v| v / total).collect()
}

/// Index and value of the largest probability (first one wins on ties).
pub fn argmax(probabilities: &[f32]) -> Option<(usize, f32)> {
    probabilities
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, p)| match best {
            Some((_, best_p)) if best_p >= p => best,
            _ => Some((i, p)),
        })
}

/// Check the output of a classifier against its label set.
pub fn check_output_width(probabilities: &[f32], labels: &[String]) -> RecognitionResult<()> {
    if probabilities.len() != labels.len() {
        return Err(RecognitionError::Inference(format!(
            "model returned {} scores for {} labels",
            probabilities.len(),
            labels.len()
        )));
    }
    Ok(())
}
