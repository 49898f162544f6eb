use std::fmt;
use std::sync::Arc;

use crate::core::error::{RecognitionError, RecognitionResult};

use super::base::{Classifier, InputShape, check_output_width, to_probabilities};

type ScoreFn = dyn Fn(&[f32]) -> Vec<f32> + Send + Sync;

/// Classifier backed by a plain function.
///
/// Used to serve categories from in-process scoring code and to drive the
/// server deterministically in tests.
#[derive(Clone)]
pub struct FnClassifier {
    shape: InputShape,
    labels: Vec<String>,
    score: Arc<ScoreFn>,
}

impl FnClassifier {
    pub fn new<F>(shape: InputShape, labels: Vec<String>, score: F) -> Self
    where
        F: Fn(&[f32]) -> Vec<f32> + Send + Sync + 'static,
    {
        Self {
            shape,
            labels,
            score: Arc::new(score),
        }
    }

    /// A classifier whose winning label is the index stored in the first input
    /// value, with `confidence` probability.
    ///
    /// Inputs whose first value is not a valid label index get a uniform
    /// distribution.
    pub fn index_encoded(shape: InputShape, labels: Vec<String>, confidence: f32) -> Self {
        let count = labels.len();
        Self::new(shape, labels, move |input| {
            let uniform = vec![1.0 / count as f32; count];
            let Some(first) = input.first().copied() else {
                return uniform;
            };
            if first < 0.0 || first.fract() != 0.0 || first as usize >= count {
                return uniform;
            }
            let rest = if count > 1 {
                (1.0 - confidence) / (count - 1) as f32
            } else {
                0.0
            };
            let mut probabilities = vec![rest; count];
            probabilities[first as usize] = if count > 1 { confidence } else { 1.0 };
            probabilities
        })
    }
}

impl fmt::Debug for FnClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnClassifier")
            .field("shape", &self.shape)
            .field("labels", &self.labels)
            .finish()
    }
}

impl Classifier for FnClassifier {
    fn input_shape(&self) -> InputShape {
        self.shape
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, input: &[f32]) -> RecognitionResult<Vec<f32>> {
        if input.len() != self.shape.len() {
            return Err(RecognitionError::InvalidInputShape(format!(
                "model expects {} values, got {}",
                self.shape.len(),
                input.len()
            )));
        }
        let probabilities = to_probabilities((self.score)(input));
        check_output_width(&probabilities, &self.labels)?;
        Ok(probabilities)
    }

    fn backend(&self) -> &'static str {
        "function"
    }
}
