use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

use crate::core::error::{RecognitionError, RecognitionResult};

use super::DeclaredShape;
use super::base::{Classifier, InputShape};
use super::config::OnnxConfig;

/// Placeholder used when the `onnx` feature is disabled. Loading always fails,
/// so only categories served by other classifiers can start.
pub struct OnnxClassifier {
    shape: InputShape,
    labels: Vec<String>,
}

impl OnnxClassifier {
    pub async fn load(
        model_path: PathBuf,
        labels: Vec<String>,
        declared: DeclaredShape,
        config: OnnxConfig,
    ) -> Result<Self> {
        Self::load_blocking(&model_path, labels, declared, &config)
    }

    pub fn load_blocking(
        model_path: &Path,
        _labels: Vec<String>,
        _declared: DeclaredShape,
        _config: &OnnxConfig,
    ) -> Result<Self> {
        bail!(
            "Cannot load {:?}: edusign was built without the `onnx` feature",
            model_path
        )
    }
}

impl Classifier for OnnxClassifier {
    fn input_shape(&self) -> InputShape {
        self.shape
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, _input: &[f32]) -> RecognitionResult<Vec<f32>> {
        Err(RecognitionError::ClassifierUnavailable(
            "ONNX support is disabled".to_string(),
        ))
    }

    fn backend(&self) -> &'static str {
        "disabled"
    }
}
