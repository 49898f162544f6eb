use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use ort::session::Session;
use ort::session::builder::SessionBuilder;
use ort::value::{Tensor, Value};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::core::error::{RecognitionError, RecognitionResult};

use super::base::{Classifier, InputShape, check_output_width, to_probabilities};
use super::config::OnnxConfig;
use super::DeclaredShape;

/// Classifier backed by an ONNX Runtime session.
///
/// `ort` needs exclusive access to run a session, so concurrent callers queue
/// on the session mutex. Each call is short and always runs on a blocking
/// worker thread.
pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    shape: InputShape,
    labels: Vec<String>,
    model_path: PathBuf,
}

impl OnnxClassifier {
    /// Load a model without blocking the async runtime.
    pub async fn load(
        model_path: PathBuf,
        labels: Vec<String>,
        declared: DeclaredShape,
        config: OnnxConfig,
    ) -> Result<Self> {
        tokio::task::spawn_blocking(move || Self::load_blocking(&model_path, labels, declared, &config))
            .await
            .context("Failed to spawn blocking task for ONNX model loading")?
    }

    pub fn load_blocking(
        model_path: &Path,
        labels: Vec<String>,
        declared: DeclaredShape,
        config: &OnnxConfig,
    ) -> Result<Self> {
        info!("Loading ONNX model from: {:?}", model_path);

        let session = Self::create_session(model_path, config)?;

        let input = session.inputs.first().context("Model has no inputs")?;
        let dims: Vec<i64> = input
            .input_type
            .tensor_shape()
            .context("Model input is not a tensor")?
            .iter()
            .copied()
            .collect();
        let shape = resolve_shape(&dims, declared)?;
        let input_name = input.name.clone();

        let output = session.outputs.first().context("Model has no outputs")?;
        if let Some(&classes) = output
            .output_type
            .tensor_shape()
            .and_then(|shape| shape.last())
            && classes > 0
            && classes as usize != labels.len()
        {
            bail!(
                "Model {:?} has {} output classes but {} labels were loaded",
                model_path,
                classes,
                labels.len()
            );
        }
        let output_name = output.name.clone();

        debug!(
            "Model {:?}: input '{}' {:?} -> {}, output '{}'",
            model_path, input_name, dims, shape, output_name
        );

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            shape,
            labels,
            model_path: model_path.to_path_buf(),
        })
    }

    fn create_session(model_path: &Path, config: &OnnxConfig) -> Result<Session> {
        let mut builder = SessionBuilder::new()?
            .with_optimization_level(config.graph_optimization_level.to_ort_level())?;

        if let Some(num_threads) = config.num_threads {
            builder = builder
                .with_intra_threads(num_threads)?
                .with_inter_threads(1)?;
        }

        let session = builder
            .commit_from_file(model_path)
            .with_context(|| format!("Failed to load ONNX model {}", model_path.display()))?;

        Ok(session)
    }

    fn run(&self, input: &[f32]) -> Result<Vec<f32>> {
        let data = input.to_vec();
        let tensor = match self.shape.frames {
            Some(frames) => Tensor::from_array(([1usize, frames, self.shape.width], data))?,
            None => Tensor::from_array(([1usize, self.shape.width], data))?,
        };
        let inputs: Vec<(&str, Value)> = vec![(self.input_name.as_str(), tensor.into())];

        let mut session = self.session.lock();
        let outputs = session.run(inputs)?;
        let (_, scores) = outputs
            .get(self.output_name.as_str())
            .context("No output from model")?
            .try_extract_tensor::<f32>()
            .context("Failed to extract tensor")?;

        Ok(scores.to_vec())
    }
}

impl Classifier for OnnxClassifier {
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

        let scores = self
            .run(input)
            .map_err(|e| {
                RecognitionError::Inference(format!("{}: {e}", self.model_path.display()))
            })?;
        let probabilities = to_probabilities(scores);
        check_output_width(&probabilities, &self.labels)?;
        Ok(probabilities)
    }

    fn backend(&self) -> &'static str {
        "onnx"
    }
}

/// Work out the per-sample input shape from the model's declared dimensions.
///
/// Rank 2 inputs are `[batch, width]`, rank 3 inputs `[batch, frames, width]`.
/// Dynamic dimensions (negative values) are filled from `declared`; static
/// dimensions must agree with it.
fn resolve_shape(dims: &[i64], declared: DeclaredShape) -> Result<InputShape> {
    let fixed = |dim: i64| usize::try_from(dim).ok().filter(|d| *d > 0);

    let (frames_dim, width_dim) = match dims {
        [_, width] => (None, *width),
        [_, frames, width] => (Some(*frames), *width),
        other => bail!("Unsupported model input rank {} ({:?})", other.len(), other),
    };

    let width = match (fixed(width_dim), declared.width) {
        (Some(model), Some(config)) if model != config => bail!(
            "Model input width is {model} but the category declares {config}"
        ),
        (Some(model), _) => model,
        (None, Some(config)) => config,
        (None, None) => bail!(
            "Model input width is dynamic; set model_input_width for this category"
        ),
    };

    let frames = match frames_dim {
        None => None,
        Some(dim) => match (fixed(dim), declared.frames) {
            (Some(model), Some(config)) if model != config => bail!(
                "Model expects {model} frames but the category declares sequence_length {config}"
            ),
            (Some(model), _) => Some(model),
            (None, Some(config)) => Some(config),
            (None, None) => bail!("Model frame count is dynamic; set sequence_length"),
        },
    };

    Ok(InputShape { frames, width })
}
