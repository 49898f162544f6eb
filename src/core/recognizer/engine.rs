use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{CategoryConfig, CategoryMode};
use crate::core::classifier::{Classifier, InputAdapter, OnnxClassifier, OnnxConfig, assets};
use crate::core::error::{RecognitionError, RecognitionResult};
use crate::core::preprocess::{FeatureStats, LandmarkInput, Normalization, Preprocessor};
use crate::core::stabilizer::{Completion, Gate, SessionState};

use super::prediction::{FrameOutcome, Prediction};

/// One recognition category: preprocessing, a shared classifier and the
/// stabilization settings handed to each new session.
///
/// Cheap to share behind an `Arc`; nothing here is mutated after loading.
pub struct Recognizer {
    config: CategoryConfig,
    preprocessor: Arc<Preprocessor>,
    classifier: Arc<dyn Classifier>,
    labels: Arc<Vec<String>>,
}

/// Readiness summary of a category.
#[derive(Debug, Clone, Serialize)]
pub struct RecognizerInfo {
    pub name: String,
    pub mode: &'static str,
    pub backend: &'static str,
    pub model_loaded: bool,
    /// Values per frame clients must send.
    pub input_width: usize,
    /// Values per frame the model receives.
    pub model_input_width: usize,
    pub sequence_length: Option<usize>,
    pub adapter: &'static str,
    pub normalization: &'static str,
    pub classes: usize,
    pub confidence_threshold: f32,
}

impl Recognizer {
    /// Load the labels, feature statistics and model of a category, then
    /// warm the model up.
    ///
    /// Every failure here is fatal for the category.
    pub async fn load(
        config: CategoryConfig,
        models_dir: &Path,
        onnx_config: &OnnxConfig,
    ) -> Result<Self> {
        info!(
            "Loading category '{}' ({} mode) from {:?}",
            config.name,
            config.mode.as_str(),
            models_dir
        );

        let labels_path = assets::resolve(models_dir, &config.labels_path)
            .with_context(|| format!("Labels for category '{}'", config.name))?;
        let labels = assets::load_labels(&labels_path, config.label_case)?;

        let stats = load_stats(&config, models_dir)?;

        let model_path = assets::resolve(models_dir, &config.model_path)
            .with_context(|| format!("Model for category '{}'", config.name))?;
        let classifier = OnnxClassifier::load(
            model_path,
            labels,
            config.declared_shape(),
            onnx_config.clone(),
        )
        .await
        .with_context(|| format!("Failed to load model for category '{}'", config.name))?;

        let recognizer = Self::with_classifier(config, Arc::new(classifier), stats)?;
        recognizer.warm_up().await?;

        info!(
            "Category '{}' ready: model input {}, {} labels, adapter {}",
            recognizer.name(),
            recognizer.classifier.input_shape(),
            recognizer.labels.len(),
            recognizer.preprocessor.adapter().name()
        );

        Ok(recognizer)
    }

    /// Build a category around an already-loaded classifier.
    ///
    /// Checks that the classifier's declared input fits the category and picks
    /// the width adapter.
    pub fn with_classifier(
        config: CategoryConfig,
        classifier: Arc<dyn Classifier>,
        stats: Option<FeatureStats>,
    ) -> RecognitionResult<Self> {
        let shape = classifier.input_shape();
        let unavailable =
            |reason: String| RecognitionError::ClassifierUnavailable(format!("{}: {reason}", config.name));

        let sequence_length = match (config.mode, shape.frames) {
            (CategoryMode::Static, None) => None,
            (CategoryMode::Static, Some(frames)) => {
                return Err(unavailable(format!(
                    "static category but the model expects {frames}-frame sequences"
                )));
            }
            (CategoryMode::Sequence, None) => {
                return Err(unavailable(
                    "sequence category but the model takes single frames".to_string(),
                ));
            }
            (CategoryMode::Sequence, Some(frames)) => {
                if config.sequence_length.is_some_and(|length| length != frames) {
                    return Err(unavailable(format!(
                        "sequence_length {:?} does not match the model's {frames} frames",
                        config.sequence_length
                    )));
                }
                Some(frames)
            }
        };

        let adapter =
            InputAdapter::select(config.frame_width, shape.width, config.pad_or_truncate_width)
                .map_err(|e| unavailable(e.to_string()))?;

        if let Some(stats) = &stats
            && stats.len() != shape.width
        {
            return Err(unavailable(format!(
                "feature stats have {} entries but the model expects {}",
                stats.len(),
                shape.width
            )));
        }

        let labels: Vec<String> = classifier
            .labels()
            .iter()
            .map(|label| config.label_case.canonicalize(label))
            .collect();
        if labels.is_empty() {
            return Err(unavailable("no labels".to_string()));
        }

        let preprocessor = Preprocessor::new(
            config.frame_width,
            sequence_length,
            config.normalization,
            config.min_nonzero_ratio,
            adapter,
            stats,
        );

        Ok(Self {
            config,
            preprocessor: Arc::new(preprocessor),
            classifier,
            labels: Arc::new(labels),
        })
    }

    async fn warm_up(&self) -> Result<()> {
        let classifier = self.classifier.clone();
        tokio::task::spawn_blocking(move || classifier.warm_up())
            .await
            .context("Failed to spawn blocking task for model warm-up")?
            .with_context(|| format!("Warm-up failed for category '{}'", self.config.name))?;
        debug!("Category '{}' warmed up", self.config.name);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &CategoryConfig {
        &self.config
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Frames per sample, for sequence categories.
    pub fn sequence_length(&self) -> Option<usize> {
        self.preprocessor.sequence_length()
    }

    pub fn info(&self) -> RecognizerInfo {
        RecognizerInfo {
            name: self.config.name.clone(),
            mode: self.config.mode.as_str(),
            backend: self.classifier.backend(),
            model_loaded: true,
            input_width: self.config.frame_width,
            model_input_width: self.classifier.input_shape().width,
            sequence_length: self.sequence_length(),
            adapter: self.preprocessor.adapter().name(),
            normalization: self.config.normalization.as_str(),
            classes: self.labels.len(),
            confidence_threshold: self.config.confidence_threshold,
        }
    }

    /// Fresh stabilization state for a new session of this category.
    pub fn new_session(&self) -> SessionState {
        SessionState::new(self.config.stabilizer_config())
    }

    /// Preprocess checked frames and classify them on a blocking worker.
    async fn infer(&self, frames: Vec<Vec<f32>>) -> RecognitionResult<Prediction> {
        let preprocessor = self.preprocessor.clone();
        let classifier = self.classifier.clone();
        let labels = self.labels.clone();

        tokio::task::spawn_blocking(move || {
            let sample = preprocessor.finish(frames)?;
            let probabilities = classifier.predict(&sample)?;
            Prediction::from_probabilities(&labels, &probabilities)
        })
        .await
        .map_err(|e| RecognitionError::Inference(format!("inference task failed: {e}")))?
    }

    /// Classify one input without any session state.
    ///
    /// Predictions under the category's confidence threshold come back as
    /// [`RecognitionError::BelowConfidenceThreshold`] carrying the raw result.
    pub async fn predict_once(&self, input: LandmarkInput) -> RecognitionResult<Prediction> {
        let frames = self.preprocessor.check(input)?;
        let prediction = self.infer(frames).await?;

        if prediction.confidence < self.config.confidence_threshold {
            debug!(
                "Low confidence for '{}': {} ({:.2}) < {}",
                self.config.name,
                prediction.label,
                prediction.confidence,
                self.config.confidence_threshold
            );
            return Err(RecognitionError::BelowConfidenceThreshold {
                label: prediction.label,
                confidence: prediction.confidence,
            });
        }

        Ok(prediction)
    }

    /// Run one frame (or sequence) of a session through validation, the
    /// confirmation state machine and, when it allows, inference.
    ///
    /// Shape errors and missing signal are decided before the session state
    /// is touched.
    pub async fn process(
        &self,
        session: &mut SessionState,
        input: LandmarkInput,
        target: Option<&str>,
    ) -> RecognitionResult<FrameOutcome> {
        let frames = match self.preprocessor.check(input) {
            Ok(frames) => frames,
            Err(RecognitionError::InsufficientSignal { nonzero_ratio }) => {
                return Ok(FrameOutcome::NoDetection { nonzero_ratio });
            }
            Err(e) => return Err(e),
        };

        let raw_frame = frames.last().cloned().unwrap_or_default();
        match session.begin(&raw_frame, target) {
            Gate::Cooldown { remaining } => return Ok(FrameOutcome::Cooldown { remaining }),
            Gate::Unstable => return Ok(FrameOutcome::Unstable),
            Gate::Proceed => {}
        }

        let raw = self.infer(frames).await?;
        debug!(
            "'{}' raw prediction {} ({:.2}) target={:?}",
            self.config.name, raw.label, raw.confidence, target
        );

        let floor = session.config().confidence_threshold;
        Ok(match session.complete(&raw.label, raw.confidence, target) {
            Completion::BuildingHistory if raw.confidence <= floor => {
                FrameOutcome::BelowThreshold { raw }
            }
            Completion::BuildingHistory => FrameOutcome::BuildingHistory { raw },
            Completion::Decided(decision) => FrameOutcome::Decided { decision, raw },
        })
    }
}

/// Feature statistics for `feature_stats` categories.
///
/// A missing file is not fatal: the category then serves raw features.
fn load_stats(config: &CategoryConfig, models_dir: &Path) -> Result<Option<FeatureStats>> {
    if config.normalization != Normalization::FeatureStats {
        return Ok(None);
    }
    let Some(path) = &config.stats_path else {
        return Ok(None);
    };

    let path: PathBuf = if path.is_absolute() {
        path.clone()
    } else {
        models_dir.join(path)
    };

    if !path.exists() {
        warn!(
            "Feature stats {:?} for category '{}' not found, using raw features",
            path, config.name
        );
        return Ok(None);
    }

    let stats = FeatureStats::from_npz(&path)?;
    debug!("Loaded {} feature stats from {:?}", stats.len(), path);
    Ok(Some(stats))
}
