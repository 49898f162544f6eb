//! Inference adapters.
//!
//! Every recognition category talks to its model through the [`Classifier`]
//! trait: a flat, fixed-shape input sample in, one probability per label out.
//! The input width is always declared, either by the model's static input
//! dimensions or by the category configuration; nothing is probed.
//!
//! # Feature Flags
//!
//! - `onnx` (default): [`OnnxClassifier`] runs models through ONNX Runtime.
//!   When disabled, a stub is compiled whose loader always fails.
//!
//! [`FnClassifier`] wraps an ordinary function and is available regardless of
//! features.

pub mod adapter;
pub mod assets;
pub mod base;
pub mod config;
pub mod function;
#[cfg(feature = "onnx")]
pub mod model_manager;

#[cfg(not(feature = "onnx"))]
mod stub;

pub use adapter::InputAdapter;
pub use base::{Classifier, InputShape, argmax, softmax, to_probabilities};
pub use config::{GraphOptimizationLevel, OnnxConfig};
pub use function::FnClassifier;

#[cfg(feature = "onnx")]
pub use model_manager::OnnxClassifier;
#[cfg(not(feature = "onnx"))]
pub use stub::OnnxClassifier;

/// Shape hints from category configuration, used where a model leaves its
/// input dimensions dynamic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeclaredShape {
    pub frames: Option<usize>,
    pub width: Option<usize>,
}
