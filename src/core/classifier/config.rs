use serde::{Deserialize, Serialize};

/// Runtime options for ONNX sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnnxConfig {
    /// Intra-op threads per session; `None` lets ONNX Runtime decide.
    pub num_threads: Option<usize>,
    pub graph_optimization_level: GraphOptimizationLevel,
}

impl Default for OnnxConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            graph_optimization_level: GraphOptimizationLevel::Level3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphOptimizationLevel {
    Disabled,
    Basic,
    Extended,
    Level3,
}

#[cfg(feature = "onnx")]
impl GraphOptimizationLevel {
    pub fn to_ort_level(&self) -> ort::session::builder::GraphOptimizationLevel {
        use ort::session::builder::GraphOptimizationLevel as Ort;
        match self {
            Self::Disabled => Ort::Disable,
            Self::Basic => Ort::Level1,
            Self::Extended => Ort::Level2,
            Self::Level3 => Ort::Level3,
        }
    }
}
