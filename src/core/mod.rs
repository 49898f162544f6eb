pub mod classifier;
pub mod error;
pub mod preprocess;
pub mod recognizer;
pub mod session_store;
pub mod stabilizer;
pub mod state;

// Re-export commonly used types for convenience
pub use classifier::{Classifier, FnClassifier, InputShape, OnnxClassifier};
pub use error::{RecognitionError, RecognitionResult};
pub use preprocess::LandmarkInput;
pub use recognizer::{FrameOutcome, Prediction, Recognizer, RecognizerInfo};
pub use session_store::SessionStore;
pub use stabilizer::{Decision, SessionState, StabilizerConfig};

// Re-export CoreState for external use
pub use state::CoreState;
