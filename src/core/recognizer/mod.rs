//! # Recognizer
//!
//! Ties the pieces of one recognition category together: landmarks are
//! validated and gated on signal strength, the session's confirmation state
//! machine decides whether inference should run, and the shared classifier
//! produces a raw prediction that the stabilizer smooths into a decision.
//!
//! ```text
//! landmarks -> Preprocessor::check -> SessionState::begin
//!           -> Preprocessor::finish + Classifier::predict (blocking worker)
//!           -> SessionState::complete -> FrameOutcome
//! ```
//!
//! One [`Recognizer`] exists per configured category and is shared by all of
//! its sessions; each session owns its own [`SessionState`](crate::core::stabilizer::SessionState).

mod engine;
mod prediction;

#[cfg(test)]
mod tests;

pub use engine::{Recognizer, RecognizerInfo};
pub use prediction::{FrameOutcome, Prediction};
