//! Prediction stabilization: stability gating, smoothing by vote, and the
//! per-session confirmation state machine.

pub mod config;
pub mod labels;
pub mod session;
pub mod stability;
pub mod voting;

pub use config::StabilizerConfig;
pub use labels::LabelCase;
pub use session::{Completion, Decision, Gate, SessionState};
pub use stability::{StabilityConfig, StabilityDetector};
pub use voting::VotingAggregator;
