//! Per-session confirmation state machine.
//!
//! Processing a frame is split in two so the caller can run inference
//! (blocking, potentially slow) between the phases:
//!
//! 1. [`SessionState::begin`] applies target changes, the cooldown countdown
//!    and the stability check, and says whether inference should run.
//! 2. [`SessionState::complete`] feeds the raw prediction to the vote and
//!    decides whether the result is stable and confirmed.

use serde::Serialize;
use tracing::debug;

use super::config::StabilizerConfig;
use super::stability::StabilityDetector;
use super::voting::VotingAggregator;

/// Result of the pre-inference phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// A recent detection is still cooling down; `remaining` frames after this one.
    Cooldown { remaining: u32 },
    /// The hand is moving or the stability window is not yet full.
    Unstable,
    /// Run inference and call [`SessionState::complete`].
    Proceed,
}

/// A smoothed decision for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub label: String,
    /// Vote share of `label` in the prediction history.
    pub confidence: f32,
    pub stable: bool,
    pub confirmed: bool,
    #[serde(rename = "stableCount")]
    pub stable_count: u32,
}

/// Result of the post-inference phase.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Not enough consistent votes yet.
    BuildingHistory,
    Decided(Decision),
}

/// Stabilization state owned by exactly one session.
#[derive(Debug, Clone)]
pub struct SessionState {
    config: StabilizerConfig,
    stability: StabilityDetector,
    voting: VotingAggregator,
    stable_count: u32,
    cooldown_remaining: u32,
    current_label: Option<String>,
    current_confidence: f32,
    last_target: Option<String>,
}

impl SessionState {
    pub fn new(config: StabilizerConfig) -> Self {
        let stability = StabilityDetector::new(config.stability.clone());
        let voting = VotingAggregator::new(
            config.history_size,
            config.min_consistent,
            config.confidence_threshold,
        );
        Self {
            config,
            stability,
            voting,
            stable_count: 0,
            cooldown_remaining: 0,
            current_label: None,
            current_confidence: 0.0,
            last_target: None,
        }
    }

    pub fn config(&self) -> &StabilizerConfig {
        &self.config
    }

    pub fn stable_count(&self) -> u32 {
        self.stable_count
    }

    pub fn cooldown_remaining(&self) -> u32 {
        self.cooldown_remaining
    }

    pub fn current_label(&self) -> Option<&str> {
        self.current_label.as_deref()
    }

    pub fn current_confidence(&self) -> f32 {
        self.current_confidence
    }

    pub fn last_target(&self) -> Option<&str> {
        self.last_target.as_deref()
    }

    pub fn history_len(&self) -> usize {
        self.voting.len()
    }

    /// Clear all stabilization state, keeping the remembered target.
    pub fn reset(&mut self) {
        self.stability.reset();
        self.voting.reset();
        self.stable_count = 0;
        self.cooldown_remaining = 0;
        self.current_label = None;
        self.current_confidence = 0.0;
    }

    /// Pre-inference phase for one raw (un-normalized) frame.
    pub fn begin(&mut self, raw_frame: &[f32], target: Option<&str>) -> Gate {
        if let Some(target) = target.map(str::trim).filter(|t| !t.is_empty()) {
            let canonical = self.config.label_case.canonicalize(target);
            if self.last_target.as_deref() != Some(canonical.as_str()) {
                debug!(
                    "Target changed from {:?} to {:?}, resetting session state",
                    self.last_target, canonical
                );
                self.reset();
                self.last_target = Some(canonical);
            }
        }

        if self.cooldown_remaining > 0 {
            self.cooldown_remaining -= 1;
            return Gate::Cooldown {
                remaining: self.cooldown_remaining,
            };
        }

        if !self.stability.observe(raw_frame) {
            return Gate::Unstable;
        }

        Gate::Proceed
    }

    /// Post-inference phase: vote, update the current detection and decide.
    ///
    /// Only call after [`SessionState::begin`] returned [`Gate::Proceed`], so
    /// the frame is known to be stable.
    pub fn complete(&mut self, label: &str, confidence: f32, target: Option<&str>) -> Completion {
        let Some((smoothed_label, smoothed_confidence)) = self.voting.observe(label, confidence)
        else {
            return Completion::BuildingHistory;
        };

        if smoothed_confidence <= self.config.min_smoothed_confidence {
            return Completion::BuildingHistory;
        }

        if self.current_label.as_deref() != Some(smoothed_label.as_str())
            || smoothed_confidence > self.current_confidence
        {
            debug!(
                "Detected {} (confidence {:.2})",
                smoothed_label, smoothed_confidence
            );
            self.current_label = Some(smoothed_label.clone());
            self.current_confidence = smoothed_confidence;
            self.cooldown_remaining = self.config.cooldown_frames;
        }

        if smoothed_confidence >= self.config.confidence_threshold {
            self.stable_count = (self.stable_count + 1).min(self.config.stable_window);
        } else {
            self.stable_count = self.stable_count.saturating_sub(1);
        }

        let stable = self.stable_count >= self.config.min_stable_count;
        let confirmed = stable
            && target
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .is_none_or(|t| self.config.label_case.matches(&smoothed_label, t));

        Completion::Decided(Decision {
            label: smoothed_label,
            confidence: smoothed_confidence,
            stable,
            confirmed,
            stable_count: self.stable_count,
        })
    }
}
