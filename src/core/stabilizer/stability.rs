use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityConfig {
    /// When false every frame counts as stable.
    pub enabled: bool,
    /// Frames that must be buffered before any frame can be stable.
    pub window_size: usize,
    /// Mean per-dimension variance below which the signal is steady.
    pub variance_threshold: f32,
}

impl Default for StabilityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_size: 5,
            variance_threshold: 0.05,
        }
    }
}

/// Decides whether the raw landmark signal is steady or in motion.
#[derive(Debug, Clone)]
pub struct StabilityDetector {
    config: StabilityConfig,
    buffer: VecDeque<Vec<f32>>,
}

impl StabilityDetector {
    pub fn new(config: StabilityConfig) -> Self {
        let capacity = config.window_size;
        Self {
            config,
            buffer: VecDeque::with_capacity(capacity),
        }
    }

    /// Append `frame` and report whether the buffered window is stable.
    ///
    /// Frames are unstable until the window is full; after that the verdict
    /// is `mean variance < threshold`. A frame of a different width clears
    /// the window first.
    pub fn observe(&mut self, frame: &[f32]) -> bool {
        if !self.config.enabled {
            return true;
        }

        if self.buffer.front().is_some_and(|first| first.len() != frame.len()) {
            self.buffer.clear();
        }
        if self.buffer.len() == self.config.window_size {
            self.buffer.pop_front();
        }
        // Missing coordinates count as 0, as they do everywhere downstream.
        self.buffer.push_back(
            frame
                .iter()
                .map(|value| if value.is_finite() { *value } else { 0.0 })
                .collect(),
        );

        self.mean_variance()
            .is_some_and(|variance| variance < self.config.variance_threshold)
    }

    /// Mean per-dimension population variance once the window is full.
    pub fn mean_variance(&self) -> Option<f32> {
        if self.buffer.len() < self.config.window_size {
            return None;
        }
        let width = self.buffer.front()?.len();
        if width == 0 {
            return Some(0.0);
        }

        let n = self.buffer.len() as f64;
        let mut total = 0f64;
        for dim in 0..width {
            let mean = self.buffer.iter().map(|f| f64::from(f[dim])).sum::<f64>() / n;
            let variance = self
                .buffer
                .iter()
                .map(|f| {
                    let d = f64::from(f[dim]) - mean;
                    d * d
                })
                .sum::<f64>()
                / n;
            total += variance;
        }
        Some((total / width as f64) as f32)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
