use std::collections::VecDeque;

/// Rolling plurality vote over recent confident predictions.
#[derive(Debug, Clone)]
pub struct VotingAggregator {
    history: VecDeque<String>,
    capacity: usize,
    min_consistent: usize,
    confidence_floor: f32,
}

impl VotingAggregator {
    pub fn new(capacity: usize, min_consistent: usize, confidence_floor: f32) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            min_consistent,
            confidence_floor,
        }
    }

    /// Record a raw prediction (only if `confidence > floor`) and return the
    /// current consensus.
    pub fn observe(&mut self, label: &str, confidence: f32) -> Option<(String, f32)> {
        if confidence > self.confidence_floor {
            if self.history.len() == self.capacity {
                self.history.pop_front();
            }
            self.history.push_back(label.to_string());
        }
        self.consensus()
    }

    /// Plurality label and its vote share, once it has at least
    /// `min_consistent` votes. Ties go to the label seen first.
    pub fn consensus(&self) -> Option<(String, f32)> {
        if self.history.len() < self.min_consistent {
            return None;
        }

        let mut counts: Vec<(&str, usize)> = Vec::new();
        for label in &self.history {
            match counts.iter_mut().find(|(seen, _)| *seen == label.as_str()) {
                Some((_, count)) => *count += 1,
                None => counts.push((label.as_str(), 1)),
            }
        }

        let (label, count) = counts
            .into_iter()
            .fold(None, |best: Option<(&str, usize)>, candidate| match best {
                Some(current) if current.1 >= candidate.1 => Some(current),
                _ => Some(candidate),
            })?;

        (count >= self.min_consistent)
            .then(|| (label.to_string(), count as f32 / self.history.len() as f32))
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}
