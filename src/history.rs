//! Score history
//!
//! Rolling window of recent aggregate scores for one practice session.
//! Kept in memory only.

use crate::config::DEFAULT_HISTORY_WINDOW;
use serde::Serialize;
use std::collections::VecDeque;

/// Rolling store of aggregate scores, oldest first
#[derive(Debug, Clone, Serialize)]
pub struct ScoreHistory {
    scores: VecDeque<u8>,
    /// Maximum window size
    window_size: usize,
}

impl Default for ScoreHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

impl ScoreHistory {
    /// Create a history with the given window size (at least 1)
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            scores: VecDeque::with_capacity(window_size),
            window_size,
        }
    }

    /// Record a score, dropping the oldest beyond the window
    pub fn push(&mut self, score: u8) {
        self.scores.push_back(score);
        while self.scores.len() > self.window_size {
            self.scores.pop_front();
        }
    }

    pub fn latest(&self) -> Option<u8> {
        self.scores.back().copied()
    }

    /// Mean of the scores in the window
    pub fn average(&self) -> Option<f64> {
        if self.scores.is_empty() {
            return None;
        }
        let sum: f64 = self.scores.iter().map(|s| *s as f64).sum();
        Some(sum / self.scores.len() as f64)
    }

    pub fn best(&self) -> Option<u8> {
        self.scores.iter().copied().max()
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.scores.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn clear(&mut self) {
        self.scores.clear();
    }
}
