//! Bounded per-subject score history.

use std::collections::VecDeque;

/// Ring of committed totals, oldest first.
///
/// Appending beyond the cap evicts the oldest entry, so the retained
/// entries are always the most recent `cap` totals in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct ScoreHistory {
    entries: VecDeque<u64>,
}

impl ScoreHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `total`, evicting from the front until `len <= cap`.
    pub fn push(&mut self, total: u64, cap: usize) {
        self.entries.push_back(total);
        self.truncate_to(cap);
    }

    /// Drop the oldest entries until at most `cap` remain.
    pub fn truncate_to(&mut self, cap: usize) {
        while self.entries.len() > cap {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<u64> {
        self.entries.back().copied()
    }

    /// Retained totals, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<u64> {
        self.entries.iter().copied().collect()
    }
}
