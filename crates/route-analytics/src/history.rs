//! Bounded rolling window of recent positions.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::geo::Position;

/// Default number of positions kept per vehicle.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

// Speed needs two samples.
const MIN_HISTORY_CAPACITY: usize = 2;

/// The last `capacity` positions in arrival order, oldest first.
///
/// Arrival order is authoritative: entries are never re-sorted by timestamp,
/// so a delayed ping with an older timestamp still lands at the back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionHistory {
    capacity: usize,
    positions: VecDeque<Position>,
}

impl PositionHistory {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(MIN_HISTORY_CAPACITY);
        Self { capacity, positions: VecDeque::with_capacity(capacity) }
    }

    /// Append a position, evicting the oldest entry once full.
    pub fn push(&mut self, position: Position) {
        if self.positions.len() == self.capacity {
            self.positions.pop_front();
        }
        self.positions.push_back(position);
    }

    /// Most recent position.
    #[must_use]
    pub fn latest(&self) -> Option<&Position> {
        self.positions.back()
    }

    /// The two most recent positions as `(previous, current)`.
    #[must_use]
    pub fn latest_pair(&self) -> Option<(&Position, &Position)> {
        let len = self.positions.len();
        if len < 2 {
            return None;
        }
        Some((&self.positions[len - 2], &self.positions[len - 1]))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter()
    }
}

impl Default for PositionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
