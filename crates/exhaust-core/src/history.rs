//! Fixed-capacity FIFO of recent temperature samples backing the trend graph.

use heapless::Deque;

use crate::config::HISTORY_CAPACITY;

/// Ring of the last [`HISTORY_CAPACITY`] samples, oldest first.
///
/// Pushing into a full buffer evicts the oldest sample.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    samples: Deque<f32, HISTORY_CAPACITY>,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryBuffer {
    pub const fn new() -> Self {
        Self {
            samples: Deque::new(),
        }
    }

    /// Append a sample, returning the evicted one if the buffer was full.
    pub fn push(&mut self, celsius: f32) -> Option<f32> {
        let evicted = if self.samples.is_full() {
            self.samples.pop_front()
        } else {
            None
        };
        // Cannot fail: a slot was freed above if needed
        self.samples.push_back(celsius).ok();
        evicted
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.is_full()
    }

    pub const fn capacity(&self) -> usize {
        HISTORY_CAPACITY
    }

    /// Samples in insertion order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().copied()
    }

    pub fn oldest(&self) -> Option<f32> {
        self.samples.front().copied()
    }

    pub fn latest(&self) -> Option<f32> {
        self.samples.back().copied()
    }
}
