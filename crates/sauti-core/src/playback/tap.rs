//! Shared sample buffer between the scheduler and amplitude rendering

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Bounded ring of the most recently scheduled samples.
///
/// The scheduler pushes every sample it places; a renderer drains fixed
/// windows off the front at its own cadence. When production outpaces
/// consumption the oldest samples fall off. Clones share one buffer.
#[derive(Clone)]
pub struct AnalysisTap {
    buffer: Arc<Mutex<VecDeque<f32>>>,
    capacity: usize,
}

impl AnalysisTap {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub(crate) fn push(&self, samples: &[f32]) {
        if self.capacity == 0 {
            return;
        }
        let mut buffer = self.buffer.lock().unwrap();
        buffer.extend(samples.iter().copied());
        while buffer.len() > self.capacity {
            buffer.pop_front();
        }
    }

    /// Remove and return up to `max` samples from the front.
    pub fn drain(&self, max: usize) -> Vec<f32> {
        let mut buffer = self.buffer.lock().unwrap();
        let take = max.min(buffer.len());
        buffer.drain(..take).collect()
    }

    pub fn clear(&self) {
        self.buffer.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().unwrap().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
