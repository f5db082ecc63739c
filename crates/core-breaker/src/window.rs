//! Sliding Window: bounded ring of recent call outcomes
//!
//! The window keeps at most `capacity` outcomes in arrival order. Once full,
//! each new outcome evicts exactly the oldest one. Writers from any number of
//! threads may record concurrently; readers take a [`snapshot`] copy and can
//! iterate it while recording continues.
//!
//! # Example
//!
//! ```
//! use tripwire_core_breaker::window::SlidingWindow;
//! use tripwire_core_breaker::outcome::CallOutcome;
//! use std::time::Duration;
//!
//! let window = SlidingWindow::new(2);
//! window.record(CallOutcome::success(Duration::from_millis(5)));
//! window.record(CallOutcome::failure(Duration::from_millis(7)));
//! window.record(CallOutcome::failure(Duration::from_millis(9)));
//!
//! let snapshot = window.snapshot();
//! assert_eq!(snapshot.len(), 2);
//! assert!(!snapshot[0].is_success());
//! ```
//!
//! [`snapshot`]: SlidingWindow::snapshot

use crate::outcome::CallOutcome;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// Fixed-capacity, thread-safe ring buffer of [`CallOutcome`]s
#[derive(Debug)]
pub struct SlidingWindow {
    capacity: usize,
    entries: Mutex<VecDeque<CallOutcome>>,
}

impl SlidingWindow {
    /// Create an empty window. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Append an outcome, evicting the oldest entry if the window is full
    pub fn record(&self, outcome: CallOutcome) {
        let mut entries = self.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(outcome);
    }

    /// Copy of the current contents, oldest first
    pub fn snapshot(&self) -> Vec<CallOutcome> {
        self.lock().iter().copied().collect()
    }

    /// Drop every recorded outcome
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // Entries stay structurally valid if a holder panicked, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, VecDeque<CallOutcome>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
