//! Search control — stop flag and time budget.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Controls when a search should stop.
///
/// Checked periodically by the search (every 1024 nodes) to decide whether
/// to abort. A control with no time budget only responds to the external
/// stop flag (`go infinite`, `go depth N`).
pub struct SearchControl {
    stopped: Arc<AtomicBool>,
    start: Instant,
    budget: Option<Duration>,
}

impl SearchControl {
    /// Create control with no time budget — only the stop flag can end the search.
    pub fn new_infinite(stopped: Arc<AtomicBool>) -> Self {
        Self {
            stopped,
            start: Instant::now(),
            budget: None,
        }
    }

    /// Create control with a wall-clock time budget.
    pub fn new_timed(stopped: Arc<AtomicBool>, budget: Duration) -> Self {
        Self {
            stopped,
            start: Instant::now(),
            budget: Some(budget),
        }
    }

    /// Check whether the search should abort immediately.
    ///
    /// The stop flag is always checked. The clock is sampled only every
    /// 1024 nodes so the hot path stays cheap.
    pub fn should_stop(&self, nodes: u64) -> bool {
        if self.stopped.load(Ordering::Relaxed) {
            return true;
        }

        if nodes & 1023 != 0 {
            return false;
        }

        if let Some(budget) = self.budget
            && self.elapsed() >= budget
        {
            self.stopped.store(true, Ordering::Release);
            return true;
        }

        false
    }

    /// Check whether iterative deepening should start a new iteration.
    pub fn should_stop_iterating(&self) -> bool {
        if self.stopped.load(Ordering::Relaxed) {
            return true;
        }
        match self.budget {
            Some(budget) => self.elapsed() >= budget,
            None => false,
        }
    }

    /// Elapsed time since the control was created.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Request a stop. Non-blocking; sets the shared flag observed by all workers.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Reference to the shared stop flag.
    pub fn stop_flag(&self) -> &Arc<AtomicBool> {
        &self.stopped
    }
}

/// Shared, process-wide stop flag plus the timing state for one search.
///
/// Kept behind a mutex purely so a future multi-result aggregation can
/// extend this without changing the public surface; today only worker 0's
/// result is read by the driver.
pub struct BestResultSlot<T> {
    inner: Mutex<Option<T>>,
}

impl<T> BestResultSlot<T> {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Replace the slot's contents.
    pub fn set(&self, value: T) {
        *self.inner.lock().expect("result slot poisoned") = Some(value);
    }

    /// Take the slot's contents, leaving it empty.
    pub fn take(&self) -> Option<T> {
        self.inner.lock().expect("result slot poisoned").take()
    }
}

impl<T> Default for BestResultSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn infinite_never_stops_on_clock() {
        let stopped = Arc::new(AtomicBool::new(false));
        let control = SearchControl::new_infinite(stopped);
        assert!(!control.should_stop(1024));
        assert!(!control.should_stop_iterating());
    }

    #[test]
    fn external_stop_flag_observed() {
        let stopped = Arc::new(AtomicBool::new(true));
        let control = SearchControl::new_infinite(stopped);
        assert!(control.should_stop(0));
        assert!(control.should_stop_iterating());
    }

    #[test]
    fn clock_checked_only_every_1024_nodes() {
        let stopped = Arc::new(AtomicBool::new(false));
        let control = SearchControl::new_timed(stopped, Duration::from_millis(0));
        // Node count not a multiple of 1024 — clock isn't even sampled.
        assert!(!control.should_stop(1));
        // Multiple of 1024 — clock is sampled and the zero budget has elapsed.
        assert!(control.should_stop(1024));
    }

    #[test]
    fn stop_sets_flag_for_all_holders() {
        let stopped = Arc::new(AtomicBool::new(false));
        let control = SearchControl::new_infinite(Arc::clone(&stopped));
        control.stop();
        assert!(stopped.load(Ordering::Relaxed));
    }

    #[test]
    fn result_slot_round_trips() {
        let slot: BestResultSlot<i32> = BestResultSlot::new();
        assert_eq!(slot.take(), None);
        slot.set(42);
        assert_eq!(slot.take(), Some(42));
        assert_eq!(slot.take(), None);
    }
}
