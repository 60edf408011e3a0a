//! Decaying violation counter and sweep gating shared by both components

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-player violation count with time-based decay.
///
/// The count only goes up through [`record`](Self::record) and only goes down
/// through [`decay`](Self::decay) or [`reset`](Self::reset); it never drops
/// below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViolationTracker {
    count: u32,
    last_violation_ms: u64,
}

impl ViolationTracker {
    /// Count one violation at `now`, returning the new total
    pub fn record(&mut self, now: u64) -> u32 {
        self.count = self.count.saturating_add(1);
        self.last_violation_ms = now;
        self.count
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Remove one violation per full `window_ms` elapsed since the last one.
    ///
    /// Leftover time is carried forward so sweeps at any cadence decay at the
    /// same overall rate. Returns how many violations were forgiven.
    pub fn decay(&mut self, now: u64, window_ms: u64) -> u32 {
        if self.count == 0 || window_ms == 0 {
            return 0;
        }
        let elapsed = now.saturating_sub(self.last_violation_ms);
        let steps = elapsed / window_ms;
        if steps == 0 {
            return 0;
        }
        let forgiven = steps.min(u64::from(self.count)) as u32;
        self.count -= forgiven;
        self.last_violation_ms += steps * window_ms;
        forgiven
    }

    pub fn reset(&mut self) {
        self.count = 0;
        self.last_violation_ms = 0;
    }
}

/// Lets at most one caller run a maintenance sweep per interval
#[derive(Debug)]
pub struct SweepGate {
    last_sweep_ms: AtomicU64,
    interval_ms: u64,
}

impl SweepGate {
    pub fn new(started_ms: u64, interval_ms: u64) -> Self {
        Self {
            last_sweep_ms: AtomicU64::new(started_ms),
            interval_ms,
        }
    }

    /// Claim the sweep for `now`; false when one ran too recently or another caller won
    pub fn try_claim(&self, now: u64) -> bool {
        let last = self.last_sweep_ms.load(Ordering::Acquire);
        if now.saturating_sub(last) < self.interval_ms {
            return false;
        }
        self.last_sweep_ms
            .compare_exchange(last, now, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_gate_is_a_no_op_between_intervals() {
        let gate = SweepGate::new(0, 1_000);
        assert!(!gate.try_claim(999));
        assert!(gate.try_claim(1_000));
        assert!(!gate.try_claim(1_500));
        assert!(gate.try_claim(2_000));
    }

    #[test]
    fn record_increments_and_timestamps() {
        let mut tracker = ViolationTracker::default();
        assert_eq!(tracker.record(100), 1);
        assert_eq!(tracker.record(200), 2);
        // Decay counts from the newest violation
        assert_eq!(tracker.decay(200 + 29_999, 30_000), 0);
        assert_eq!(tracker.decay(200 + 30_000, 30_000), 1);
    }

    #[test]
    fn decays_one_per_window() {
        let mut tracker = ViolationTracker::default();
        for t in 0..5 {
            tracker.record(t);
        }
        assert_eq!(tracker.decay(4 + 29_999, 30_000), 0);
        assert_eq!(tracker.decay(4 + 30_000, 30_000), 1);
        assert_eq!(tracker.count(), 4);
        assert_eq!(tracker.decay(4 + 90_000, 30_000), 2);
        assert_eq!(tracker.count(), 2);
    }

    #[test]
    fn never_decays_below_zero() {
        let mut tracker = ViolationTracker::default();
        tracker.record(0);
        assert_eq!(tracker.decay(10_000_000, 30_000), 1);
        assert_eq!(tracker.count(), 0);
        assert_eq!(tracker.decay(20_000_000, 30_000), 0);
        assert_eq!(tracker.count(), 0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut tracker = ViolationTracker::default();
        tracker.record(5);
        tracker.reset();
        assert_eq!(tracker, ViolationTracker::default());
    }
}
