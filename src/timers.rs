//! Discard timers for stored SDUs.
//!
//! One deadline per TX COUNT, resolved against the [`Clock`](crate::time::Clock)
//! seam. The embedding stack sweeps expired timers by calling the entity's
//! `run_pending_timers`; a cancelled timer is removed from the map and its
//! expiry can no longer fire.

use std::collections::BTreeMap;
use std::time::Instant;

use crate::types::Count;

/// Deadline map for armed discard timers.
#[derive(Debug, Default)]
pub struct DiscardTimers {
    deadlines: BTreeMap<Count, Instant>,
}

impl DiscardTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a one-shot timer for the SDU stored under `tx_count`.
    pub fn arm(&mut self, tx_count: Count, deadline: Instant) {
        self.deadlines.insert(tx_count, deadline);
    }

    /// Cancels the timer for `tx_count`. Returns whether one was armed.
    pub fn cancel(&mut self, tx_count: Count) -> bool {
        self.deadlines.remove(&tx_count).is_some()
    }

    /// Removes and returns every COUNT whose deadline is at or before
    /// `now`, in COUNT order.
    pub fn take_expired(&mut self, now: Instant) -> Vec<Count> {
        let expired: Vec<Count> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(count, _)| *count)
            .collect();
        for count in &expired {
            self.deadlines.remove(count);
        }
        expired
    }

    pub fn contains(&self, tx_count: Count) -> bool {
        self.deadlines.contains_key(&tx_count)
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    /// Cancels every armed timer.
    pub fn clear(&mut self) {
        self.deadlines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn take_expired_returns_due_timers_once() {
        let mut timers = DiscardTimers::new();
        let t0 = Instant::now();
        timers.arm(Count::new(1), t0 + Duration::from_millis(50));
        timers.arm(Count::new(2), t0 + Duration::from_millis(100));

        assert!(timers.take_expired(t0).is_empty());

        let expired = timers.take_expired(t0 + Duration::from_millis(50));
        assert_eq!(expired, vec![Count::new(1)]);
        assert_eq!(timers.len(), 1);

        // Already taken; only the second remains.
        let expired = timers.take_expired(t0 + Duration::from_millis(200));
        assert_eq!(expired, vec![Count::new(2)]);
        assert!(timers.is_empty());
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timers = DiscardTimers::new();
        let t0 = Instant::now();
        timers.arm(Count::new(7), t0 + Duration::from_millis(10));

        assert!(timers.cancel(Count::new(7)));
        assert!(!timers.cancel(Count::new(7)));
        assert!(timers.take_expired(t0 + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn clear_cancels_everything() {
        let mut timers = DiscardTimers::new();
        let t0 = Instant::now();
        for sn in 0..4u32 {
            timers.arm(Count::new(sn), t0);
        }
        timers.clear();
        assert!(timers.take_expired(t0 + Duration::from_secs(1)).is_empty());
    }
}
