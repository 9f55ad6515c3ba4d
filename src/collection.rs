//! Idle-time windowing of the signal stream.
//!
//! The touchpad never reports "gesture finished". A gesture is considered
//! complete once no new signal has arrived for the idle threshold, and the
//! application loop uses [`SignalCollection::get_time_when_old_enough`] to
//! sleep exactly until that moment instead of polling.

use crate::signal::Signal;
use std::time::Duration;

pub const DEFAULT_IDLE_THRESHOLD: Duration = Duration::from_millis(300);
pub const DEFAULT_IDLE_POLL: Duration = Duration::from_millis(1000);

/// Buffer holding the signals of the gesture currently being drawn.
#[derive(Debug, Clone)]
pub struct SignalCollection {
    signals: Vec<Signal>,
    idle_threshold: Duration,
    idle_poll: Duration,
}

impl Default for SignalCollection {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_THRESHOLD, DEFAULT_IDLE_POLL)
    }
}

impl SignalCollection {
    /// `idle_poll` is clamped to at least one millisecond so an empty buffer
    /// never produces a zero-length wait.
    pub fn new(idle_threshold: Duration, idle_poll: Duration) -> Self {
        Self {
            signals: Vec::new(),
            idle_threshold,
            idle_poll: idle_poll.max(Duration::from_millis(1)),
        }
    }

    /// Appends a point or raising-finger signal. Stop signals are control
    /// flow for the loop and are never buffered.
    pub fn add_and_maintain(&mut self, signal: Signal) {
        if signal.is_stop() {
            return;
        }
        self.signals.push(signal);
    }

    /// True while the newest signal is younger than the idle threshold.
    pub fn is_recent_enough(&self, now: f64) -> bool {
        match self.signals.last() {
            Some(last) => age(last, now) < self.idle_threshold,
            None => false,
        }
    }

    /// How long until the buffer becomes old enough to flush.
    pub fn get_time_when_old_enough(&self, now: f64) -> Duration {
        match self.signals.last() {
            Some(last) => self.idle_threshold.saturating_sub(age(last, now)),
            None => self.idle_poll,
        }
    }

    pub fn as_list(&self) -> Vec<Signal> {
        self.signals.clone()
    }

    pub fn reset(&mut self) {
        self.signals.clear();
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

/// Age of `signal` at `now`; timestamps from the future count as fresh.
fn age(signal: &Signal, now: f64) -> Duration {
    let elapsed = now - signal.timestamp;
    if elapsed > 0.0 {
        Duration::try_from_secs_f64(elapsed).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection() -> SignalCollection {
        SignalCollection::new(Duration::from_millis(300), Duration::from_millis(1000))
    }

    #[test]
    fn reset_leaves_nothing_behind() {
        let mut collection = collection();
        for i in 0..10 {
            collection.add_and_maintain(Signal::point(i as f64, 0.0, 100.0 + i as f64 * 0.01));
        }
        collection.add_and_maintain(Signal::raising_finger(100.2));
        assert_eq!(collection.as_list().len(), 11);

        collection.reset();
        assert!(collection.as_list().is_empty());
    }

    #[test]
    fn stop_signals_are_not_buffered() {
        let mut collection = collection();
        collection.add_and_maintain(Signal::stop(1.0));
        assert!(collection.is_empty());
    }

    #[test]
    fn snapshot_preserves_arrival_order() {
        let mut collection = collection();
        collection.add_and_maintain(Signal::point(1.0, 1.0, 10.0));
        collection.add_and_maintain(Signal::raising_finger(10.1));
        collection.add_and_maintain(Signal::point(2.0, 2.0, 10.2));

        let kinds: Vec<_> = collection.as_list().iter().map(|s| s.kind).collect();
        assert_eq!(
            kinds,
            vec![
                crate::signal::SignalKind::Point,
                crate::signal::SignalKind::RaisingFinger,
                crate::signal::SignalKind::Point
            ]
        );
    }

    #[test]
    fn empty_buffer_waits_for_idle_poll() {
        let collection = collection();
        assert_eq!(
            collection.get_time_when_old_enough(50.0),
            Duration::from_millis(1000)
        );
        assert!(!collection.is_recent_enough(50.0));
    }

    #[test]
    fn zero_idle_poll_is_clamped() {
        let collection = SignalCollection::new(Duration::from_millis(300), Duration::ZERO);
        assert!(collection.get_time_when_old_enough(0.0) > Duration::ZERO);
    }

    #[test]
    fn wait_time_counts_down_and_never_goes_negative() {
        let mut collection = collection();
        collection.add_and_maintain(Signal::point(0.0, 0.0, 100.0));

        let remaining = collection.get_time_when_old_enough(100.1);
        assert!(remaining > Duration::from_millis(190) && remaining < Duration::from_millis(210));

        for now in [100.31, 100.5, 1_000.0, f64::MAX] {
            assert_eq!(collection.get_time_when_old_enough(now), Duration::ZERO);
        }
    }

    #[test]
    fn future_timestamps_cap_wait_at_threshold() {
        let mut collection = collection();
        collection.add_and_maintain(Signal::point(0.0, 0.0, 500.0));
        assert_eq!(
            collection.get_time_when_old_enough(100.0),
            Duration::from_millis(300)
        );
        assert!(collection.is_recent_enough(100.0));
    }

    #[test]
    fn staleness_holds_until_next_add() {
        let mut collection = collection();
        collection.add_and_maintain(Signal::point(0.0, 0.0, 100.0));
        assert!(collection.is_recent_enough(100.1));

        assert!(!collection.is_recent_enough(100.31));
        assert!(!collection.is_recent_enough(105.0));
        assert!(!collection.is_recent_enough(900.0));

        collection.add_and_maintain(Signal::point(1.0, 1.0, 900.0));
        assert!(collection.is_recent_enough(900.1));
    }
}
