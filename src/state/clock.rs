//! Round timer arithmetic, including the time spent paused.
//!
//! All values are truncated to whole seconds, matching what clients display.

use std::time::{Duration, SystemTime};

/// Deadline bookkeeping for the round currently being played.
///
/// `paused_at` is set exactly while the round is paused. Every second spent
/// paused is folded into `paused_duration` on resume and pushes the
/// effective deadline back by one second.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundClock {
    /// When the current round started.
    pub round_started_at: Option<SystemTime>,
    /// Nominal end of the current round, before pause adjustments.
    pub round_ends_at: Option<SystemTime>,
    /// Moment the current pause started.
    pub paused_at: Option<SystemTime>,
    /// Whole seconds spent paused during the current round.
    pub paused_duration: Duration,
}

impl RoundClock {
    /// Start a fresh round at `now`, clearing any pause bookkeeping.
    pub fn start(&mut self, now: SystemTime, round_duration: Duration) {
        self.round_started_at = Some(now);
        self.round_ends_at = Some(now + round_duration);
        self.paused_at = None;
        self.paused_duration = Duration::ZERO;
    }

    /// Drop every timestamp; used once the game is over.
    pub fn stop(&mut self) {
        *self = Self::default();
    }

    /// Whether a deadline is currently set.
    pub fn is_running(&self) -> bool {
        self.round_ends_at.is_some()
    }

    /// Whether the round is paused.
    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Freeze the timer. Returns `false` when no round is running or it is already paused.
    pub fn pause(&mut self, now: SystemTime) -> bool {
        if !self.is_running() || self.is_paused() {
            return false;
        }
        self.paused_at = Some(now);
        true
    }

    /// Unfreeze the timer, folding the elapsed pause into `paused_duration`.
    /// Returns `false` when the round is not paused.
    pub fn resume(&mut self, now: SystemTime) -> bool {
        let Some(paused_at) = self.paused_at.take() else {
            return false;
        };
        let elapsed = now.duration_since(paused_at).unwrap_or_default();
        self.paused_duration += Duration::from_secs(elapsed.as_secs());
        true
    }

    /// Deadline pushed back by the time already spent paused.
    pub fn adjusted_deadline(&self) -> Option<SystemTime> {
        self.round_ends_at
            .map(|ends_at| ends_at + self.paused_duration)
    }

    /// Remaining whole seconds, clamped at zero.
    ///
    /// While paused the value stays frozen at what it was when the pause began.
    pub fn remaining_secs(&self, now: SystemTime) -> u64 {
        let Some(deadline) = self.adjusted_deadline() else {
            return 0;
        };
        let reference = self.paused_at.unwrap_or(now);
        deadline
            .duration_since(reference)
            .map(|left| left.as_secs())
            .unwrap_or(0)
    }

    /// True once `now` reaches the pause-adjusted deadline. Always false while paused.
    pub fn is_finished(&self, now: SystemTime) -> bool {
        if self.is_paused() {
            return false;
        }
        self.adjusted_deadline()
            .is_some_and(|deadline| now >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn running_clock(start: u64, length: u64) -> RoundClock {
        let mut clock = RoundClock::default();
        clock.start(at(start), Duration::from_secs(length));
        clock
    }

    #[test]
    fn idle_clock_reports_nothing_left() {
        let clock = RoundClock::default();
        assert_eq!(clock.remaining_secs(at(10)), 0);
        assert!(!clock.is_finished(at(10)));
    }

    #[test]
    fn counts_down_and_clamps_at_zero() {
        let clock = running_clock(1_000, 30);
        assert_eq!(clock.remaining_secs(at(1_000)), 30);
        assert_eq!(clock.remaining_secs(at(1_012)), 18);
        assert_eq!(clock.remaining_secs(at(1_030)), 0);
        assert_eq!(clock.remaining_secs(at(1_500)), 0);
    }

    #[test]
    fn pause_then_resume_preserves_remaining_time() {
        let mut clock = running_clock(1_000, 60);
        let before = clock.remaining_secs(at(1_020));
        assert!(clock.pause(at(1_020)));
        assert_eq!(clock.remaining_secs(at(1_090)), before);
        assert!(clock.resume(at(1_095)));
        assert_eq!(clock.paused_duration, Duration::from_secs(75));
        assert_eq!(clock.remaining_secs(at(1_095)), before);
    }

    #[test]
    fn second_pause_freezes_at_the_adjusted_value() {
        let mut clock = running_clock(0, 100);
        clock.pause(at(10));
        clock.resume(at(40));
        let before = clock.remaining_secs(at(50));
        assert_eq!(before, 80);
        clock.pause(at(50));
        assert_eq!(clock.remaining_secs(at(70)), 80);
    }

    #[test]
    fn pause_is_rejected_twice_and_resume_requires_pause() {
        let mut clock = running_clock(0, 10);
        assert!(!clock.resume(at(1)));
        assert!(clock.pause(at(1)));
        assert!(!clock.pause(at(2)));
        assert!(clock.resume(at(3)));
        assert!(!clock.resume(at(4)));
    }

    #[test]
    fn pause_requires_a_running_round() {
        let mut clock = RoundClock::default();
        assert!(!clock.pause(at(0)));
    }

    #[test]
    fn finished_detection_ignores_paused_rounds_and_is_monotonic() {
        let mut clock = running_clock(0, 10);
        assert!(!clock.is_finished(at(9)));
        clock.pause(at(5));
        assert!(!clock.is_finished(at(50)));
        clock.resume(at(8));
        // Deadline moved from 10 to 13.
        assert!(!clock.is_finished(at(12)));
        for t in 13..40 {
            assert!(clock.is_finished(at(t)));
        }
    }

    #[test]
    fn starting_a_new_round_clears_pause_state() {
        let mut clock = running_clock(0, 10);
        clock.pause(at(2));
        clock.start(at(20), Duration::from_secs(10));
        assert!(!clock.is_paused());
        assert_eq!(clock.paused_duration, Duration::ZERO);
        assert_eq!(clock.remaining_secs(at(25)), 5);
    }
}
