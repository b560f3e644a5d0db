//! Deadline-based timers driven by caller-supplied clock ticks.
//!
//! Timestamps are Unix epoch milliseconds. Nothing here reads the system
//! clock; the session owner calls `tick(now)`.

/// One-shot timer whose deadline is pushed back on every re-arm.
#[derive(Debug, Clone)]
pub struct DebounceTimer {
    delay_ms: i64,
    due_at: Option<i64>,
}

impl DebounceTimer {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms: i64::try_from(delay_ms).unwrap_or(i64::MAX),
            due_at: None,
        }
    }

    /// Schedules (or reschedules) the timer `delay_ms` after `now`.
    pub fn arm(&mut self, now: i64) {
        self.due_at = Some(now.saturating_add(self.delay_ms));
    }

    pub fn cancel(&mut self) {
        self.due_at = None;
    }

    pub fn is_armed(&self) -> bool {
        self.due_at.is_some()
    }

    /// Returns `true` exactly once when the deadline has passed.
    pub fn fire_if_due(&mut self, now: i64) -> bool {
        match self.due_at {
            Some(due_at) if now >= due_at => {
                self.due_at = None;
                true
            }
            _ => false,
        }
    }
}

/// Repeating timer.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    period_ms: i64,
    next_at: Option<i64>,
}

impl IntervalTimer {
    pub fn new(period_ms: u64) -> Self {
        Self {
            period_ms: i64::try_from(period_ms).unwrap_or(i64::MAX).max(1),
            next_at: None,
        }
    }

    pub fn start(&mut self, now: i64) {
        self.next_at = Some(now.saturating_add(self.period_ms));
    }

    pub fn stop(&mut self) {
        self.next_at = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_at.is_some()
    }

    /// Returns `true` when at least one period elapsed since the last fire.
    ///
    /// Missed periods collapse into a single fire.
    pub fn poll(&mut self, now: i64) -> bool {
        let Some(next_at) = self.next_at else {
            return false;
        };
        if now < next_at {
            return false;
        }
        let missed = now.saturating_sub(next_at) / self.period_ms;
        self.next_at = Some(
            next_at.saturating_add(self.period_ms.saturating_mul(missed.saturating_add(1))),
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{DebounceTimer, IntervalTimer};

    #[test]
    fn debounce_fires_once_after_quiet_period() {
        let mut timer = DebounceTimer::new(1_000);
        timer.arm(0);
        timer.arm(500);
        assert!(!timer.fire_if_due(1_200));
        assert!(timer.fire_if_due(1_500));
        assert!(!timer.fire_if_due(5_000));
    }

    #[test]
    fn interval_collapses_missed_periods() {
        let mut timer = IntervalTimer::new(10_000);
        timer.start(0);
        assert!(!timer.poll(9_999));
        assert!(timer.poll(35_000));
        assert!(!timer.poll(39_999));
        assert!(timer.poll(40_000));
        timer.stop();
        assert!(!timer.poll(100_000));
    }

    #[test]
    fn interval_tolerates_extreme_clock_values() {
        let mut timer = IntervalTimer::new(10_000);
        timer.start(i64::MIN);
        assert!(timer.poll(i64::MAX));
        assert!(timer.is_running());
    }
}
