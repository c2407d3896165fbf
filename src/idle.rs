//! Idle clock: derives the idle condition from the last motion event.

use std::time::{Duration, Instant};

/// Last-activity timestamp plus the configured timeout.
///
/// Time is injected by the caller so the expiry logic is testable
/// without waiting.
#[derive(Debug)]
pub struct IdleClock {
    last_activity: Instant,
    timeout_secs: i64,
}

impl IdleClock {
    pub fn new(timeout_secs: i64, now: Instant) -> Self {
        Self {
            last_activity: now,
            timeout_secs,
        }
    }

    pub fn timeout_secs(&self) -> i64 {
        self.timeout_secs
    }

    pub fn set_timeout(&mut self, secs: i64) {
        self.timeout_secs = secs;
    }

    /// Record qualifying activity.
    pub fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    /// A timeout of zero or less expires on every evaluation.
    pub fn is_expired(&self, now: Instant) -> bool {
        if self.timeout_secs <= 0 {
            return true;
        }
        self.idle_for(now) >= Duration::from_secs(self.timeout_secs.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_expired_before_timeout() {
        let start = Instant::now();
        let clock = IdleClock::new(10, start);
        assert!(!clock.is_expired(start + Duration::from_secs(9)));
    }

    #[test]
    fn test_expired_at_exact_timeout() {
        let start = Instant::now();
        let clock = IdleClock::new(10, start);
        assert!(clock.is_expired(start + Duration::from_secs(10)));
        assert!(clock.is_expired(start + Duration::from_secs(11)));
    }

    #[test]
    fn test_touch_restarts_the_gap() {
        let start = Instant::now();
        let mut clock = IdleClock::new(10, start);

        clock.touch(start + Duration::from_secs(8));
        assert!(!clock.is_expired(start + Duration::from_secs(17)));
        assert!(clock.is_expired(start + Duration::from_secs(18)));
    }

    #[test]
    fn test_zero_timeout_expires_every_cycle() {
        let start = Instant::now();
        let mut clock = IdleClock::new(0, start);
        assert!(clock.is_expired(start));

        clock.touch(start);
        assert!(clock.is_expired(start));
    }

    #[test]
    fn test_negative_timeout_expires_every_cycle() {
        let start = Instant::now();
        let clock = IdleClock::new(-5, start);
        assert!(clock.is_expired(start));
    }

    #[test]
    fn test_set_timeout_takes_effect() {
        let start = Instant::now();
        let mut clock = IdleClock::new(600, start);
        assert!(!clock.is_expired(start + Duration::from_secs(60)));

        clock.set_timeout(30);
        assert!(clock.is_expired(start + Duration::from_secs(60)));
    }
}
