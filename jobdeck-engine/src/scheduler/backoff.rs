//! Adaptive poll pacing
//!
//! Polls start at a base interval. Every poll that brings no new log lines
//! lengthens the interval by a fixed increment up to a ceiling; any poll
//! that brings output snaps it back to the base.

use std::time::Duration;

/// Poll interval parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTiming {
    /// Interval after a poll that returned output
    pub base: Duration,
    /// Added after every poll that returned nothing
    pub increment: Duration,
    /// Ceiling for the interval
    pub max: Duration,
}

impl Default for PollTiming {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(1500),
            increment: Duration::from_millis(1500),
            max: Duration::from_millis(10_000),
        }
    }
}

/// Current poll interval
#[derive(Debug, Clone)]
pub struct Backoff {
    timing: PollTiming,
    current: Duration,
}

impl Backoff {
    /// Starts at the base interval
    pub fn new(timing: PollTiming) -> Self {
        Self {
            timing,
            current: timing.base,
        }
    }

    /// Current interval
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Snap back to the base interval and return it
    pub fn reset(&mut self) -> Duration {
        self.current = self.timing.base;
        self.current
    }

    /// Lengthen the interval by one increment, capped, and return it
    pub fn grow(&mut self) -> Duration {
        self.current = (self.current + self.timing.increment).min(self.timing.max);
        self.current
    }
}
